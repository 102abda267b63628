//! Mode indicator at the top centre; SWIPE_LEFT / SWIPE_RIGHT cycle modes.
//!
//! ```text
//!   <-  ┌─[◆ ◇ ◇]  COMBAT ─┐  ->
//!       └──────────────────┘
//!  ═════════════════════════════   transition flash, fades over 0.5 s
//! ```

use std::time::Instant;

use gesture_core::GestureEvent;
use particle_fx::{text_width, Frame, Rgb};

use super::{draw_arrow, HudMode, HudState, PANEL_BG};

/// How long a switch counts as "transitioning".
const TRANSITION_SECS: f32 = 1.0;
/// How long the flash line stays visible.
const FLASH_SECS: f32 = 0.5;
const TEXT_SCALE: i32 = 2;
const BAR_TOP: i32 = 8;
const BAR_BOTTOM: i32 = 45;
const DIAMOND_Y: i32 = 27;
const DIAMOND_SIZE: i32 = 4;
const DIAMOND_STEP: i32 = 14;
/// Room left of the label for the diamonds.
const DIAMOND_LANE: i32 = 52;
const DIM: Rgb = Rgb(80, 80, 80);

#[derive(Clone, Debug)]
pub struct ModeMenu {
    current:          HudMode,
    previous:         HudMode,
    transition_start: Option<Instant>,
}

impl Default for ModeMenu {
    fn default() -> Self { Self::new() }
}

impl ModeMenu {
    pub fn new() -> Self { Self::starting_in(HudMode::Combat) }

    pub fn starting_in(mode: HudMode) -> Self {
        Self { current: mode, previous: mode, transition_start: None }
    }

    pub fn current_mode(&self)  -> HudMode { self.current }
    pub fn previous_mode(&self) -> HudMode { self.previous }
    pub fn transitioning(&self) -> bool    { self.transition_start.is_some() }

    pub fn update(&mut self, state: &mut HudState) {
        match state.gesture.event {
            GestureEvent::SwipeLeft  => self.switch(-1, state.now),
            GestureEvent::SwipeRight => self.switch(1, state.now),
            _ => {}
        }
        state.mode = self.current;

        if let Some(start) = self.transition_start {
            if state.now.saturating_duration_since(start).as_secs_f32() > TRANSITION_SECS {
                self.transition_start = None;
            }
        }
    }

    fn switch(&mut self, step: i32, now: Instant) {
        let n = HudMode::ALL.len() as i32;
        let idx = (self.current.index() as i32 + step).rem_euclid(n) as usize;
        self.previous = self.current;
        self.current = HudMode::ALL[idx];
        self.transition_start = Some(now);
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        let width = overlay.width() as i32;
        let label = self.current.label();
        let color = self.current.color();

        let tw = text_width(label, TEXT_SCALE);
        let bar_w = tw + DIAMOND_LANE + 12;
        let bar_x = (width - bar_w) / 2;
        let bar_h = BAR_BOTTOM - BAR_TOP + 1;
        overlay.fill_rect(bar_x, BAR_TOP, bar_w + 1, bar_h, PANEL_BG);
        overlay.stroke_rect(bar_x, BAR_TOP, bar_w + 1, bar_h, color);

        for (idx, mode) in HudMode::ALL.iter().enumerate() {
            let dx = bar_x + 12 + idx as i32 * DIAMOND_STEP;
            if *mode == self.current {
                overlay.fill_diamond(dx, DIAMOND_Y, DIAMOND_SIZE, color);
            } else {
                overlay.draw_diamond(dx, DIAMOND_Y, DIAMOND_SIZE, DIM);
            }
        }

        overlay.draw_text(label, bar_x + DIAMOND_LANE, DIAMOND_Y - 5 * TEXT_SCALE / 2, TEXT_SCALE, color);

        if let Some(start) = self.transition_start {
            let elapsed = state.now.saturating_duration_since(start).as_secs_f32();
            let alpha = (1.0 - elapsed / FLASH_SECS).max(0.0);
            if alpha > 0.0 {
                let flash = color.scale(alpha * 0.3);
                overlay.draw_line(0, 48, width, 48, flash, 2);
                overlay.draw_line(0, 49, width, 49, flash, 1);
            }
        }

        draw_arrow(overlay, bar_x - 10, DIAMOND_Y, bar_x - 25, DIAMOND_Y, DIM, 0.4);
        draw_arrow(overlay, bar_x + bar_w + 10, DIAMOND_Y, bar_x + bar_w + 25, DIAMOND_Y, DIM, 0.4);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
