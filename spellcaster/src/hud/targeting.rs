//! Reticle that trails the index fingertip and locks on while a fist is held.

use std::time::Instant;

use gesture_core::GestureType;
use particle_fx::{Frame, Rgb};

use super::{draw_label, HudState, HudTheme};

const SMOOTHING: f32 = 0.3;
const SPIN_DEG: f32 = 2.0;
const TICK_LEN: i32 = 8;

#[derive(Clone, Debug)]
pub struct TargetingReticle {
    color:    Rgb,
    lock:     Rgb,
    target:   (i32, i32),
    smooth:   (f32, f32),
    locked:   bool,
    rotation: f32,
    since:    Option<Instant>,
}

impl TargetingReticle {
    pub fn new(theme: HudTheme) -> Self {
        Self {
            color:    theme.primary,
            lock:     theme.alert,
            target:   (0, 0),
            smooth:   (0.0, 0.0),
            locked:   false,
            rotation: 0.0,
            since:    None,
        }
    }

    pub fn position(&self) -> (i32, i32) { (self.smooth.0 as i32, self.smooth.1 as i32) }
    pub fn locked(&self)   -> bool       { self.locked }
    pub fn rotation(&self) -> f32        { self.rotation }

    pub fn update(&mut self, state: &HudState) {
        self.since.get_or_insert(state.now);
        let (w, h) = state.frame_size;
        if let Some(tip) = state.gesture.index_tip {
            self.target = tip.pixel(w, h);
        }
        self.smooth.0 += (self.target.0 as f32 - self.smooth.0) * SMOOTHING;
        self.smooth.1 += (self.target.1 as f32 - self.smooth.1) * SMOOTHING;

        self.locked = state.gesture.current_gesture == GestureType::Fist && state.gesture.is_holding;

        self.rotation += SPIN_DEG;
        if self.rotation >= 360.0 {
            self.rotation -= 360.0;
        }
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        let (cx, cy) = self.position();
        if cx == 0 && cy == 0 {
            return;
        }
        let color = if self.locked { self.lock } else { self.color };
        let size = if self.locked { 40 } else { 30 };

        for i in 0..4 {
            let start = self.rotation + i as f32 * 90.0;
            overlay.stroke_ellipse(cx, cy, size + 10, size + 10, start, start + 60.0, color, 1);
        }

        let gap = size / 3;
        overlay.draw_line(cx - size, cy, cx - gap, cy, color, 1);
        overlay.draw_line(cx + gap, cy, cx + size, cy, color, 1);
        overlay.draw_line(cx, cy - size, cx, cy - gap, color, 1);
        overlay.draw_line(cx, cy + gap, cx, cy + size, color, 1);
        overlay.fill_circle(cx, cy, 3, color);

        let tick = size + 5;
        for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
            let (tx, ty) = (cx + dx * tick, cy + dy * tick);
            overlay.draw_line(tx, ty, tx + dx * TICK_LEN, ty, color, 1);
            overlay.draw_line(tx, ty, tx, ty + dy * TICK_LEN, color, 1);
        }

        let (w, h) = state.frame_size;
        let readout = format!(
            "({:.2}, {:.2})",
            cx as f32 / w.max(1) as f32,
            cy as f32 / h.max(1) as f32,
        );
        draw_label(overlay, &readout, cx + size + 15, cy + 5, 1, color);

        if self.locked {
            draw_label(overlay, "LOCKED", cx + size + 15, cy - 15, 2, self.lock);
            let t = self
                .since
                .map_or(0.0, |s| state.now.saturating_duration_since(s).as_secs_f32());
            let pulse = (5.0 * (t * 8.0).sin()) as i32;
            overlay.stroke_circle(cx, cy, size + 20 + pulse, self.lock, 1);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
