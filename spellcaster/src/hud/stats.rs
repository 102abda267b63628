//! System status panel in the top-right corner.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::Local;
use particle_fx::{Frame, Rgb};

use super::{draw_label, HudState, HudTheme, PANEL_BG};

const FPS_WINDOW: usize = 30;
const PANEL_W: i32 = 220;
const PANEL_H: i32 = 160;
const MARGIN: i32 = 20;
const ROW_STEP: i32 = 24;
const WARN: Rgb = Rgb(255, 200, 0);
const CRITICAL: Rgb = Rgb(255, 80, 0);

#[derive(Clone, Debug)]
pub struct StatsPanel {
    color: Rgb,
    fps:   VecDeque<f32>,
    last:  Option<Instant>,
}

impl StatsPanel {
    pub fn new(theme: HudTheme) -> Self {
        Self { color: theme.primary, fps: VecDeque::with_capacity(FPS_WINDOW), last: None }
    }

    /// Mean of the last 30 frame rates, 0 before the second frame.
    pub fn average_fps(&self) -> f32 {
        if self.fps.is_empty() {
            return 0.0;
        }
        self.fps.iter().sum::<f32>() / self.fps.len() as f32
    }

    pub fn update(&mut self, state: &HudState) {
        if let Some(last) = self.last {
            let dt = state.now.saturating_duration_since(last).as_secs_f32();
            if dt > 0.0 {
                if self.fps.len() == FPS_WINDOW {
                    self.fps.pop_front();
                }
                self.fps.push_back(1.0 / dt);
            }
        }
        self.last = Some(state.now);
    }

    fn load_color(&self, percent: f32) -> Rgb {
        if percent < 50.0 {
            self.color
        } else if percent < 80.0 {
            WARN
        } else {
            CRITICAL
        }
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        let px = overlay.width() as i32 - PANEL_W - MARGIN;
        let py = MARGIN;

        overlay.fill_rect(px, py, PANEL_W, PANEL_H, PANEL_BG);
        overlay.stroke_rect(px, py, PANEL_W + 1, PANEL_H + 1, self.color);
        overlay.draw_line(px, py + 22, px + PANEL_W, py + 22, self.color, 1);
        draw_label(overlay, "SYSTEM STATUS", px + 10, py + 16, 2, self.color);

        let (live, capacity) = state.particles;
        let load = if capacity == 0 { 0.0 } else { 100.0 * live as f32 / capacity as f32 };
        let rows = [
            (format!("FPS: {:.1}", self.average_fps()), self.color),
            (format!("POOL: {:.0}%", load), self.load_color(load)),
            (format!("SPELLS: {}", state.spells), self.color),
            (format!("TIME: {}", Local::now().format("%H:%M:%S")), self.color),
            (format!("FRAME: {}", state.frame_number), self.color),
        ];
        for (idx, (text, color)) in rows.iter().enumerate() {
            draw_label(overlay, text, px + 12, py + 42 + idx as i32 * ROW_STEP, 2, *color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
