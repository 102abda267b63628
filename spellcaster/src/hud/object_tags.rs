//! Holographic tags on detected objects, plus a top-to-bottom scan line
//! started by an open palm.
//!
//! ```text
//!   ┌──────────────┐
//!   │ LAPTOP 87%   │
//!   └──────┬───────┘
//!   ┌─     │     ─┐
//!   │             │
//!   │ ▓▓▓▓▓▓▓▓░░  │   confidence bar
//!   └─           ─┘
//! ```

use std::time::Instant;

use gesture_core::GestureType;
use particle_fx::{text_width, Frame, Rgb};

use super::{draw_label, HudMode, HudState, HudTheme, PANEL_BG};
use crate::vision::Detection;

const SCAN_SECS: f32 = 2.0;
const GLOW_LINES: i32 = 20;
const TEXT_SCALE: i32 = 2;
const BAR_BG: Rgb = Rgb(30, 30, 30);

#[derive(Clone, Debug)]
pub struct ObjectTags {
    color:      Rgb,
    secondary:  Rgb,
    scan_start: Option<Instant>,
    scan_y:     i32,
}

impl ObjectTags {
    pub fn new(theme: HudTheme) -> Self {
        Self { color: theme.primary, secondary: theme.secondary, scan_start: None, scan_y: 0 }
    }

    pub fn scanning(&self) -> bool { self.scan_start.is_some() }
    pub fn scan_y(&self)   -> i32  { self.scan_y }

    pub fn update(&mut self, state: &HudState) {
        if state.gesture.current_gesture == GestureType::OpenPalm && self.scan_start.is_none() {
            self.scan_start = Some(state.now);
            self.scan_y = 0;
        }
        if let Some(start) = self.scan_start {
            let elapsed = state.now.saturating_duration_since(start).as_secs_f32();
            let h = state.frame_size.1 as f32;
            self.scan_y = (elapsed / SCAN_SECS * h) as i32;
            if self.scan_y > h as i32 {
                self.scan_start = None;
            }
        }
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        if self.scan_start.is_some() {
            let (w, h) = (overlay.width() as i32, overlay.height() as i32);
            if (0..h).contains(&self.scan_y) {
                overlay.draw_line(0, self.scan_y, w, self.scan_y, self.color, 2);
                for i in 1..GLOW_LINES {
                    let alpha = 1.0 - i as f32 / GLOW_LINES as f32;
                    let y = self.scan_y - i * 2;
                    if (0..h).contains(&y) {
                        overlay.draw_line(0, y, w, y, self.color.scale(alpha * 0.3), 1);
                    }
                }
            }
        }
        let color = if state.mode == HudMode::Combat { self.secondary } else { self.color };
        for det in &state.detections {
            tag(overlay, det, color);
        }
    }
}

fn tag(overlay: &mut Frame, det: &Detection, color: Rgb) {
    let Detection { x1, y1, x2, y2, .. } = *det;

    let len = 20_i32.min(det.width() / 4).min(det.height() / 4);
    for (cx, cy, hx, vy) in [
        (x1, y1, x1 + len, y1 + len),
        (x2, y1, x2 - len, y1 + len),
        (x1, y2, x1 + len, y2 - len),
        (x2, y2, x2 - len, y2 - len),
    ] {
        overlay.draw_line(cx, cy, hx, cy, color, 2);
        overlay.draw_line(cx, cy, cx, vy, color, 2);
    }

    let text = format!("{} {:.0}%", det.label.to_uppercase(), det.confidence * 100.0);
    let label_w = text_width(&text, TEXT_SCALE) + 16;
    let label_h = 5 * TEXT_SCALE + 12;
    let mut lx = x1;
    let mut ly = y1 - label_h - 8;
    if ly < 0 {
        ly = y2 + 8;
    }
    if lx + label_w > overlay.width() as i32 {
        lx = overlay.width() as i32 - label_w;
    }
    overlay.fill_rect(lx, ly, label_w + 1, label_h + 1, PANEL_BG);
    overlay.stroke_rect(lx, ly, label_w + 1, label_h + 1, color);
    draw_label(overlay, &text, lx + 8, ly + label_h - 6, TEXT_SCALE, color);

    let (from, to) = if ly > y1 {
        ((lx + label_w / 2, ly), ((x1 + x2) / 2, y2))
    } else {
        ((lx + label_w / 2, ly + label_h), ((x1 + x2) / 2, y1))
    };
    overlay.draw_line(from.0, from.1, to.0, to.1, color, 1);

    let bar_y = y2 - 6;
    let bar_w = det.width() - 8;
    if bar_w > 20 {
        let fill = (bar_w as f32 * det.confidence) as i32;
        overlay.fill_rect(x1 + 4, bar_y, bar_w + 1, 4, BAR_BG);
        overlay.fill_rect(x1 + 4, bar_y, fill + 1, 4, color);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
