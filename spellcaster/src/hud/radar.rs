//! Circular minimap in the bottom-left corner.  Each detection leaves a
//! blip that fades out over three seconds.

use std::time::Instant;

use particle_fx::{Frame, Rgb};

use super::{draw_label, HudState, HudTheme, PANEL_BG};

const RADIUS: i32 = 80;
const MARGIN: i32 = 30;
const SWEEP_DEG: f32 = 3.0;
const BLIP_SECS: f32 = 3.0;
const TRAIL: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Blip {
    x:    f32,
    y:    f32,
    seen: Instant,
}

#[derive(Clone, Debug)]
pub struct Radar {
    color:  Rgb,
    radius: i32,
    sweep:  f32,
    blips:  Vec<Blip>,
}

impl Radar {
    pub fn new(theme: HudTheme) -> Self {
        Self { color: theme.primary, radius: RADIUS, sweep: 0.0, blips: Vec::new() }
    }

    pub fn sweep_angle(&self) -> f32  { self.sweep }
    pub fn blip_count(&self)  -> usize { self.blips.len() }

    /// Centre of the scope on a `height`-tall overlay.
    pub fn center(&self, height: usize) -> (i32, i32) {
        (MARGIN + self.radius, height as i32 - MARGIN - self.radius)
    }

    pub fn update(&mut self, state: &HudState) {
        self.sweep += SWEEP_DEG;
        if self.sweep >= 360.0 {
            self.sweep -= 360.0;
        }

        let (w, h) = state.frame_size;
        let (w, h) = (w.max(1) as f32, h.max(1) as f32);
        for det in &state.detections {
            let (cx, cy) = det.center();
            self.blips.push(Blip { x: cx as f32 / w, y: cy as f32 / h, seen: state.now });
        }
        let now = state.now;
        self.blips.retain(|b| now.saturating_duration_since(b.seen).as_secs_f32() < BLIP_SECS);
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        let r = self.radius;
        let (cx, cy) = self.center(overlay.height());

        overlay.fill_circle(cx, cy, r, PANEL_BG);
        overlay.stroke_circle(cx, cy, r, self.color, 1);
        overlay.stroke_circle(cx, cy, r / 3, self.color, 1);
        overlay.stroke_circle(cx, cy, 2 * r / 3, self.color, 1);

        let dim = Rgb(self.color.0 / 3, self.color.1 / 3, self.color.2 / 3);
        overlay.draw_line(cx - r, cy, cx + r, cy, dim, 1);
        overlay.draw_line(cx, cy - r, cx, cy + r, dim, 1);

        for (label, dx, dy) in [("N", 0, -1), ("S", 0, 1), ("E", 1, 0), ("W", -1, 0)] {
            let mx = cx + dx * (r + 12);
            let my = cy + dy * (r + 12);
            draw_label(overlay, label, mx - 1, my + 2, 1, self.color);
        }

        // Trail first so the sweep line stays on top.
        for i in (0..TRAIL).rev() {
            let intensity = 1.0 - i as f32 / TRAIL as f32;
            let a = (self.sweep - i as f32).to_radians();
            let (tx, ty) = (cx + (r as f32 * a.cos()) as i32, cy + (r as f32 * a.sin()) as i32);
            overlay.draw_line(cx, cy, tx, ty, self.color.scale(intensity * 0.3), 1);
        }
        let a = self.sweep.to_radians();
        let (sx, sy) = (cx + (r as f32 * a.cos()) as i32, cy + (r as f32 * a.sin()) as i32);
        overlay.draw_line(cx, cy, sx, sy, self.color, 1);

        for blip in &self.blips {
            let age = state.now.saturating_duration_since(blip.seen).as_secs_f32();
            let alpha = (1.0 - age / BLIP_SECS).max(0.0);
            let bx = cx + ((blip.x - 0.5) * 2.0 * r as f32 * 0.8) as i32;
            let by = cy + ((blip.y - 0.5) * 2.0 * r as f32 * 0.8) as i32;
            overlay.fill_circle(bx, by, 3, self.color.scale(alpha));
        }

        overlay.fill_circle(cx, cy, 2, self.color);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
