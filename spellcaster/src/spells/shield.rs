//! Shield: a rotating hexagonal barrier that follows the hand until it is
//! dismissed (or times out), then shrinks away.

use std::f32::consts::TAU;

use gesture_core::Point;
use particle_fx::emitter::uniform;
use particle_fx::{Frame, Particle, Rgb, Shape};
use rand::Rng;

use super::{to_px, Lifecycle, SpellContext, SpellState};

const TARGET_RADIUS: f32 = 0.08;
const FOLLOW:        f32 = 0.3;
const GROW_RATE:     f32 = 5.0;
const SHRINK_RATE:   f32 = 0.3;
const MAX_DURATION:  f32 = 5.0;
const EDGE_CHANCE:   f64 = 0.4;
/// Vertical squash so the barrier reads as a bubble in front of the hand.
const ASPECT:        f32 = 0.7;
const TINT:          Rgb = Rgb(0, 150, 200);

#[derive(Clone, Debug)]
pub struct Shield {
    x:           f32,
    y:           f32,
    radius:      f32,
    rotation:    f32,
    pulse_phase: f32,
}

impl Shield {
    pub fn new() -> Self {
        Self { x: 0.5, y: 0.5, radius: 0.0, rotation: 0.0, pulse_phase: 0.0 }
    }

    pub fn radius(&self)   -> f32        { self.radius }
    pub fn position(&self) -> (f32, f32) { (self.x, self.y) }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        self.x = x;
        self.y = y;
        life.transition(SpellState::Active);
        ctx.screen.flash.trigger(TINT, 0.2, 0.1);
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, dt: f32, hand: Option<Point>, ctx: &mut SpellContext<'_>) {
        match life.state() {
            SpellState::Active => {
                if let Some(p) = hand {
                    self.x += (p.x - self.x) * FOLLOW;
                    self.y += (p.y - self.y) * FOLLOW;
                }
                self.radius += (TARGET_RADIUS - self.radius) * (GROW_RATE * dt).min(1.0);
                self.rotation += dt * 0.5;
                self.pulse_phase += dt * 4.0;

                if ctx.rng.gen_bool(EDGE_CHANCE) {
                    let rng = &mut *ctx.rng;
                    let angle = uniform(rng, 0.0, TAU);
                    let spark = Particle {
                        x:        self.x + angle.cos() * self.radius,
                        y:        self.y + angle.sin() * self.radius * ASPECT,
                        vx:       angle.cos() * 0.01,
                        vy:       angle.sin() * 0.01,
                        color:    TINT,
                        size:     uniform(rng, 1.0, 3.0),
                        lifetime: 0.3,
                        drag:     2.0,
                        shape:    Shape::Spark,
                        ..Particle::default()
                    };
                    ctx.particles.emit([spark]);
                }

                if life.elapsed() >= MAX_DURATION {
                    self.dismiss(life);
                }
            }
            SpellState::Fading => {
                self.radius -= dt * SHRINK_RATE;
                if self.radius <= 0.0 {
                    life.transition(SpellState::Done);
                }
            }
            _ => {}
        }
    }

    /// Begin fading; ignored unless ACTIVE.
    pub(crate) fn dismiss(&mut self, life: &mut Lifecycle) {
        if life.is(SpellState::Active) {
            life.transition(SpellState::Fading);
        }
    }

    pub(crate) fn render(&self, life: &Lifecycle, frame: &mut Frame) {
        if self.radius < 0.005 {
            return;
        }
        let (cx, cy) = to_px(frame, self.x, self.y);
        let rx = self.radius * frame.width() as f32;
        let ry = self.radius * frame.height() as f32 * ASPECT;

        let pulse = 0.5 + 0.2 * self.pulse_phase.sin();
        let alpha = if life.is(SpellState::Active) { pulse } else { pulse * 0.5 };

        let outer = hexagon(cx, cy, rx, ry, self.rotation);
        let inner = hexagon(cx, cy, rx * 0.6, ry * 0.6, -self.rotation * 0.5);

        // translucent fill through a patch covering the hexagon
        let (x0, y0) = (cx - rx as i32 - 1, cy - ry as i32 - 1);
        let (x1, y1) = (cx + rx as i32 + 2, cy + ry as i32 + 2);
        let mut patch = frame.region(x0, y0, x1, y1);
        let (px0, py0) = (x0.max(0), y0.max(0));
        let shifted: Vec<(i32, i32)> = outer.iter().map(|&(x, y)| (x - px0, y - py0)).collect();
        patch.fill_polygon(&shifted, TINT);
        frame.blend_region(px0, py0, &patch, alpha * 0.15);

        frame.stroke_polygon(&outer, Rgb(50, 200, 255).scale(alpha), 2);
        frame.stroke_polygon(&inner, Rgb(30, 150, 200).scale(alpha * 0.6), 1);
    }
}

impl Default for Shield {
    fn default() -> Self { Self::new() }
}

fn hexagon(cx: i32, cy: i32, rx: f32, ry: f32, rotation: f32) -> Vec<(i32, i32)> {
    (0..6)
        .map(|i| {
            let a = rotation + TAU * i as f32 / 6.0;
            (cx + (a.cos() * rx) as i32, cy + (a.sin() * ry) as i32)
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::{Spell, SpellBody, SpellKind};
    use super::*;

    fn shield(s: &Spell) -> &Shield {
        match s.body() {
            SpellBody::Shield(b) => b,
            _ => panic!("not a shield"),
        }
    }

    #[test]
    fn grows_toward_target_radius_and_follows_hand() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Shield);
        s.cast(0.5, 0.5, &mut h.ctx());
        for _ in 0..60 {
            s.update(1.0 / 30.0, Some(Point::new(0.7, 0.5)), &mut h.ctx());
        }
        let b = shield(&s);
        assert!((b.radius() - TARGET_RADIUS).abs() < 0.005);
        assert!((b.position().0 - 0.7).abs() < 1e-3);
    }

    #[test]
    fn dismiss_fades_to_done() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Shield);
        s.cast(0.5, 0.5, &mut h.ctx());
        for _ in 0..30 {
            s.update(1.0 / 30.0, None, &mut h.ctx());
        }
        s.dismiss();
        assert_eq!(s.state(), SpellState::Fading);
        s.dismiss();
        assert_eq!(s.state(), SpellState::Fading);

        // radius ≤ 0.08 shrinking at 0.3/s is gone within 0.3 s
        for _ in 0..10 {
            s.update(1.0 / 30.0, None, &mut h.ctx());
        }
        assert!(!s.is_alive());
    }

    #[test]
    fn times_out_after_five_seconds() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Shield);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(4.9, None, &mut h.ctx());
        assert_eq!(s.state(), SpellState::Active);
        s.update(0.2, None, &mut h.ctx());
        assert_eq!(s.state(), SpellState::Fading);
    }

    #[test]
    fn barrier_is_drawn_around_centre() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Shield);
        s.cast(0.5, 0.5, &mut h.ctx());
        for _ in 0..30 {
            s.update(1.0 / 30.0, None, &mut h.ctx());
        }
        let mut f = Frame::new(200, 200);
        s.render(&mut f);
        assert!(!f.is_black());
        // the fill is translucent, so the centre is tinted but not opaque
        let c = f.get_pixel(100, 100).unwrap_or(Rgb::BLACK);
        assert!(c.b() > 0 && c.b() < TINT.b());
    }
}
