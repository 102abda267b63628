//! Force push: three staggered shockwave rings expand from the palm.

use particle_fx::{Emitter, Frame, RingEmitter, Rgb, Shape};

use super::{to_px, Lifecycle, SpellContext, SpellState};

const DURATION:   f32 = 0.8;
const RING_COUNT: usize = 3;

/// One expanding ring; starts growing after `delay` and vanishes at `max_radius`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShockRing {
    pub delay:      f32,
    pub radius:     f32,
    pub max_radius: f32,
    pub speed:      f32,
}

impl ShockRing {
    fn visible(&self, elapsed: f32) -> bool {
        elapsed >= self.delay && self.radius < self.max_radius
    }

    fn alpha(&self) -> f32 {
        (1.0 - self.radius / self.max_radius).max(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct ForcePush {
    x:       f32,
    y:       f32,
    elapsed: f32,
    rings:   Vec<ShockRing>,
    burst:   RingEmitter,
}

impl ForcePush {
    pub fn new() -> Self {
        let rings = (0..RING_COUNT)
            .map(|i| ShockRing {
                delay:      i as f32 * 0.1,
                radius:     0.0,
                max_radius: 0.15 + i as f32 * 0.03,
                speed:      0.4 - i as f32 * 0.05,
            })
            .collect();
        Self {
            x: 0.5, y: 0.5, elapsed: 0.0,
            rings,
            burst: RingEmitter {
                count:    30,
                radius:   0.01,
                speed:    0.2,
                lifetime: 0.4,
                color:    Rgb(0, 200, 200),
                size:     2.0,
                drag:     0.5,
                shape:    Shape::Circle,
            },
        }
    }

    pub fn rings(&self) -> &[ShockRing] { &self.rings }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        self.x = x;
        self.y = y;
        life.transition(SpellState::Active);

        ctx.screen.shake.trigger(12.0, 0.2);
        ctx.screen.flash.trigger(Rgb(100, 200, 200), 0.3, 0.1);
        ctx.particles.emit(self.burst.emit(x, y, &mut *ctx.rng));
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, dt: f32) {
        self.elapsed = life.elapsed();
        for ring in &mut self.rings {
            if self.elapsed >= ring.delay {
                ring.radius += ring.speed * dt;
            }
        }
        if self.elapsed >= DURATION {
            life.transition(SpellState::Done);
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame) {
        let (cx, cy) = to_px(frame, self.x, self.y);
        let (w, h) = (frame.width() as f32, frame.height() as f32);

        for ring in self.rings.iter().filter(|r| r.visible(self.elapsed)) {
            let alpha = ring.alpha();
            let rx = (ring.radius * w) as i32;
            let ry = (ring.radius * h * 0.7) as i32;
            frame.stroke_ellipse(cx, cy, rx, ry, 0.0, 360.0, Rgb(255, 230, 200).scale(alpha), 2);
            if rx > 5 {
                frame.stroke_ellipse(cx, cy, rx - 3, ry - 2, 0.0, 360.0, Rgb::WHITE.scale(alpha), 1);
            }
        }
    }
}

impl Default for ForcePush {
    fn default() -> Self { Self::new() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::{Spell, SpellBody, SpellKind};
    use super::*;

    fn push(s: &Spell) -> &ForcePush {
        match s.body() {
            SpellBody::ForcePush(p) => p,
            _ => panic!("not a force push"),
        }
    }

    #[test]
    fn rings_are_staggered() {
        let p = ForcePush::new();
        let delays: Vec<f32> = p.rings().iter().map(|r| r.delay).collect();
        assert_eq!(delays, [0.0, 0.1, 0.2]);
        assert!((p.rings()[2].max_radius - 0.21).abs() < 1e-6);
        assert!((p.rings()[2].speed - 0.3).abs() < 1e-6);
    }

    #[test]
    fn cast_shakes_and_emits_ring() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::ForcePush);
        s.cast(0.5, 0.5, &mut h.ctx());
        assert_eq!(h.particles.count(), 30);
        assert!(h.screen.shake.active());
        assert!(h.screen.flash.active());
    }

    #[test]
    fn later_rings_wait_for_their_delay() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::ForcePush);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(0.05, None, &mut h.ctx());
        let r = push(&s).rings();
        assert!(r[0].radius > 0.0);
        assert_eq!(r[1].radius, 0.0);
        assert!(r[0].visible(0.05));
        assert!(!r[1].visible(0.05));
    }

    #[test]
    fn done_after_duration() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::ForcePush);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(0.7, None, &mut h.ctx());
        assert!(s.is_alive());
        s.update(0.15, None, &mut h.ctx());
        assert!(!s.is_alive());
    }

    #[test]
    fn ring_alpha_falls_with_radius() {
        let ring = ShockRing { delay: 0.0, radius: 0.075, max_radius: 0.15, speed: 0.4 };
        assert!((ring.alpha() - 0.5).abs() < 1e-6);
        assert!(ring.visible(0.0));
        let gone = ShockRing { radius: 0.15, ..ring };
        assert!(!gone.visible(1.0));
    }

    #[test]
    fn renders_first_ring() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::ForcePush);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(0.1, None, &mut h.ctx());
        let mut f = Frame::new(200, 200);
        s.render(&mut f);
        assert!(!f.is_black());
        assert_eq!(f.get_pixel(100, 100), Some(Rgb::BLACK));
    }
}
