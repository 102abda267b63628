//! Wind: a gust of leaves and dust blowing across the screen in the swipe
//! direction.  Draws nothing itself; the particles are the effect.

use particle_fx::emitter::{gauss, uniform};
use particle_fx::{Particle, ParticleEngine, Rgb, Shape};
use rand::rngs::StdRng;
use rand::Rng;

use super::{Lifecycle, SpellContext, SpellState};

const DURATION:       f32 = 0.8;
const EMIT_UNTIL:     f32 = DURATION * 0.6;
const EMIT_INTERVAL:  f32 = 0.05;
const INITIAL_GUST:   usize = 30;
const GUST_PER_EMIT:  usize = 8;

const DEBRIS_COLORS: [Rgb; 5] = [
    Rgb(180, 180, 180),
    Rgb(100, 180, 100),
    Rgb(160, 130,  80),
    Rgb(200, 200, 200),
    Rgb( 80, 160, 120),
];
const DEBRIS_SHAPES: [Shape; 4] = [Shape::Circle, Shape::Line, Shape::Line, Shape::Spark];

#[derive(Clone, Debug)]
pub struct Wind {
    direction:  f32,
    emit_phase: f32,
}

impl Wind {
    pub fn new() -> Self {
        Self { direction: 1.0, emit_phase: 0.0 }
    }

    /// +1 blows right, −1 blows left.
    pub fn direction(&self) -> f32 { self.direction }

    /// Only the sign of `direction` matters.
    pub fn set_direction(&mut self, direction: f32) {
        self.direction = if direction < 0.0 { -1.0 } else { 1.0 };
    }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, _x: f32, _y: f32, ctx: &mut SpellContext<'_>) {
        life.transition(SpellState::Active);
        ctx.screen.shake.trigger(5.0, 0.15);
        self.gust(ctx.particles, ctx.rng, INITIAL_GUST);
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, dt: f32, ctx: &mut SpellContext<'_>) {
        self.emit_phase += dt;
        if life.elapsed() < EMIT_UNTIL && self.emit_phase > EMIT_INTERVAL {
            self.emit_phase = 0.0;
            self.gust(ctx.particles, ctx.rng, GUST_PER_EMIT);
        }
        if life.elapsed() >= DURATION {
            life.transition(SpellState::Done);
        }
    }

    fn gust(&self, particles: &mut ParticleEngine, rng: &mut StdRng, count: usize) {
        let dir = self.direction;
        let batch: Vec<Particle> = (0..count)
            .map(|_| {
                let x = if dir > 0.0 { uniform(rng, -0.05, 0.2) } else { uniform(rng, 0.8, 1.05) };
                let color = DEBRIS_COLORS[rng.gen_range(0..DEBRIS_COLORS.len())];
                let shape = DEBRIS_SHAPES[rng.gen_range(0..DEBRIS_SHAPES.len())];
                Particle {
                    x,
                    y:        uniform(rng, 0.1, 0.9),
                    vx:       dir * uniform(rng, 0.3, 0.8),
                    vy:       gauss(rng, 0.05),
                    ax:       dir * 0.1,
                    color,
                    size:     uniform(rng, 1.5, 4.0),
                    lifetime: uniform(rng, 0.5, 1.0),
                    drag:     0.3,
                    gravity:  uniform(rng, 0.0, 0.02),
                    shape,
                    ..Particle::default()
                }
            })
            .collect();
        particles.emit(batch);
    }
}

impl Default for Wind {
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

    #[test]
    fn direction_is_a_sign() {
        let mut w = Wind::new();
        assert_eq!(w.direction(), 1.0);
        w.set_direction(-0.3);
        assert_eq!(w.direction(), -1.0);
        w.set_direction(5.0);
        assert_eq!(w.direction(), 1.0);
    }

    #[test]
    fn cast_emits_initial_gust() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Wind);
        s.cast(0.5, 0.5, &mut h.ctx());
        assert_eq!(h.particles.count(), INITIAL_GUST);
        assert!(h.screen.shake.active());
        assert!(h.particles.particles().all(|p| p.vx > 0.0 && p.x <= 0.2));
    }

    #[test]
    fn left_gust_starts_on_the_right() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Wind);
        s.set_direction(-1.0);
        assert!(matches!(s.body(), SpellBody::Wind(w) if w.direction() < 0.0));
        s.cast(0.5, 0.5, &mut h.ctx());
        assert!(h.particles.particles().all(|p| p.vx < 0.0 && p.x >= 0.8));
    }

    #[test]
    fn keeps_gusting_then_stops() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Wind);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(0.06, None, &mut h.ctx());
        assert_eq!(h.particles.count(), INITIAL_GUST + GUST_PER_EMIT);

        h.particles.clear();
        s.update(0.5, None, &mut h.ctx());
        s.update(0.06, None, &mut h.ctx());
        assert_eq!(h.particles.count(), 0);
        assert!(s.is_alive());
        s.update(0.2, None, &mut h.ctx());
        assert!(!s.is_alive());
    }
}
