//! Fireball: an orb flies from the hand toward the centre of the screen,
//! growing as it goes and shedding embers, then explodes.

use particle_fx::emitter::{gauss, uniform};
use particle_fx::{BurstEmitter, Emitter, Frame, Particle, Rgb, Shape, TrailEmitter};
use rand::Rng;

use super::{to_px, Lifecycle, SpellContext, SpellState};

const SPEED:         f32 = 0.4;
const MAX_AGE:       f32 = 1.2;
const FADE_TIME:     f32 = 0.8;
const BASE_SIZE:     f32 = 0.02;
const GROWTH:        f32 = 0.015;
const EMBER_CHANCE:  f64 = 0.3;

#[derive(Clone, Debug)]
pub struct Fireball {
    x:          f32,
    y:          f32,
    vx:         f32,
    vy:         f32,
    orb_size:   f32,
    explode_at: Option<f32>,
    trail:      TrailEmitter,
    explosion:  BurstEmitter,
}

impl Fireball {
    pub fn new() -> Self {
        Self {
            x: 0.5, y: 0.5, vx: 0.0, vy: 0.0,
            orb_size:   BASE_SIZE,
            explode_at: None,
            trail: TrailEmitter {
                count_per_emit: 4,
                lifetime:       0.5,
                color:          Rgb(255, 100, 0),
                size_min:       3.0,
                size_max:       7.0,
                gravity:        0.01,
                drag:           1.5,
                size_decay:     8.0,
                ..TrailEmitter::default()
            },
            explosion: BurstEmitter {
                count:        60,
                speed_min:    0.05,
                speed_max:    0.25,
                lifetime_min: 0.3,
                lifetime_max: 0.8,
                color:        Rgb(255, 140, 0),
                size_min:     3.0,
                size_max:     8.0,
                gravity:      0.05,
                drag:         0.8,
                ..BurstEmitter::default()
            },
        }
    }

    pub fn position(&self) -> (f32, f32) { (self.x, self.y) }
    pub fn exploded(&self) -> bool { self.explode_at.is_some() }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        self.x = x;
        self.y = y;

        let (dx, dy) = (0.5 - x, 0.5 - y);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.01 {
            self.vx = dx / dist * SPEED;
            self.vy = dy / dist * SPEED;
        } else {
            self.vx = 0.0;
            self.vy = -SPEED;
        }

        life.transition(SpellState::Active);
        ctx.particles.emit(self.trail.emit(x, y, &mut *ctx.rng));
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, dt: f32, ctx: &mut SpellContext<'_>) {
        match life.state() {
            SpellState::Active => {
                self.x += self.vx * dt;
                self.y += self.vy * dt;
                self.orb_size = BASE_SIZE + life.elapsed() * GROWTH;

                ctx.particles.emit(self.trail.emit(self.x, self.y, &mut *ctx.rng));

                if ctx.rng.gen_bool(EMBER_CHANCE) {
                    let rng = &mut *ctx.rng;
                    let ember = Particle {
                        x:        self.x + gauss(rng, 0.01),
                        y:        self.y + gauss(rng, 0.01),
                        vx:       gauss(rng, 0.03),
                        vy:       gauss(rng, 0.03),
                        color:    Rgb(255, rng.gen_range(80..=200), 0),
                        size:     uniform(rng, 1.0, 3.0),
                        lifetime: uniform(rng, 0.2, 0.4),
                        shape:    Shape::Spark,
                        ..Particle::default()
                    };
                    ctx.particles.emit([ember]);
                }

                let off_screen = !(-0.1..=1.1).contains(&self.x) || !(-0.1..=1.1).contains(&self.y);
                if life.elapsed() >= MAX_AGE || off_screen {
                    self.explode_at = Some(life.elapsed());
                    life.transition(SpellState::Fading);
                    ctx.particles.emit(self.explosion.emit(self.x, self.y, &mut *ctx.rng));
                }
            }
            SpellState::Fading => {
                let since = self.explode_at.map_or(f32::INFINITY, |t| life.elapsed() - t);
                if since > FADE_TIME {
                    life.transition(SpellState::Done);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn render(&self, life: &Lifecycle, frame: &mut Frame) {
        if !matches!(life.state(), SpellState::Active | SpellState::Casting) {
            return;
        }
        let (cx, cy) = to_px(frame, self.x, self.y);
        let short = frame.width().min(frame.height()) as f32;
        let radius = ((self.orb_size * short) as i32).max(5);

        frame.fill_circle(cx, cy, radius, Rgb(255, 200, 0));
        frame.stroke_circle(cx, cy, radius + 3, Rgb(255, 140, 0), 2);
        frame.fill_circle(cx, cy, (radius / 2).max(2), Rgb(255, 255, 200));
    }
}

impl Default for Fireball {
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

    fn fireball(s: &Spell) -> &Fireball {
        match s.body() {
            SpellBody::Fireball(f) => f,
            _ => panic!("not a fireball"),
        }
    }

    #[test]
    fn flies_toward_centre() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Fireball);
        s.cast(0.1, 0.5, &mut h.ctx());
        assert!(h.particles.count() > 0);
        s.update(0.1, None, &mut h.ctx());
        let (x, y) = fireball(&s).position();
        assert!((x - 0.14).abs() < 1e-4);
        assert!((y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cast_at_centre_goes_up() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Fireball);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.update(0.5, None, &mut h.ctx());
        assert!(fireball(&s).position().1 < 0.5);
    }

    #[test]
    fn explodes_after_max_age_then_fades_out() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Fireball);
        s.cast(0.2, 0.2, &mut h.ctx());
        let mut before = 0;
        while s.state() == SpellState::Active {
            assert!(s.elapsed() < 1.25);
            before = h.particles.count();
            s.update(0.05, None, &mut h.ctx());
        }
        assert!(s.elapsed() > 1.15);
        assert_eq!(s.state(), SpellState::Fading);
        assert!(fireball(&s).exploded());
        assert!(h.particles.count() >= before + 60);

        for _ in 0..7 {
            s.update(0.1, None, &mut h.ctx());
        }
        assert!(s.is_alive());
        s.update(0.1, None, &mut h.ctx());
        s.update(0.1, None, &mut h.ctx());
        assert!(!s.is_alive());
    }

    #[test]
    fn orb_drawn_only_while_flying() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Fireball);
        s.cast(0.5, 0.5, &mut h.ctx());
        let mut f = Frame::new(100, 100);
        s.render(&mut f);
        assert_eq!(f.get_pixel(50, 50), Some(Rgb(255, 255, 200)));
    }
}
