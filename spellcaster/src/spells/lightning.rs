//! Lightning: a jagged bolt from the top edge to the fingertip, re-rolled
//! most frames so it flickers, with sparks at the strike point.

use gesture_core::Point;
use particle_fx::emitter::{gauss, uniform};
use particle_fx::{BurstEmitter, Emitter, Frame, Particle, Rgb, Shape};
use rand::rngs::StdRng;
use rand::Rng;

use super::{to_px, Lifecycle, SpellContext, SpellState};

const DURATION:      f32 = 0.6;
const SEGMENTS:      usize = 12;
const JITTER:        f32 = 0.04;
const REROLL_CHANCE: f64 = 0.7;
const SPARK_CHANCE:  f64 = 0.5;

/// Normalised polyline.
pub type BoltPath = Vec<(f32, f32)>;

#[derive(Clone, Debug)]
pub struct Lightning {
    target:   (f32, f32),
    bolt:     BoltPath,
    branches: Vec<BoltPath>,
    strike:   BurstEmitter,
}

impl Lightning {
    pub fn new() -> Self {
        Self {
            target:   (0.5, 0.5),
            bolt:     Vec::new(),
            branches: Vec::new(),
            strike: BurstEmitter {
                count:        15,
                speed_min:    0.03,
                speed_max:    0.12,
                lifetime_min: 0.1,
                lifetime_max: 0.3,
                color:        Rgb(50, 200, 255),
                size_min:     1.0,
                size_max:     3.0,
                drag:         1.5,
                shape:        Shape::Spark,
                ..BurstEmitter::default()
            },
        }
    }

    pub fn target(&self) -> (f32, f32) { self.target }
    pub fn bolt(&self) -> &[(f32, f32)] { &self.bolt }
    pub fn branches(&self) -> &[BoltPath] { &self.branches }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        self.target = (x, y);
        life.transition(SpellState::Active);
        self.regenerate(ctx.rng);

        ctx.screen.flash.trigger(Rgb(100, 220, 255), 0.5, 0.1);
        ctx.screen.shake.trigger(8.0, 0.15);
        ctx.particles.emit(self.strike.emit(x, y, &mut *ctx.rng));
    }

    fn regenerate(&mut self, rng: &mut StdRng) {
        let (tx, ty) = self.target;
        let top = (tx + uniform(rng, -0.05, 0.05), 0.0);
        self.bolt = jagged_path(rng, top, (tx, ty), SEGMENTS, JITTER);

        self.branches.clear();
        for _ in 0..rng.gen_range(1..=3) {
            if self.bolt.len() < 4 {
                continue;
            }
            let (bx, by) = self.bolt[rng.gen_range(2..=self.bolt.len() - 2)];
            let end = (bx + uniform(rng, -0.08, 0.08), by + uniform(rng, 0.02, 0.08));
            self.branches.push(jagged_path(rng, (bx, by), end, 5, 0.02));
        }
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, hand: Option<Point>, ctx: &mut SpellContext<'_>) {
        if let Some(p) = hand {
            self.target = (p.x, p.y);
        }
        if ctx.rng.gen_bool(REROLL_CHANCE) {
            self.regenerate(ctx.rng);
        }
        if ctx.rng.gen_bool(SPARK_CHANCE) {
            let rng = &mut *ctx.rng;
            let spark = Particle {
                x:        self.target.0 + gauss(rng, 0.008),
                y:        self.target.1 + gauss(rng, 0.008),
                vx:       gauss(rng, 0.05),
                vy:       gauss(rng, 0.05),
                color:    Rgb(rng.gen_range(50..=150), rng.gen_range(180..=255), 255),
                size:     uniform(rng, 1.0, 3.0),
                lifetime: 0.15,
                shape:    Shape::Spark,
                ..Particle::default()
            };
            ctx.particles.emit([spark]);
        }
        if life.elapsed() >= DURATION {
            life.transition(SpellState::Done);
        }
    }

    pub(crate) fn render(&self, life: &Lifecycle, frame: &mut Frame) {
        let alpha = (1.0 - life.elapsed() / DURATION).max(0.3);

        draw_bolt(frame, &self.bolt, alpha, 2);
        for branch in &self.branches {
            draw_bolt(frame, branch, alpha * 0.6, 1);
        }

        let (sx, sy) = to_px(frame, self.target.0, self.target.1);
        if frame.in_bounds(sx, sy) {
            let glow = (15.0 * alpha) as i32;
            frame.fill_circle(sx, sy, glow, Rgb(200, 255, 255));
            frame.stroke_circle(sx, sy, glow + 4, Rgb(50, 200, 255), 2);
        }
    }
}

impl Default for Lightning {
    fn default() -> Self { Self::new() }
}

/// Straight line from `start` to `end` split into `segments`, interior
/// points jittered (half as much vertically).
fn jagged_path(rng: &mut StdRng, start: (f32, f32), end: (f32, f32), segments: usize, jitter: f32) -> BoltPath {
    let mut pts = Vec::with_capacity(segments + 1);
    pts.push(start);
    for i in 1..segments {
        let t = i as f32 / segments as f32;
        pts.push((
            start.0 + (end.0 - start.0) * t + gauss(rng, jitter),
            start.1 + (end.1 - start.1) * t + gauss(rng, jitter * 0.5),
        ));
    }
    pts.push(end);
    pts
}

fn draw_bolt(frame: &mut Frame, path: &[(f32, f32)], alpha: f32, thickness: i32) {
    if path.len() < 2 {
        return;
    }
    let core = Rgb(220, 255, 255).scale(alpha);
    let glow = Rgb(50, 150, 200).scale(alpha);
    let pts: Vec<(i32, i32)> = path.iter().map(|&(x, y)| to_px(frame, x, y)).collect();
    frame.stroke_polyline(&pts, glow, thickness + 3);
    frame.stroke_polyline(&pts, core, thickness);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::{Spell, SpellBody, SpellKind};
    use super::*;
    use rand::SeedableRng;

    fn lightning(s: &Spell) -> &Lightning {
        match s.body() {
            SpellBody::Lightning(l) => l,
            _ => panic!("not lightning"),
        }
    }

    #[test]
    fn path_runs_from_start_to_end() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = jagged_path(&mut rng, (0.5, 0.0), (0.4, 0.6), 12, 0.04);
        assert_eq!(p.len(), 13);
        assert_eq!(p[0], (0.5, 0.0));
        assert_eq!(p[12], (0.4, 0.6));
    }

    #[test]
    fn cast_builds_bolt_and_shakes() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Lightning);
        s.cast(0.3, 0.7, &mut h.ctx());
        let l = lightning(&s);
        assert_eq!(l.bolt().len(), SEGMENTS + 1);
        assert_eq!(l.bolt().last(), Some(&(0.3, 0.7)));
        assert!((1..=3).contains(&l.branches().len()));
        assert!(h.screen.flash.active() && h.screen.shake.active());
        assert_eq!(h.particles.count(), 15);
    }

    #[test]
    fn tracks_hand_and_expires() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Lightning);
        s.cast(0.3, 0.7, &mut h.ctx());
        s.update(0.1, Some(Point::new(0.6, 0.4)), &mut h.ctx());
        assert_eq!(lightning(&s).target(), (0.6, 0.4));
        s.update(0.4, None, &mut h.ctx());
        assert!(s.is_alive());
        s.update(0.2, None, &mut h.ctx());
        assert!(!s.is_alive());
    }

    #[test]
    fn renders_strike_glow() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Lightning);
        s.cast(0.5, 0.5, &mut h.ctx());
        let mut f = Frame::new(100, 100);
        s.render(&mut f);
        assert_eq!(f.get_pixel(50, 50), Some(Rgb(200, 255, 255)));
    }
}
