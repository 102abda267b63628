//! Particles and the bounded engine that simulates and draws them.
//!
//! ## Physics step (per particle, in this order)
//!
//! | Step | Rule |
//! |---|---|
//! | drag | `v *= max(0, 1 − drag·dt)` (only when `drag > 0`) |
//! | gravity | `vy += gravity·dt` |
//! | acceleration | `v += a·dt` |
//! | integrate | `p += v·dt` |
//! | age | `age += dt` |
//! | fade | `alpha = max(0, 1 − (age/lifetime)·decay_rate)` |
//! | shrink | `size = max(0, size − size_decay·dt)` |
//!
//! ## Rendering
//!
//! Particles with `alpha ≥ 0.9` are drawn straight into the frame.  Fainter
//! ones are drawn opaque into a copy of their bounding region which is then
//! weighted-blended back, so the cost of a translucent particle scales with
//! its footprint rather than with the frame.

use tracing::trace;

use crate::raster::{Frame, Rgb};

const OPAQUE_ALPHA:    f32 = 0.9;
const MIN_DRAW_ALPHA:  f32 = 0.05;
const LINE_LEN_SCALE:  f32 = 15.0 * 0.01;

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shape {
    #[default]
    Circle,
    /// Segment trailing opposite the velocity, length proportional to speed.
    Line,
    /// Axis-aligned cross.
    Spark,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x:          f32,
    pub y:          f32,
    pub vx:         f32,
    pub vy:         f32,
    pub ax:         f32,
    pub ay:         f32,
    pub color:      Rgb,
    pub size:       f32,
    pub lifetime:   f32,
    pub age:        f32,
    pub alpha:      f32,
    pub decay_rate: f32,
    pub size_decay: f32,
    pub gravity:    f32,
    pub drag:       f32,
    pub shape:      Shape,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            x: 0.0, y: 0.0,
            vx: 0.0, vy: 0.0,
            ax: 0.0, ay: 0.0,
            color:      Rgb(200, 255, 0),
            size:       3.0,
            lifetime:   1.0,
            age:        0.0,
            alpha:      1.0,
            decay_rate: 1.0,
            size_decay: 0.0,
            gravity:    0.0,
            drag:       0.0,
            shape:      Shape::Circle,
        }
    }
}

impl Particle {
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, ..Self::default() }
    }

    pub fn alive(&self) -> bool {
        self.age < self.lifetime && self.alpha > 0.01 && self.size > 0.5
    }

    /// Normalised age: 0 at birth, 1 at (or past) end of life.
    pub fn life_ratio(&self) -> f32 {
        if self.lifetime > 0.0 { (self.age / self.lifetime).min(1.0) } else { 1.0 }
    }

    pub fn update(&mut self, dt: f32) {
        if self.drag > 0.0 {
            let k = (1.0 - self.drag * dt).max(0.0);
            self.vx *= k;
            self.vy *= k;
        }

        self.vy += self.gravity * dt;

        self.vx += self.ax * dt;
        self.vy += self.ay * dt;

        self.x += self.vx * dt;
        self.y += self.vy * dt;

        self.age += dt;
        self.alpha = (1.0 - (self.age / self.lifetime) * self.decay_rate).max(0.0);
        self.size = (self.size - self.size_decay * dt).max(0.0);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleEngine
// ════════════════════════════════════════════════════════════════════════════

/// Owns every live particle, up to a fixed cap.
pub struct ParticleEngine {
    max_particles: usize,
    particles:     Vec<Particle>,
}

impl ParticleEngine {
    pub fn new(max_particles: usize) -> Self {
        Self { max_particles, particles: Vec::with_capacity(max_particles.min(4096)) }
    }

    pub fn count(&self)    -> usize { self.particles.len() }
    pub fn capacity(&self) -> usize { self.max_particles }
    pub fn is_empty(&self) -> bool  { self.particles.is_empty() }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> { self.particles.iter() }

    /// Admit as many of `batch` as fit, in order; the rest are dropped.
    /// Returns how many were admitted.
    pub fn emit<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = Particle>,
    {
        let space = self.max_particles.saturating_sub(self.particles.len());
        if space == 0 {
            return 0;
        }
        let before = self.particles.len();
        self.particles.extend(batch.into_iter().take(space));
        self.particles.len() - before
    }

    /// Step physics and cull the dead in one pass.
    pub fn update(&mut self, dt: f32) {
        let before = self.particles.len();
        self.particles.retain_mut(|p| {
            p.update(dt);
            p.alive()
        });
        let culled = before - self.particles.len();
        if culled > 0 {
            trace!(culled, live = self.particles.len(), "particles culled");
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn render(&self, frame: &mut Frame) {
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        for p in &self.particles {
            let px = (p.x * w as f32) as i32;
            let py = (p.y * h as f32) as i32;
            if px < 0 || px >= w || py < 0 || py >= h {
                continue;
            }
            let alpha = p.alpha.clamp(0.0, 1.0);
            if alpha < MIN_DRAW_ALPHA {
                continue;
            }
            let size = (p.size as i32).max(1);
            match p.shape {
                Shape::Circle => draw_circle(frame, px, py, size, p.color, alpha),
                Shape::Line   => draw_line(frame, px, py, p.vx, p.vy, size, p.color, alpha),
                Shape::Spark  => draw_spark(frame, px, py, size, p.color, alpha),
            }
        }
    }
}

// ── Shape painters ────────────────────────────────────────────────────────

/// Paint `draw` either directly (opaque) or through a blended patch
/// covering `[x0, x1) × [y0, y1)`.
fn with_alpha<F>(frame: &mut Frame, alpha: f32, bounds: (i32, i32, i32, i32), draw: F)
where
    F: Fn(&mut Frame, i32, i32),
{
    if alpha >= OPAQUE_ALPHA {
        draw(frame, 0, 0);
        return;
    }
    let (x0, y0, x1, y1) = bounds;
    let (x0, y0) = (x0.max(0), y0.max(0));
    let x1 = x1.min(frame.width() as i32);
    let y1 = y1.min(frame.height() as i32);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let mut patch = frame.region(x0, y0, x1, y1);
    draw(&mut patch, x0, y0);
    frame.blend_region(x0, y0, &patch, alpha);
}

fn draw_circle(frame: &mut Frame, px: i32, py: i32, size: i32, color: Rgb, alpha: f32) {
    let bounds = (px - size - 1, py - size - 1, px + size + 2, py + size + 2);
    with_alpha(frame, alpha, bounds, |f, ox, oy| f.fill_circle(px - ox, py - oy, size, color));
}

#[allow(clippy::too_many_arguments)]
fn draw_line(frame: &mut Frame, px: i32, py: i32, vx: f32, vy: f32, size: i32, color: Rgb, alpha: f32) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    let ex = ((px as f32 - vx * w as f32 * LINE_LEN_SCALE) as i32).clamp(0, w - 1);
    let ey = ((py as f32 - vy * h as f32 * LINE_LEN_SCALE) as i32).clamp(0, h - 1);
    let thickness = (size / 2).max(1);
    let bounds = (px.min(ex) - 2, py.min(ey) - 2, px.max(ex) + 3, py.max(ey) + 3);
    with_alpha(frame, alpha, bounds, |f, ox, oy| {
        f.draw_line(px - ox, py - oy, ex - ox, ey - oy, color, thickness)
    });
}

fn draw_spark(frame: &mut Frame, px: i32, py: i32, size: i32, color: Rgb, alpha: f32) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    let (x0, y0) = ((px - size).max(0), (py - size).max(0));
    let (x1, y1) = ((px + size).min(w - 1), (py + size).min(h - 1));
    let bounds = (x0 - 1, y0 - 1, x1 + 2, y1 + 2);
    with_alpha(frame, alpha, bounds, |f, ox, oy| {
        f.draw_line(x0 - ox, py - oy, x1 - ox, py - oy, color, 1);
        f.draw_line(px - ox, y0 - oy, px - ox, y1 - oy, color, 1);
    });
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Vec<Particle> {
        (0..n).map(|i| Particle::at(i as f32 / 100.0, 0.5)).collect()
    }

    #[test]
    fn dead_once_age_reaches_lifetime() {
        let p = Particle { age: 1.0, lifetime: 1.0, alpha: 1.0, size: 10.0, ..Particle::default() };
        assert!(!p.alive());
        let p = Particle { age: 0.99, lifetime: 1.0, ..Particle::default() };
        assert!(p.alive());
    }

    #[test]
    fn dead_when_faded_or_shrunk() {
        assert!(!Particle { alpha: 0.01, ..Particle::default() }.alive());
        assert!(!Particle { size: 0.5, ..Particle::default() }.alive());
    }

    #[test]
    fn life_ratio_clamps() {
        let p = Particle { age: 3.0, lifetime: 2.0, ..Particle::default() };
        assert_eq!(p.life_ratio(), 1.0);
        let p = Particle { lifetime: 0.0, ..Particle::default() };
        assert_eq!(p.life_ratio(), 1.0);
    }

    #[test]
    fn physics_order() {
        let mut p = Particle {
            vx: 1.0, vy: 0.0, gravity: 2.0, drag: 0.5, ay: 1.0, lifetime: 10.0,
            ..Particle::at(0.0, 0.0)
        };
        p.update(0.1);
        // drag first: vx = 0.95; then gravity + accel on vy = 0.3
        assert!((p.vx - 0.95).abs() < 1e-6);
        assert!((p.vy - 0.3).abs() < 1e-6);
        assert!((p.x - 0.095).abs() < 1e-6);
        assert!((p.y - 0.03).abs() < 1e-6);
        assert!((p.alpha - 0.99).abs() < 1e-6);
    }

    #[test]
    fn drag_never_reverses_velocity() {
        let mut p = Particle { vx: 1.0, drag: 50.0, ..Particle::default() };
        p.update(0.1);
        assert_eq!(p.vx, 0.0);
    }

    #[test]
    fn size_decays_to_zero_floor() {
        let mut p = Particle { size: 1.0, size_decay: 100.0, ..Particle::default() };
        p.update(0.1);
        assert_eq!(p.size, 0.0);
        assert!(!p.alive());
    }

    #[test]
    fn emit_respects_capacity() {
        let mut e = ParticleEngine::new(5);
        assert_eq!(e.emit(batch(10)), 5);
        assert_eq!(e.count(), 5);
        assert_eq!(e.emit(batch(3)), 0);
        assert_eq!(e.count(), 5);
    }

    #[test]
    fn emit_keeps_input_order() {
        let mut e = ParticleEngine::new(3);
        e.emit(batch(2));
        e.emit(batch(4));
        let xs: Vec<f32> = e.particles().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.01, 0.0]);
    }

    #[test]
    fn update_culls_dead() {
        let mut e = ParticleEngine::new(100);
        e.emit(vec![
            Particle { lifetime: 0.05, ..Particle::default() },
            Particle { lifetime: 5.0,  ..Particle::default() },
        ]);
        e.update(0.1);
        assert_eq!(e.count(), 1);
        e.clear();
        assert!(e.is_empty());
    }

    #[test]
    fn opaque_circle_drawn_directly() {
        let mut f = Frame::new(64, 64);
        let mut e = ParticleEngine::new(10);
        e.emit(vec![Particle { color: Rgb(255, 0, 0), size: 3.0, ..Particle::at(0.5, 0.5) }]);
        e.render(&mut f);
        assert_eq!(f.get_pixel(32, 32), Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn translucent_particle_blends() {
        let mut f = Frame::new(64, 64);
        let mut e = ParticleEngine::new(10);
        e.emit(vec![Particle { color: Rgb(200, 0, 0), alpha: 0.5, ..Particle::at(0.5, 0.5) }]);
        e.render(&mut f);
        assert_eq!(f.get_pixel(32, 32), Some(Rgb(100, 0, 0)));
    }

    #[test]
    fn faint_and_offscreen_particles_skipped() {
        let mut f = Frame::new(32, 32);
        let mut e = ParticleEngine::new(10);
        e.emit(vec![
            Particle { alpha: 0.04, ..Particle::at(0.5, 0.5) },
            Particle::at(1.2, 0.5),
            Particle::at(0.5, -0.1),
        ]);
        e.render(&mut f);
        assert!(f.is_black());
    }

    #[test]
    fn spark_and_line_shapes_render() {
        let mut f = Frame::new(64, 64);
        let mut e = ParticleEngine::new(10);
        e.emit(vec![
            Particle { shape: Shape::Spark, size: 4.0, ..Particle::at(0.25, 0.25) },
            Particle { shape: Shape::Line, vx: 1.0, size: 2.0, ..Particle::at(0.75, 0.75) },
        ]);
        e.render(&mut f);
        assert_eq!(f.get_pixel(20, 16), Some(Particle::default().color));
        assert_eq!(f.get_pixel(16, 20), Some(Particle::default().color));
        // line trails to the left of a rightward-moving particle
        assert_eq!(f.get_pixel(45, 48), Some(Particle::default().color));
    }
}
