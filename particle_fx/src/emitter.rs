//! Emitters: stateless factories that turn a position into a particle batch.
//!
//! | Emitter | Pattern | Typical use |
//! |---|---|---|
//! | [`BurstEmitter`] | radial, random angle and speed | explosions, impacts |
//! | [`StreamEmitter`] | directional with Gaussian spread | jets, sustained fire |
//! | [`RingEmitter`] | evenly spaced, expanding outward | shockwaves |
//! | [`TrailEmitter`] | near-stationary, rising embers | motion trails |
//!
//! Every emitter takes the RNG explicitly so tests can pass a seeded one;
//! [`Emitter::emit_at`] uses the thread-local generator.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use rand_distr::StandardNormal;

use crate::particle::{Particle, Shape};
use crate::raster::Rgb;

pub trait Emitter {
    fn emit<R: Rng + ?Sized>(&self, x: f32, y: f32, rng: &mut R) -> Vec<Particle>;

    fn emit_at(&self, x: f32, y: f32) -> Vec<Particle> {
        self.emit(x, y, &mut rand::thread_rng())
    }
}

// ── Sampling helpers ──────────────────────────────────────────────────────

/// Uniform in `[lo, hi]`; tolerates `lo >= hi`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
}

/// Zero-mean Gaussian with standard deviation `sigma`.
pub fn gauss<R: Rng + ?Sized>(rng: &mut R, sigma: f32) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    z * sigma
}

/// Jitter each channel by up to `±amount`, clamped to `0..=255`.
pub fn vary_color<R: Rng + ?Sized>(rng: &mut R, c: Rgb, amount: i32) -> Rgb {
    let mut j = |v: u8| (v as i32 + rng.gen_range(-amount..=amount)).clamp(0, 255) as u8;
    Rgb(j(c.0), j(c.1), j(c.2))
}

// ════════════════════════════════════════════════════════════════════════════
// Burst
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct BurstEmitter {
    pub count:        usize,
    pub speed_min:    f32,
    pub speed_max:    f32,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    pub color:        Rgb,
    pub size_min:     f32,
    pub size_max:     f32,
    pub gravity:      f32,
    pub drag:         f32,
    pub shape:        Shape,
}

impl Default for BurstEmitter {
    fn default() -> Self {
        Self {
            count:        30,
            speed_min:    0.05,
            speed_max:    0.2,
            lifetime_min: 0.3,
            lifetime_max: 1.0,
            color:        Rgb(255, 200, 0),
            size_min:     2.0,
            size_max:     6.0,
            gravity:      0.0,
            drag:         0.5,
            shape:        Shape::Circle,
        }
    }
}

impl Emitter for BurstEmitter {
    fn emit<R: Rng + ?Sized>(&self, x: f32, y: f32, rng: &mut R) -> Vec<Particle> {
        (0..self.count)
            .map(|_| {
                let angle = uniform(rng, 0.0, TAU);
                let speed = uniform(rng, self.speed_min, self.speed_max);
                Particle {
                    x:        x + gauss(rng, 0.005),
                    y:        y + gauss(rng, 0.005),
                    vx:       angle.cos() * speed,
                    vy:       angle.sin() * speed,
                    color:    vary_color(rng, self.color, 20),
                    size:     uniform(rng, self.size_min, self.size_max),
                    lifetime: uniform(rng, self.lifetime_min, self.lifetime_max),
                    gravity:  self.gravity,
                    drag:     self.drag,
                    shape:    self.shape,
                    ..Particle::default()
                }
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Stream
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct StreamEmitter {
    pub count_per_emit: usize,
    /// Radians; `−π/2` is straight up on screen.
    pub direction:      f32,
    /// Standard deviation of the angle, radians.
    pub spread:         f32,
    pub speed_min:      f32,
    pub speed_max:      f32,
    pub lifetime:       f32,
    pub color:          Rgb,
    pub size:           f32,
    pub gravity:        f32,
    pub drag:           f32,
    pub shape:          Shape,
}

impl Default for StreamEmitter {
    fn default() -> Self {
        Self {
            count_per_emit: 5,
            direction:      -PI / 2.0,
            spread:         0.3,
            speed_min:      0.05,
            speed_max:      0.15,
            lifetime:       0.6,
            color:          Rgb(255, 140, 0),
            size:           4.0,
            gravity:        0.0,
            drag:           0.3,
            shape:          Shape::Circle,
        }
    }
}

impl Emitter for StreamEmitter {
    fn emit<R: Rng + ?Sized>(&self, x: f32, y: f32, rng: &mut R) -> Vec<Particle> {
        (0..self.count_per_emit)
            .map(|_| {
                let angle = self.direction + gauss(rng, self.spread);
                let speed = uniform(rng, self.speed_min, self.speed_max);
                Particle {
                    x:        x + gauss(rng, 0.003),
                    y:        y + gauss(rng, 0.003),
                    vx:       angle.cos() * speed,
                    vy:       angle.sin() * speed,
                    color:    vary_color(rng, self.color, 15),
                    size:     self.size + uniform(rng, -1.0, 1.0),
                    lifetime: self.lifetime + uniform(rng, -0.1, 0.1),
                    gravity:  self.gravity,
                    drag:     self.drag,
                    shape:    self.shape,
                    ..Particle::default()
                }
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Ring
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct RingEmitter {
    pub count:    usize,
    pub radius:   f32,
    pub speed:    f32,
    pub lifetime: f32,
    pub color:    Rgb,
    pub size:     f32,
    pub drag:     f32,
    pub shape:    Shape,
}

impl Default for RingEmitter {
    fn default() -> Self {
        Self {
            count:    40,
            radius:   0.02,
            speed:    0.15,
            lifetime: 0.5,
            color:    Rgb(0, 200, 200),
            size:     3.0,
            drag:     0.8,
            shape:    Shape::Circle,
        }
    }
}

impl Emitter for RingEmitter {
    fn emit<R: Rng + ?Sized>(&self, x: f32, y: f32, rng: &mut R) -> Vec<Particle> {
        let n = self.count.max(1) as f32;
        (0..self.count)
            .map(|i| {
                let angle = TAU * i as f32 / n;
                let (s, c) = angle.sin_cos();
                Particle {
                    x:        x + c * self.radius,
                    y:        y + s * self.radius,
                    vx:       c * self.speed,
                    vy:       s * self.speed,
                    color:    vary_color(rng, self.color, 10),
                    size:     self.size,
                    lifetime: self.lifetime + uniform(rng, -0.05, 0.05),
                    drag:     self.drag,
                    shape:    self.shape,
                    ..Particle::default()
                }
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Trail
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct TrailEmitter {
    pub count_per_emit: usize,
    pub lifetime:       f32,
    pub color:          Rgb,
    pub size_min:       f32,
    pub size_max:       f32,
    /// Negative values make embers rise.
    pub gravity:        f32,
    pub drag:           f32,
    pub size_decay:     f32,
    pub shape:          Shape,
}

impl Default for TrailEmitter {
    fn default() -> Self {
        Self {
            count_per_emit: 3,
            lifetime:       0.4,
            color:          Rgb(255, 100, 0),
            size_min:       2.0,
            size_max:       5.0,
            gravity:        -0.02,
            drag:           1.0,
            size_decay:     5.0,
            shape:          Shape::Circle,
        }
    }
}

impl Emitter for TrailEmitter {
    fn emit<R: Rng + ?Sized>(&self, x: f32, y: f32, rng: &mut R) -> Vec<Particle> {
        (0..self.count_per_emit)
            .map(|_| Particle {
                x:          x + gauss(rng, 0.008),
                y:          y + gauss(rng, 0.008),
                vx:         gauss(rng, 0.01),
                vy:         gauss(rng, 0.01),
                color:      vary_color(rng, self.color, 25),
                size:       uniform(rng, self.size_min, self.size_max),
                lifetime:   self.lifetime + uniform(rng, -0.1, 0.1),
                gravity:    self.gravity,
                drag:       self.drag,
                size_decay: self.size_decay,
                shape:      self.shape,
                ..Particle::default()
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
