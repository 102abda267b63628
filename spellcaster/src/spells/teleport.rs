//! Teleport: a half-second digital glitch.  Rows of the frame are torn
//! sideways, static washes over everything and stray pixels flicker in.

use particle_fx::emitter::uniform;
use particle_fx::{BurstEmitter, Emitter, Frame, Particle, Rgb, Shape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Lifecycle, SpellContext, SpellState};

const DURATION: f32 = 0.5;
const DIGITAL:  [Rgb; 4] = [Rgb(0, 0, 255), Rgb(0, 255, 0), Rgb(255, 0, 0), Rgb::WHITE];

/// A horizontal band of rows shifted sideways by `offset` pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlitchLine {
    /// Top of the band as a percentage of frame height.
    pub y_pct:  u32,
    pub height: u32,
    pub offset: i32,
}

#[derive(Clone, Debug)]
pub struct Teleport {
    glitch_lines:     Vec<GlitchLine>,
    static_intensity: f32,
    noise_seed:       u64,
    burst:            BurstEmitter,
}

impl Teleport {
    pub fn new() -> Self {
        Self {
            glitch_lines:     Vec::new(),
            static_intensity: 0.0,
            noise_seed:       0,
            burst: BurstEmitter {
                count:        40,
                speed_min:    0.05,
                speed_max:    0.2,
                lifetime_min: 0.2,
                lifetime_max: 0.5,
                color:        Rgb(100, 100, 255),
                size_min:     1.0,
                size_max:     4.0,
                drag:         1.0,
                shape:        Shape::Spark,
                ..BurstEmitter::default()
            },
        }
    }

    pub fn glitch_lines(&self)     -> &[GlitchLine] { &self.glitch_lines }
    pub fn static_intensity(&self) -> f32           { self.static_intensity }

    pub(crate) fn cast(&mut self, life: &mut Lifecycle, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        life.transition(SpellState::Active);

        ctx.screen.aberration.trigger(8, 0.3);
        ctx.screen.flash.trigger(Rgb(255, 200, 255), 0.6, 0.08);
        ctx.screen.shake.trigger(6.0, 0.1);
        ctx.particles.emit(self.burst.emit(x, y, &mut *ctx.rng));
    }

    pub(crate) fn update(&mut self, life: &mut Lifecycle, ctx: &mut SpellContext<'_>) {
        let progress = life.elapsed() / DURATION;
        let rng = &mut *ctx.rng;

        self.glitch_lines.clear();
        if progress < 0.8 && rng.gen_bool(0.6) {
            for _ in 0..rng.gen_range(3..=8) {
                self.glitch_lines.push(GlitchLine {
                    y_pct:  rng.gen_range(0..=100),
                    height: rng.gen_range(1..=5),
                    offset: rng.gen_range(-30..=30),
                });
            }
        }

        self.static_intensity = (0.3 * (1.0 - progress * 1.5)).max(0.0);
        self.noise_seed = rng.gen();

        if progress < 0.7 && rng.gen_bool(0.4) {
            let color = DIGITAL[rng.gen_range(0..DIGITAL.len())];
            let pixel = Particle {
                x:        uniform(rng, 0.1, 0.9),
                y:        uniform(rng, 0.1, 0.9),
                color,
                size:     uniform(rng, 1.0, 3.0),
                lifetime: 0.1,
                shape:    Shape::Spark,
                ..Particle::default()
            };
            ctx.particles.emit([pixel]);
        }

        if life.elapsed() >= DURATION {
            life.transition(SpellState::Done);
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame) {
        let (w, h) = (frame.width(), frame.height());
        if w == 0 || h == 0 {
            return;
        }

        for line in &self.glitch_lines {
            let top = (line.y_pct as usize * h / 100).min(h);
            let bottom = (top + line.height as usize).min(h);
            let shift = line.offset.unsigned_abs() as usize % w;
            for row in frame.pixels_mut()[top * w..bottom * w].chunks_exact_mut(w) {
                if line.offset >= 0 {
                    row.rotate_right(shift);
                } else {
                    row.rotate_left(shift);
                }
            }
        }

        if self.static_intensity > 0.02 {
            let mut rng = StdRng::seed_from_u64(self.noise_seed);
            let amount = 255.0 * self.static_intensity;
            for p in frame.pixels_mut() {
                let n = (rng.gen::<f32>() * amount) as u8;
                let c = Rgb::from_u32(*p);
                *p = Rgb(c.0.saturating_add(n), c.1.saturating_add(n), c.2.saturating_add(n)).to_u32();
            }
        }
    }
}

impl Default for Teleport {
    fn default() -> Self { Self::new() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
