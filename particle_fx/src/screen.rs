//! Whole-frame impact effects: shake, flash and chromatic aberration.
//!
//! Each effect is armed with `trigger`, advanced with `update(dt)` and
//! painted with `apply(frame)`.  All three are no-ops once their duration
//! has elapsed.
//!
//! | Effect | Time-varying value |
//! |---|---|
//! | [`ScreenShake`] | random offset in `±intensity·(1 − t)` |
//! | [`ScreenFlash`] | additive overlay at `intensity·(1 − t²)` |
//! | [`ChromaticAberration`] | red/blue split of `shift·(1 − t)` px |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::raster::{add_rgb, Frame, Rgb};

// ════════════════════════════════════════════════════════════════════════════
// Shake
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ScreenShake {
    intensity: f32,
    duration:  f32,
    elapsed:   f32,
    offset:    (i32, i32),
    rng:       StdRng,
}

impl Default for ScreenShake {
    fn default() -> Self { Self::with_rng(StdRng::from_entropy()) }
}

impl ScreenShake {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { intensity: 0.0, duration: 0.0, elapsed: 0.0, offset: (0, 0), rng }
    }

    /// `intensity` is the peak offset in pixels.
    pub fn trigger(&mut self, intensity: f32, duration: f32) {
        self.intensity = intensity;
        self.duration  = duration;
        self.elapsed   = 0.0;
    }

    pub fn active(&self) -> bool { self.elapsed < self.duration && self.intensity > 0.0 }

    pub fn offset(&self) -> (i32, i32) { self.offset }

    pub fn update(&mut self, dt: f32) {
        if !self.active() {
            self.offset = (0, 0);
            return;
        }
        self.elapsed += dt;
        let current = self.intensity * (1.0 - self.elapsed / self.duration).max(0.0);
        if current <= 0.0 {
            self.offset = (0, 0);
            return;
        }
        self.offset = (
            self.rng.gen_range(-current..=current) as i32,
            self.rng.gen_range(-current..=current) as i32,
        );
    }

    pub fn apply(&self, frame: &mut Frame) {
        if !self.active() || self.offset == (0, 0) {
            return;
        }
        frame.translate_reflect(self.offset.0, self.offset.1);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Flash
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ScreenFlash {
    color:     Rgb,
    intensity: f32,
    duration:  f32,
    elapsed:   f32,
}

impl Default for ScreenFlash {
    fn default() -> Self {
        Self { color: Rgb::WHITE, intensity: 0.0, duration: 0.0, elapsed: 0.0 }
    }
}

impl ScreenFlash {
    pub fn trigger(&mut self, color: Rgb, intensity: f32, duration: f32) {
        self.color     = color;
        self.intensity = intensity;
        self.duration  = duration;
        self.elapsed   = 0.0;
    }

    pub fn active(&self) -> bool { self.elapsed < self.duration && self.intensity > 0.0 }

    pub fn update(&mut self, dt: f32) {
        if self.active() {
            self.elapsed += dt;
        }
    }

    /// Current overlay weight; zero when inactive.
    pub fn alpha(&self) -> f32 {
        if !self.active() {
            return 0.0;
        }
        let t = self.elapsed / self.duration;
        self.intensity * (1.0 - t * t).max(0.0)
    }

    pub fn apply(&self, frame: &mut Frame) {
        let alpha = self.alpha();
        if alpha < 0.02 {
            return;
        }
        for p in frame.pixels_mut() {
            *p = add_rgb(Rgb::from_u32(*p), self.color, alpha).to_u32();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Chromatic aberration
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct ChromaticAberration {
    shift:    i32,
    duration: f32,
    elapsed:  f32,
}

impl ChromaticAberration {
    pub fn trigger(&mut self, shift: i32, duration: f32) {
        self.shift    = shift;
        self.duration = duration;
        self.elapsed  = 0.0;
    }

    pub fn active(&self) -> bool { self.elapsed < self.duration && self.shift > 0 }

    pub fn update(&mut self, dt: f32) {
        if self.active() {
            self.elapsed += dt;
        }
    }

    pub fn current_shift(&self) -> i32 {
        if !self.active() {
            return 0;
        }
        (self.shift as f32 * (1.0 - self.elapsed / self.duration).max(0.0)) as i32
    }

    /// Blue moves left, red moves right; green stays put.
    pub fn apply(&self, frame: &mut Frame) {
        let s = self.current_shift();
        let w = frame.width();
        if s < 1 || s as usize >= w {
            return;
        }
        let s = s as usize;
        let src = frame.pixels().to_vec();
        let out = frame.pixels_mut();
        for (row_src, row_out) in src.chunks_exact(w).zip(out.chunks_exact_mut(w)) {
            for x in 0..w {
                let mut p = row_out[x];
                if x + s < w {
                    p = (p & !0x0000_00FF) | (row_src[x + s] & 0x0000_00FF);
                }
                if x >= s {
                    p = (p & !0x00FF_0000) | (row_src[x - s] & 0x00FF_0000);
                }
                row_out[x] = p;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScreenEffects
// ════════════════════════════════════════════════════════════════════════════

/// Aggregate of the three effects; `update` and `apply` fan out to all.
#[derive(Clone, Debug, Default)]
pub struct ScreenEffects {
    pub shake:      ScreenShake,
    pub flash:      ScreenFlash,
    pub aberration: ChromaticAberration,
}

impl ScreenEffects {
    pub fn new() -> Self { Self::default() }

    pub fn active(&self) -> bool {
        self.shake.active() || self.flash.active() || self.aberration.active()
    }

    pub fn update(&mut self, dt: f32) {
        self.shake.update(dt);
        self.flash.update(dt);
        self.aberration.update(dt);
    }

    pub fn apply(&self, frame: &mut Frame) {
        self.shake.apply(frame);
        self.flash.apply(frame);
        self.aberration.apply(frame);
    }

    /// Shake, flash and aberration together.
    pub fn trigger_impact(&mut self, shake_intensity: f32, flash_color: Rgb, flash_intensity: f32, shift: i32) {
        self.shake.trigger(shake_intensity, 0.3);
        self.flash.trigger(flash_color, flash_intensity, 0.2);
        self.aberration.trigger(shift, 0.15);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
