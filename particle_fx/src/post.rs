//! Post-processing passes: bloom-style glow, CRT scanlines and holographic
//! flicker, plus a pipeline that chains them in that order.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::raster::{Frame, Rgb};

// ════════════════════════════════════════════════════════════════════════════
// Glow
// ════════════════════════════════════════════════════════════════════════════

/// Bloom: pixels brighter than `threshold` are box-blurred over a
/// `blur_size`-wide window and added back at `intensity`.
pub fn apply_glow(frame: &mut Frame, intensity: f32, threshold: u8, blur_size: usize) {
    if intensity <= 0.0 {
        return;
    }
    let (w, h) = (frame.width(), frame.height());
    if w == 0 || h == 0 {
        return;
    }

    let mut bright = vec![[0.0f32; 3]; w * h];
    let mut any = false;
    for (dst, &p) in bright.iter_mut().zip(frame.pixels()) {
        let c = Rgb::from_u32(p);
        if c.luma() > threshold as f32 {
            *dst = [c.0 as f32, c.1 as f32, c.2 as f32];
            any = true;
        }
    }
    if !any {
        return;
    }

    let radius = blur_size / 2;
    let blurred = box_blur(&box_blur(&bright, w, h, radius, true), w, h, radius, false);

    for (p, b) in frame.pixels_mut().iter_mut().zip(&blurred) {
        let c = Rgb::from_u32(*p);
        let add = |base: u8, glow: f32| (base as f32 + glow * intensity).clamp(0.0, 255.0) as u8;
        *p = Rgb(add(c.0, b[0]), add(c.1, b[1]), add(c.2, b[2])).to_u32();
    }
}

/// One separable pass of a clipped box filter (sliding window sum).
fn box_blur(src: &[[f32; 3]], w: usize, h: usize, r: usize, horizontal: bool) -> Vec<[f32; 3]> {
    let mut out = vec![[0.0f32; 3]; w * h];
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let idx = |line: usize, i: usize| if horizontal { line * w + i } else { i * w + line };

    for line in 0..lines {
        let mut sum = [0.0f32; 3];
        let mut count = 0usize;
        for i in 0..r.min(len.saturating_sub(1)) + 1 {
            let s = src[idx(line, i)];
            for k in 0..3 { sum[k] += s[k]; }
            count += 1;
        }
        for i in 0..len {
            let o = &mut out[idx(line, i)];
            for k in 0..3 { o[k] = sum[k] / count as f32; }

            let enter = i + r + 1;
            if enter < len {
                let s = src[idx(line, enter)];
                for k in 0..3 { sum[k] += s[k]; }
                count += 1;
            }
            if i >= r {
                let s = src[idx(line, i - r)];
                for k in 0..3 { sum[k] -= s[k]; }
                count -= 1;
            }
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlowEffect {
    pub enabled:   bool,
    pub intensity: f32,
    pub threshold: u8,
    pub blur_size: usize,
}

impl Default for GlowEffect {
    fn default() -> Self {
        Self { enabled: true, intensity: 0.3, threshold: 180, blur_size: 21 }
    }
}

impl GlowEffect {
    pub fn apply(&self, frame: &mut Frame) {
        if self.enabled {
            apply_glow(frame, self.intensity, self.threshold, self.blur_size);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scanlines
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct ScanlineEffect {
    pub enabled: bool,
    /// Every `gap`-th row is darkened.
    pub gap:     usize,
}

impl Default for ScanlineEffect {
    fn default() -> Self { Self { enabled: false, gap: 3 } }
}

impl ScanlineEffect {
    pub fn apply(&self, frame: &mut Frame) {
        if !self.enabled || self.gap == 0 {
            return;
        }
        let w = frame.width();
        for (y, row) in frame.pixels_mut().chunks_exact_mut(w.max(1)).enumerate() {
            if y % self.gap == 0 {
                for p in row {
                    *p = Rgb::from_u32(*p).scale(0.7).to_u32();
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Holographic flicker
// ════════════════════════════════════════════════════════════════════════════

const FLICKER_PERIOD: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct HolographicFlicker {
    pub enabled:   bool,
    pub intensity: f32,
    last_roll:     Option<Instant>,
    brightness:    f32,
    rng:           StdRng,
}

impl HolographicFlicker {
    pub fn new(enabled: bool, intensity: f32) -> Self {
        Self::with_rng(enabled, intensity, StdRng::from_entropy())
    }

    pub fn with_rng(enabled: bool, intensity: f32, rng: StdRng) -> Self {
        Self { enabled, intensity, last_roll: None, brightness: 1.0, rng }
    }

    pub fn brightness(&self) -> f32 { self.brightness }

    pub fn apply(&mut self, frame: &mut Frame) {
        self.apply_at(frame, Instant::now());
    }

    /// Brightness is re-rolled at most every 50 ms; roughly one frame in
    /// ten also gets a 1–2 px blue-channel shift.
    pub fn apply_at(&mut self, frame: &mut Frame, now: Instant) {
        if !self.enabled || self.intensity <= 0.0 {
            return;
        }
        let due = self.last_roll.map_or(true, |t| now.saturating_duration_since(t) > FLICKER_PERIOD);
        if due {
            self.brightness = 1.0 + self.rng.gen_range(-self.intensity..=self.intensity);
            self.last_roll = Some(now);
        }
        for p in frame.pixels_mut() {
            *p = Rgb::from_u32(*p).scale(self.brightness).to_u32();
        }

        if self.rng.gen_bool(0.1) {
            let shift = self.rng.gen_range(1..=2usize);
            let w = frame.width();
            if shift < w {
                for row in frame.pixels_mut().chunks_exact_mut(w) {
                    for x in (shift..w).rev() {
                        let blue = row[x - shift] & 0xFF;
                        row[x] = (row[x] & !0xFF) | blue;
                    }
                }
            }
        }
    }
}

impl Default for HolographicFlicker {
    fn default() -> Self { Self::new(false, 0.05) }
}

// ════════════════════════════════════════════════════════════════════════════
// Pipeline
// ════════════════════════════════════════════════════════════════════════════

/// glow → scanlines → flicker.
#[derive(Clone, Debug, Default)]
pub struct EffectsPipeline {
    pub glow:      GlowEffect,
    pub scanlines: ScanlineEffect,
    pub flicker:   HolographicFlicker,
}

impl EffectsPipeline {
    pub fn new(glow: GlowEffect, scanlines: ScanlineEffect, flicker: HolographicFlicker) -> Self {
        Self { glow, scanlines, flicker }
    }

    pub fn apply(&mut self, frame: &mut Frame) {
        self.glow.apply(frame);
        self.scanlines.apply(frame);
        self.flicker.apply(frame);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intensity_glow_is_identity() {
        let mut f = Frame::new(64, 48);
        let before = f.clone();
        apply_glow(&mut f, 0.0, 180, 21);
        assert_eq!(f, before);
    }

    #[test]
    fn glow_on_dark_frame_is_identity() {
        let mut f = Frame::filled(32, 32, Rgb(40, 40, 40));
        let before = f.clone();
        apply_glow(&mut f, 0.8, 180, 21);
        assert_eq!(f, before);
    }

    #[test]
    fn glow_bleeds_around_bright_spot() {
        let mut f = Frame::new(32, 32);
        f.fill_rect(14, 14, 4, 4, Rgb::WHITE);
        apply_glow(&mut f, 1.0, 180, 9);
        assert!(f.get_pixel(12, 15).map_or(false, |c| c.r() > 0));
        assert_eq!(f.get_pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(f.get_pixel(15, 15), Some(Rgb::WHITE));
    }

    #[test]
    fn box_blur_preserves_constant_field() {
        let src = vec![[10.0f32, 20.0, 30.0]; 5 * 4];
        let out = box_blur(&src, 5, 4, 2, true);
        let out = box_blur(&out, 5, 4, 2, false);
        for px in out {
            assert!((px[0] - 10.0).abs() < 1e-3 && (px[2] - 30.0).abs() < 1e-3);
        }
    }

    #[test]
    fn scanlines_darken_every_gap_row() {
        let mut f = Frame::filled(4, 6, Rgb(100, 100, 100));
        ScanlineEffect { enabled: true, gap: 3 }.apply(&mut f);
        assert_eq!(f.get_pixel(0, 0), Some(Rgb(70, 70, 70)));
        assert_eq!(f.get_pixel(0, 1), Some(Rgb(100, 100, 100)));
        assert_eq!(f.get_pixel(0, 3), Some(Rgb(70, 70, 70)));
    }

    #[test]
    fn disabled_passes_do_nothing() {
        let mut f = Frame::filled(8, 8, Rgb(200, 200, 200));
        let before = f.clone();
        let mut p = EffectsPipeline::new(
            GlowEffect { enabled: false, ..GlowEffect::default() },
            ScanlineEffect::default(),
            HolographicFlicker::default(),
        );
        p.apply(&mut f);
        assert_eq!(f, before);
    }

    #[test]
    fn flicker_brightness_held_between_rolls() {
        let mut fl = HolographicFlicker::with_rng(true, 0.2, StdRng::seed_from_u64(3));
        let t0 = Instant::now();
        let mut f = Frame::filled(4, 4, Rgb(100, 100, 100));
        fl.apply_at(&mut f, t0);
        let b = fl.brightness();
        assert!((0.8..=1.2).contains(&b));
        fl.apply_at(&mut f, t0 + Duration::from_millis(10));
        assert_eq!(fl.brightness(), b);
    }
}
