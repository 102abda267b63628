//! Frame sources.
//!
//! | Source | Frames |
//! |---|---|
//! | [`SyntheticCamera`] | animated backdrop, endless unless capped |
//! | [`ImageSequence`]   | still images from a directory, in file-name order |
//!
//! `read()` returning `None` is end-of-stream, not an error.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use particle_fx::{Frame, Rgb};
use tracing::{debug, info, warn};

/// Anything that yields frames until it runs dry.
pub trait VideoSource {
    fn read(&mut self) -> Option<Frame>;
    fn size(&self) -> (usize, usize);
}

impl VideoSource for Box<dyn VideoSource> {
    fn read(&mut self) -> Option<Frame> { (**self).read() }
    fn size(&self) -> (usize, usize) { (**self).size() }
}

// ════════════════════════════════════════════════════════════════════════════
// SyntheticCamera
// ════════════════════════════════════════════════════════════════════════════

const GRID_STEP: usize = 40;

/// Dark gradient with a slowly scrolling grid, standing in for a webcam.
pub struct SyntheticCamera {
    width:  usize,
    height: usize,
    frame:  u64,
    limit:  Option<u64>,
}

impl SyntheticCamera {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width: width.max(1), height: height.max(1), frame: 0, limit: None }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn frames_read(&self) -> u64 { self.frame }
}

impl VideoSource for SyntheticCamera {
    fn read(&mut self) -> Option<Frame> {
        if self.limit.is_some_and(|n| self.frame >= n) {
            return None;
        }
        let (w, h) = (self.width, self.height);
        let shift = (self.frame as usize) % GRID_STEP;
        let mut frame = Frame::new(w, h);
        let pixels = frame.pixels_mut();
        for y in 0..h {
            let shade = (12 + 28 * y / h) as u8;
            let base = Rgb(shade / 2, shade / 2, shade);
            let on_row = (y + shift) % GRID_STEP == 0;
            for x in 0..w {
                let on_col = (x + shift) % GRID_STEP == 0;
                let c = if on_row || on_col { Rgb(30, 40, 60) } else { base };
                pixels[y * w + x] = c.to_u32();
            }
        }
        self.frame += 1;
        Some(frame)
    }

    fn size(&self) -> (usize, usize) { (self.width, self.height) }
}

// ════════════════════════════════════════════════════════════════════════════
// ImageSequence
// ════════════════════════════════════════════════════════════════════════════

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Stills from a directory, each scaled to the output size.
pub struct ImageSequence {
    paths:  Vec<PathBuf>,
    next:   usize,
    width:  usize,
    height: usize,
}

impl ImageSequence {
    pub fn open(dir: &Path, width: usize, height: usize) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading frame directory {}", dir.display()))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        if paths.is_empty() {
            bail!("no images found in {}", dir.display());
        }
        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), "image sequence opened");
        Ok(Self { paths, next: 0, width: width.max(1), height: height.max(1) })
    }

    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}

impl VideoSource for ImageSequence {
    fn read(&mut self) -> Option<Frame> {
        while let Some(path) = self.paths.get(self.next) {
            self.next += 1;
            match image::open(path) {
                Ok(img) => {
                    let rgb = img.to_rgb8();
                    let rgb = if (rgb.width() as usize, rgb.height() as usize) == (self.width, self.height) {
                        rgb
                    } else {
                        image::imageops::resize(&rgb, self.width as u32, self.height as u32, FilterType::Triangle)
                    };
                    return Some(frame_from_image(&rgb));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable frame"),
            }
        }
        debug!("image sequence exhausted");
        None
    }

    fn size(&self) -> (usize, usize) { (self.width, self.height) }
}

/// Pack an RGB image into a frame.
pub fn frame_from_image(img: &RgbImage) -> Frame {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut frame = Frame::new(w, h);
    for (dst, px) in frame.pixels_mut().iter_mut().zip(img.pixels()) {
        *dst = Rgb(px[0], px[1], px[2]).to_u32();
    }
    frame
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
