//! Screenshots and frame-by-frame session recording, as PNG files.
//!
//! ```text
//!  <output_dir>/screenshot_20260101_120000_250.png
//!  <output_dir>/screenshot_20260101_120000_250_1.png   (same millisecond)
//!  <output_dir>/session_20260101_120000_250/frame_000001.png ...
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use image::RgbImage;
use particle_fx::{Frame, Rgb};
use tracing::{debug, info};

/// Unpack a frame into an RGB image.
pub fn frame_to_image(frame: &Frame) -> RgbImage {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let mut img = RgbImage::new(w, h);
    for (px, &p) in img.pixels_mut().zip(frame.pixels()) {
        let Rgb(r, g, b) = Rgb::from_u32(p);
        *px = image::Rgb([r, g, b]);
    }
    img
}

pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    frame_to_image(frame)
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// `dir/<stem><ext>`, or the first free `dir/<stem>_<n><ext>`.
fn unused_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let mut path = dir.join(format!("{}{}", stem, ext));
    let mut n = 0u32;
    while path.exists() {
        n += 1;
        path = dir.join(format!("{}_{}{}", stem, n, ext));
    }
    path
}

/// Save `frame` as `screenshot_<timestamp>.png` inside `dir`.  Never
/// overwrites an earlier screenshot.
pub fn take_screenshot(frame: &Frame, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    let path = unused_path(dir, &format!("screenshot_{}", timestamp()), ".png");
    save_png(frame, &path)?;
    info!(path = %path.display(), "screenshot saved");
    Ok(path)
}

// ════════════════════════════════════════════════════════════════════════════
// SessionRecorder
// ════════════════════════════════════════════════════════════════════════════

/// Writes numbered frames into one directory.
#[derive(Debug)]
pub struct SessionRecorder {
    dir:    PathBuf,
    frames: u64,
}

impl SessionRecorder {
    /// Record into a fresh `session_<timestamp>` directory under `root`.
    pub fn start(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("creating {}", root.display()))?;
        Self::into_dir(unused_path(root, &format!("session_{}", timestamp()), ""))
    }

    /// Record straight into `dir`.
    pub fn into_dir(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        info!(dir = %dir.display(), "recording session");
        Ok(Self { dir, frames: 0 })
    }

    pub fn dir(&self)    -> &Path { &self.dir }
    pub fn frames(&self) -> u64   { self.frames }

    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        self.frames += 1;
        let path = self.dir.join(format!("frame_{:06}.png", self.frames));
        save_png(frame, &path)?;
        if self.frames % 100 == 0 {
            debug!(frames = self.frames, "recording progress");
        }
        Ok(())
    }

    /// Log the total and hand back the directory.
    pub fn finish(self) -> PathBuf {
        info!(dir = %self.dir.display(), frames = self.frames, "recording saved");
        self.dir
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::frame_from_image;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spellcaster_{}_{}", name, std::process::id()))
    }

    #[test]
    fn image_conversion_preserves_pixels() {
        let mut f = Frame::new(3, 2);
        f.set_pixel(2, 1, Rgb(10, 20, 30));
        let img = frame_to_image(&f);
        assert_eq!(img.get_pixel(2, 1), &image::Rgb([10, 20, 30]));
        assert_eq!(frame_from_image(&img), f);
    }

    #[test]
    fn screenshot_is_timestamped_png() {
        let dir = scratch("shots");
        let f = Frame::filled(4, 4, Rgb(1, 2, 3));
        let path = take_screenshot(&f, &dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("screenshot_") && name.ends_with(".png"));
        assert_eq!(name.len(), "screenshot_20260101_120000_000.png".len());
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.get_pixel(0, 0), &image::Rgb([1, 2, 3]));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn back_to_back_screenshots_never_overwrite() {
        let dir = scratch("burst");
        let f = Frame::new(2, 2);
        let shots: Vec<PathBuf> = (0..5).map(|_| take_screenshot(&f, &dir).unwrap()).collect();
        for (i, a) in shots.iter().enumerate() {
            assert!(a.exists());
            assert!(shots[i + 1..].iter().all(|b| b != a));
        }
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn taken_name_gets_counter_suffix() {
        let dir = scratch("suffix");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shot.png"), b"x").unwrap();
        std::fs::write(dir.join("shot_1.png"), b"x").unwrap();
        assert_eq!(unused_path(&dir, "shot", ".png"), dir.join("shot_2.png"));
        assert_eq!(unused_path(&dir, "other", ".png"), dir.join("other.png"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sessions_started_together_get_separate_dirs() {
        let root = scratch("sessions");
        let a = SessionRecorder::start(&root).unwrap().finish();
        let b = SessionRecorder::start(&root).unwrap().finish();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn session_numbers_frames() {
        let root = scratch("session");
        let mut rec = SessionRecorder::start(&root).unwrap();
        let f = Frame::new(2, 2);
        rec.write(&f).unwrap();
        rec.write(&f).unwrap();
        assert_eq!(rec.frames(), 2);
        let dir = rec.finish();
        assert!(dir.join("frame_000001.png").exists());
        assert!(dir.join("frame_000002.png").exists());
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("session_"));
        std::fs::remove_dir_all(&root).ok();
    }
}
