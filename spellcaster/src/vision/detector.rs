//! Object-detection collaborator.
//!
//! Detection is expensive, so [`FrameSkippingDetector`] runs its backend on
//! every Nth frame and hands back the previous result in between.  Callers
//! must treat every result as possibly stale.

use anyhow::Result;
use particle_fx::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::collab::Collaborator;

/// One bounding box in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x1:         i32,
    pub y1:         i32,
    pub x2:         i32,
    pub y2:         i32,
    pub confidence: f32,
    pub class_id:   u32,
    pub label:      String,
}

impl Detection {
    pub fn center(&self) -> (i32, i32) { ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2) }
    pub fn width(&self)  -> i32 { self.x2 - self.x1 }
    pub fn height(&self) -> i32 { self.y2 - self.y1 }
}

/// A detector backend.  Errors are absorbed by [`FrameSkippingDetector`].
pub trait DetectionSource: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSkippingDetector
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameSkippingDetector {
    backend:        Collaborator<Box<dyn DetectionSource>>,
    every_n:        u64,
    min_confidence: f32,
    counter:        u64,
    cache:          Vec<Detection>,
    failing:        bool,
}

impl FrameSkippingDetector {
    pub fn new(backend: Collaborator<Box<dyn DetectionSource>>, every_n: u64, min_confidence: f32) -> Self {
        Self {
            backend,
            every_n: every_n.max(1),
            min_confidence,
            counter: 0,
            cache:   Vec::new(),
            failing: false,
        }
    }

    /// Detector that never finds anything.
    pub fn disabled() -> Self {
        Self::new(Collaborator::disabled("detector"), 1, 0.0)
    }

    pub fn cached(&self) -> &[Detection] { &self.cache }

    pub fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        self.counter += 1;
        if self.counter % self.every_n != 0 {
            return self.cache.clone();
        }
        let Some(backend) = self.backend.get() else {
            return Vec::new();
        };
        match backend.detect(frame) {
            Ok(mut found) => {
                if self.failing {
                    debug!("detector recovered");
                    self.failing = false;
                }
                found.retain(|d| d.confidence >= self.min_confidence);
                self.cache = found;
                self.cache.clone()
            }
            Err(e) => {
                if !self.failing {
                    warn!(error = %e, "detection failed, reusing last result");
                    self.failing = true;
                }
                self.cache.clone()
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedDetector
// ════════════════════════════════════════════════════════════════════════════

const LABELS: [(&str, u32); 5] = [("person", 0), ("cup", 41), ("laptop", 63), ("chair", 56), ("book", 73)];

#[derive(Clone, Debug)]
struct Drifter {
    x:     f32,
    y:     f32,
    vx:    f32,
    vy:    f32,
    w:     f32,
    h:     f32,
    conf:  f32,
    class: usize,
}

/// A handful of labelled boxes drifting around and bouncing off the edges.
pub struct SimulatedDetector {
    objects: Vec<Drifter>,
    rng:     StdRng,
}

impl SimulatedDetector {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let objects = (0..count)
            .map(|i| Drifter {
                x:     rng.gen_range(0.1..0.7),
                y:     rng.gen_range(0.15..0.6),
                vx:    rng.gen_range(-0.004..0.004),
                vy:    rng.gen_range(-0.003..0.003),
                w:     rng.gen_range(0.12..0.25),
                h:     rng.gen_range(0.15..0.3),
                conf:  rng.gen_range(0.55..0.98),
                class: i % LABELS.len(),
            })
            .collect();
        Self { objects, rng }
    }
}

impl DetectionSource for SimulatedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (fw, fh) = (frame.width() as f32, frame.height() as f32);
        let mut out = Vec::with_capacity(self.objects.len());
        for o in &mut self.objects {
            o.x += o.vx;
            o.y += o.vy;
            if o.x < 0.0 || o.x + o.w > 1.0 { o.vx = -o.vx; o.x = o.x.clamp(0.0, 1.0 - o.w); }
            if o.y < 0.0 || o.y + o.h > 1.0 { o.vy = -o.vy; o.y = o.y.clamp(0.0, 1.0 - o.h); }
            o.conf = (o.conf + self.rng.gen_range(-0.02..0.02)).clamp(0.3, 0.99);

            let (label, class_id) = LABELS[o.class];
            out.push(Detection {
                x1: (o.x * fw) as i32,
                y1: (o.y * fh) as i32,
                x2: ((o.x + o.w) * fw) as i32,
                y2: ((o.y + o.h) * fh) as i32,
                confidence: o.conf,
                class_id,
                label: label.to_string(),
            });
        }
        Ok(out)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
