//! # particle_fx
//!
//! Everything that paints pixels without knowing about gestures or spells:
//!
//! | Module | Contents |
//! |---|---|
//! | [`raster`] | [`Frame`] (packed `0x00RRGGBB`), [`Rgb`], clipped drawing primitives, 3×5 bitmap font |
//! | [`particle`] | [`Particle`] physics and the capped [`ParticleEngine`] |
//! | [`emitter`] | burst / stream / ring / trail particle factories |
//! | [`screen`] | decaying shake, flash and chromatic-aberration overlays |
//! | [`post`] | glow, scanline and holographic-flicker passes |
//!
//! The engine never grows past its cap: `emit` admits what fits and drops
//! the rest, reporting how many were taken.

pub mod emitter;
pub mod particle;
pub mod post;
pub mod raster;
pub mod screen;

pub use emitter::{BurstEmitter, Emitter, RingEmitter, StreamEmitter, TrailEmitter};
pub use particle::{Particle, ParticleEngine, Shape};
pub use post::{apply_glow, EffectsPipeline, GlowEffect, HolographicFlicker, ScanlineEffect};
pub use raster::{add_rgb, blend_rgb, text_width, Frame, Rgb};
pub use screen::{ChromaticAberration, ScreenEffects, ScreenFlash, ScreenShake};
