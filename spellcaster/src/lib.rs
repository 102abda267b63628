//! # spellcaster
//!
//! Augmented-reality spell caster.  Hand gestures read from a video stream
//! cast particle spells and drive a heads-up display, both composited back
//! onto the stream every frame.
//!
//! ## Gesture → spell mapping
//!
//! | Gesture | Spell |
//! |---|---|
//! | Hold fist | Shield (dropped again when the fist opens) |
//! | Hold open palm / tap open palm | Force push |
//! | Hold point | Lightning |
//! | Hold pinch | Teleport |
//! | Swipe left / right | Wind |
//! | Swipe up | Fireball |
//! | Hold thumbs up | Screenshot |
//!
//! In the HUD a horizontal swipe cycles COMBAT → SCAN → NAV.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |---|---|
//! | [`spells`] | spell bodies, lifecycle, mana, cooldowns and the trigger registry |
//! | [`hud`] | widget registry, mode menu and the stock widgets |
//! | [`vision`] | frame sources, simulated hands, object detection |
//! | [`engine`] | the per-frame tick |
//! | [`overlay`] | HUD blend, skeleton, mana bar, spell banner |
//! | [`config`] | TOML settings |
//! | [`recording`] | screenshots and PNG session recording |
//! | [`visualizer`] | the output window |

pub mod collab;
pub mod config;
pub mod engine;
pub mod hud;
pub mod overlay;
pub mod recording;
pub mod spells;
pub mod vision;
pub mod visualizer;

pub use config::Settings;
pub use engine::{AppMode, Engine};
