//! # gesture_core
//!
//! Hand geometry, per-frame gesture classification and the gesture state
//! machine that turns a stream of classifications into discrete events.
//!
//! ```text
//!  HandSnapshot ──► GestureRecognizer::classify ──► GestureResult
//!                                                        │
//!                               GestureTracker::update ◄─┘
//!                                        │
//!                                        ▼
//!                      GestureState { current_gesture, event, … }
//! ```
//!
//! The crate is pure computation: no I/O, no threads, no clocks other than
//! the `Instant` the caller hands to [`GestureTracker::update_at`].

pub mod geometry;
pub mod recognizer;
pub mod tracker;

pub use geometry::{compute_finger_states, Finger, FingerStates, HandSnapshot, Handedness, Point};
pub use recognizer::{GestureRecognizer, GestureResult, GestureType};
pub use tracker::{GestureConfig, GestureEvent, GestureState, GestureTracker};
