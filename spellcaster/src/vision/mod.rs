//! External vision collaborators: where frames, hands and objects come from.
//!
//! ```text
//!  VideoSource ──Frame──▶ PoseSource ──Vec<HandSnapshot>──▶ recognizer
//!                  │
//!                  └────▶ FrameSkippingDetector ──Vec<Detection>──▶ HUD
//! ```
//!
//! Every collaborator may come back empty; none of them can fail the frame
//! loop.

pub mod camera;
pub mod detector;
pub mod hands;

pub use camera::{frame_from_image, ImageSequence, SyntheticCamera, VideoSource};
pub use detector::{Detection, DetectionSource, FrameSkippingDetector, SimulatedDetector};
pub use hands::{hand_for, HandInput, PoseSource, SimulatedHands};
