//! Stateless per-frame gesture classification.
//!
//! Rules are tried in order and the first match wins; the categories
//! overlap, so the order is part of the contract.
//!
//! | # | Condition | Gesture | Confidence |
//! |---|---|---|---|
//! | 1 | no fingers extended | `Fist` | 0.9 |
//! | 2 | all five extended | `OpenPalm` | 0.9 |
//! | 3 | thumb tip within 0.05 of index tip | `Pinch` | 0.85 |
//! | 4 | only thumb, tip 0.08 above wrist | `ThumbsUp` | 0.85 |
//! | 5 | only index | `Point` | 0.9 |
//! | 5b | thumb + index | `Point` | 0.8 |
//! | 6 | index + middle | `Peace` | 0.85 |
//! | 7 | anything else | `None` | 0.5 |

use std::fmt;

use crate::geometry::{Finger, HandSnapshot};

const PINCH_DISTANCE: f32 = 0.05;
const THUMB_UP_RISE:  f32 = 0.08;

// ════════════════════════════════════════════════════════════════════════════
// GestureType
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureType {
    #[default]
    None,
    Fist,
    OpenPalm,
    Point,
    Pinch,
    ThumbsUp,
    Peace,
}

impl GestureType {
    pub const ALL: [GestureType; 7] = [
        GestureType::None, GestureType::Fist, GestureType::OpenPalm, GestureType::Point,
        GestureType::Pinch, GestureType::ThumbsUp, GestureType::Peace,
    ];

    /// Lowercase name used in trigger keys (`hold_start_fist`).
    pub fn name(self) -> &'static str {
        match self {
            GestureType::None     => "none",
            GestureType::Fist     => "fist",
            GestureType::OpenPalm => "open_palm",
            GestureType::Point    => "point",
            GestureType::Pinch    => "pinch",
            GestureType::ThumbsUp => "thumbs_up",
            GestureType::Peace    => "peace",
        }
    }

    /// Upper-case label for on-screen readouts.
    pub fn label(self) -> &'static str {
        match self {
            GestureType::None     => "NONE",
            GestureType::Fist     => "FIST",
            GestureType::OpenPalm => "OPEN PALM",
            GestureType::Point    => "POINT",
            GestureType::Pinch    => "PINCH",
            GestureType::ThumbsUp => "THUMBS UP",
            GestureType::Peace    => "PEACE",
        }
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureResult
// ════════════════════════════════════════════════════════════════════════════

/// Classification of one hand for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureResult {
    pub gesture:    GestureType,
    pub confidence: f32,
    pub hand:       HandSnapshot,
}

impl GestureResult {
    pub fn new(gesture: GestureType, confidence: f32, hand: HandSnapshot) -> Self {
        Self { gesture, confidence, hand }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureRecognizer
// ════════════════════════════════════════════════════════════════════════════

/// Rule-based classifier over finger states and landmark geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureRecognizer;

impl GestureRecognizer {
    pub fn new() -> Self { Self }

    pub fn classify(&self, hand: &HandSnapshot) -> GestureResult {
        let (gesture, confidence) = Self::rule(hand);
        GestureResult::new(gesture, confidence, hand.clone())
    }

    fn rule(hand: &HandSnapshot) -> (GestureType, f32) {
        let ext = hand.fingers();
        let n   = ext.count();

        if n == 0 { return (GestureType::Fist, 0.9); }
        if n == 5 { return (GestureType::OpenPalm, 0.9); }

        if hand.thumb_tip().distance_to(&hand.index_tip()) < PINCH_DISTANCE {
            return (GestureType::Pinch, 0.85);
        }

        if ext.exactly(&[Finger::Thumb]) && hand.wrist().y - hand.thumb_tip().y > THUMB_UP_RISE {
            return (GestureType::ThumbsUp, 0.85);
        }

        if ext.exactly(&[Finger::Index]) {
            return (GestureType::Point, 0.9);
        }
        if ext.exactly(&[Finger::Index, Finger::Thumb]) {
            return (GestureType::Point, 0.8);
        }
        if ext.exactly(&[Finger::Index, Finger::Middle]) {
            return (GestureType::Peace, 0.85);
        }

        (GestureType::None, 0.5)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::{self, hand};
    use crate::geometry::{FingerStates, Handedness, Point, THUMB_TIP, WRIST};

    fn classify(hand: HandSnapshot) -> GestureResult {
        GestureRecognizer::new().classify(&hand)
    }

    fn with(fingers: &[Finger], lm: [Point; 21]) -> HandSnapshot {
        HandSnapshot::with_fingers(lm, Handedness::Right, 0.9, FingerStates::from_extended(fingers))
    }

    #[test]
    fn no_fingers_is_fist() {
        let r = classify(hand(fixtures::fist()));
        assert_eq!(r.gesture, GestureType::Fist);
        assert_eq!(r.confidence, 0.9);
    }

    #[test]
    fn all_fingers_is_open_palm() {
        let r = classify(hand(fixtures::open_palm()));
        assert_eq!(r.gesture, GestureType::OpenPalm);
    }

    #[test]
    fn point_from_geometry() {
        let r = classify(hand(fixtures::point()));
        assert_eq!(r.gesture, GestureType::Point);
        assert_eq!(r.confidence, 0.9);
    }

    #[test]
    fn pinch_beats_point_variant() {
        let mut lm = fixtures::open_palm();
        lm[THUMB_TIP] = Point::new(0.44, 0.33);
        let r = classify(with(&[Finger::Thumb, Finger::Index], lm));
        assert_eq!(r.gesture, GestureType::Pinch);
        assert_eq!(r.confidence, 0.85);
    }

    #[test]
    fn thumbs_up_requires_orientation() {
        let mut lm = fixtures::fist();
        lm[WRIST]     = Point::new(0.5, 0.8);
        lm[THUMB_TIP] = Point::new(0.40, 0.6);
        assert_eq!(classify(with(&[Finger::Thumb], lm)).gesture, GestureType::ThumbsUp);

        lm[THUMB_TIP] = Point::new(0.35, 0.78);
        assert_eq!(classify(with(&[Finger::Thumb], lm)).gesture, GestureType::None);
    }

    #[test]
    fn natural_point_variant() {
        let lm = fixtures::open_palm();
        let r = classify(with(&[Finger::Thumb, Finger::Index], lm));
        assert_eq!(r.gesture, GestureType::Point);
        assert_eq!(r.confidence, 0.8);
    }

    #[test]
    fn peace() {
        let lm = fixtures::open_palm();
        let r = classify(with(&[Finger::Index, Finger::Middle], lm));
        assert_eq!(r.gesture, GestureType::Peace);
    }

    #[test]
    fn unmatched_is_none() {
        let lm = fixtures::open_palm();
        let r = classify(with(&[Finger::Ring, Finger::Pinky, Finger::Middle], lm));
        assert_eq!(r.gesture, GestureType::None);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn names_are_lowercase() {
        for g in GestureType::ALL {
            assert_eq!(g.name(), g.name().to_lowercase());
        }
        assert_eq!(GestureType::OpenPalm.to_string(), "open_palm");
    }
}
