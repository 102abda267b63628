//! Pose collaborator.
//!
//! No pose model ships with the crate; [`SimulatedHands`] builds
//! anatomically plausible 21-landmark hands instead, so the real recognizer
//! and tracker run end-to-end.  It is steered either live, through a
//! [`HandInput`] channel fed by the window's mouse and keyboard, or by a
//! built-in script that cycles through every pose.

use std::f32::consts::TAU;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use gesture_core::geometry::*;
use gesture_core::{GestureType, HandSnapshot, Handedness, Point};
use particle_fx::Frame;

/// Anything that finds hands in a frame.  May return an empty list.
pub trait PoseSource: Send {
    fn detect(&mut self, frame: &Frame) -> Vec<HandSnapshot>;
}

// ════════════════════════════════════════════════════════════════════════════
// HandInput: sent from the window to the simulator
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HandInput {
    /// Palm centre moved (normalised).
    Move(Point),
    Pose(GestureType),
    /// Hand left the view.
    Hide,
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark synthesis
// ════════════════════════════════════════════════════════════════════════════

/// MCP x offsets from the palm centre: index, middle, ring, pinky.
const MCP_X: [f32; 4] = [-0.09, -0.03, 0.03, 0.09];
const WRIST_DY: f32 = 0.18;

/// Landmarks for `pose` with the palm centre at `at`.
pub fn hand_for(pose: GestureType, at: Point) -> [Point; LANDMARK_COUNT] {
    use gesture_core::Finger::*;
    let extended: &[gesture_core::Finger] = match pose {
        GestureType::OpenPalm => &[Thumb, Index, Middle, Ring, Pinky],
        GestureType::Fist     => &[],
        GestureType::Point    => &[Index],
        GestureType::Peace    => &[Index, Middle],
        GestureType::ThumbsUp => &[Thumb],
        GestureType::Pinch    => &[Thumb, Index],
        GestureType::None     => &[Index, Middle, Ring],
    };
    let up = |f| extended.contains(&f);

    let mut lm = [Point::new(0.0, 0.0); LANDMARK_COUNT];
    let mut put = |i: usize, dx: f32, dy: f32| lm[i] = Point::new(at.x + dx, at.y + dy);

    put(WRIST, 0.0, WRIST_DY);
    put(THUMB_CMC, -0.08, 0.12);
    put(THUMB_MCP, -0.12, 0.08);
    put(THUMB_IP, -0.15, 0.03);
    let thumb_tip = match pose {
        GestureType::Pinch    => (MCP_X[0] + 0.01, -0.11),
        GestureType::ThumbsUp => (-0.14, -0.08),
        _ if up(Thumb)        => (-0.19, -0.02),
        _                     => (-0.07, 0.06),
    };
    put(THUMB_TIP, thumb_tip.0, thumb_tip.1);

    let chains = [
        (Index,  [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP]),
        (Middle, [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP]),
        (Ring,   [RING_MCP, RING_PIP, RING_DIP, RING_TIP]),
        (Pinky,  [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP]),
    ];
    for (slot, (finger, [mcp, pip, dip, tip])) in chains.into_iter().enumerate() {
        let x = MCP_X[slot];
        put(mcp, x, 0.0);
        put(pip, x, -0.04);
        if up(finger) {
            put(dip, x, -0.08);
            put(tip, x, -0.12);
        } else {
            put(dip, x, -0.01);
            put(tip, x, 0.02);
        }
    }
    lm
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedHands
// ════════════════════════════════════════════════════════════════════════════

/// Frames each pose is held for in scripted mode.
const SCRIPT_HOLD: u64 = 45;
const SCRIPT_POSES: [GestureType; 6] = [
    GestureType::OpenPalm, GestureType::Fist, GestureType::Point,
    GestureType::Pinch, GestureType::Peace, GestureType::OpenPalm,
];

enum Driver {
    Live(Receiver<HandInput>),
    Script { frame: u64 },
}

pub struct SimulatedHands {
    driver:     Driver,
    pointer:    Option<Point>,
    pose:       GestureType,
    handedness: Handedness,
}

impl SimulatedHands {
    /// A simulator steered over the returned channel.
    pub fn live() -> (Self, Sender<HandInput>) {
        let (tx, rx) = mpsc::channel();
        let sim = Self {
            driver:     Driver::Live(rx),
            pointer:    None,
            pose:       GestureType::OpenPalm,
            handedness: Handedness::Right,
        };
        (sim, tx)
    }

    /// A simulator that circles the frame cycling through poses.
    pub fn scripted() -> Self {
        Self {
            driver:     Driver::Script { frame: 0 },
            pointer:    None,
            pose:       GestureType::OpenPalm,
            handedness: Handedness::Right,
        }
    }

    pub fn pointer(&self) -> Option<Point> { self.pointer }
    pub fn pose(&self)    -> GestureType   { self.pose }

    fn apply(&mut self, input: HandInput) {
        match input {
            HandInput::Move(p) => self.pointer = Some(p),
            HandInput::Pose(g) => self.pose = g,
            HandInput::Hide    => self.pointer = None,
        }
    }

    fn advance(&mut self) {
        match &mut self.driver {
            Driver::Live(rx) => {
                let mut pending = Vec::new();
                loop {
                    match rx.try_recv() {
                        Ok(input) => pending.push(input),
                        Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                    }
                }
                for input in pending {
                    self.apply(input);
                }
            }
            Driver::Script { frame } => {
                let t = *frame as f32 / 240.0;
                let step = (*frame / SCRIPT_HOLD) as usize % SCRIPT_POSES.len();
                *frame += 1;
                self.pose = SCRIPT_POSES[step];
                self.pointer = Some(Point::new(0.5 + 0.2 * (t * TAU).cos(), 0.5 + 0.15 * (t * TAU).sin()));
            }
        }
    }
}

impl PoseSource for SimulatedHands {
    fn detect(&mut self, _frame: &Frame) -> Vec<HandSnapshot> {
        self.advance();
        match self.pointer {
            Some(at) => vec![HandSnapshot::new(hand_for(self.pose, at), self.handedness, 0.95)],
            None => Vec::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::GestureRecognizer;

    #[test]
    fn every_pose_classifies_as_itself() {
        let rec = GestureRecognizer::new();
        for pose in GestureType::ALL {
            for at in [Point::new(0.5, 0.5), Point::new(0.3, 0.7)] {
                let hand = HandSnapshot::new(hand_for(pose, at), Handedness::Right, 0.9);
                assert_eq!(rec.classify(&hand).gesture, pose, "{:?} at {}", pose, at);
            }
        }
    }

    #[test]
    fn palm_centre_is_the_pointer() {
        let hand = HandSnapshot::new(hand_for(GestureType::Fist, Point::new(0.4, 0.6)), Handedness::Right, 0.9);
        let c = hand.center();
        assert!((c.x - 0.4).abs() < 1e-5 && (c.y - 0.6).abs() < 1e-5);
    }

    #[test]
    fn live_input_moves_and_hides_the_hand() {
        let (mut sim, tx) = SimulatedHands::live();
        let frame = Frame::new(4, 4);
        assert!(sim.detect(&frame).is_empty());

        tx.send(HandInput::Move(Point::new(0.5, 0.5))).unwrap();
        tx.send(HandInput::Pose(GestureType::Point)).unwrap();
        let hands = sim.detect(&frame);
        assert_eq!(hands.len(), 1);
        assert_eq!(sim.pose(), GestureType::Point);

        tx.send(HandInput::Hide).unwrap();
        assert!(sim.detect(&frame).is_empty());
    }

    #[test]
    fn script_cycles_poses() {
        let mut sim = SimulatedHands::scripted();
        let frame = Frame::new(4, 4);
        sim.detect(&frame);
        assert_eq!(sim.pose(), GestureType::OpenPalm);
        for _ in 0..SCRIPT_HOLD {
            sim.detect(&frame);
        }
        assert_eq!(sim.pose(), GestureType::Fist);
        assert!(sim.pointer().is_some());
    }
}
