//! Normalised 2-D hand geometry.
//!
//! Every coordinate lives in `[0, 1]` relative to the frame, with `y`
//! growing downward.  A hand is 21 landmarks in the fixed anatomical order
//! used by common pose-estimation models:
//!
//! | Index | Joint |
//! |---|---|
//! | 0 | wrist |
//! | 1–4 | thumb CMC, MCP, IP, tip |
//! | 5–8 | index MCP, PIP, DIP, tip |
//! | 9–12 | middle MCP, PIP, DIP, tip |
//! | 13–16 | ring MCP, PIP, DIP, tip |
//! | 17–20 | pinky MCP, PIP, DIP, tip |

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Bone pairs for drawing a hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP), (WRIST, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A normalised 2-D position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self { Self { x, y } }

    /// Euclidean distance in normalised units.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Project onto a `width × height` pixel grid.
    pub fn pixel(&self, width: usize, height: usize) -> (i32, i32) {
        ((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fingers
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    pub fn tip(self) -> usize {
        match self {
            Finger::Thumb  => THUMB_TIP,
            Finger::Index  => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring   => RING_TIP,
            Finger::Pinky  => PINKY_TIP,
        }
    }

    /// Proximal joint used for the extension test (IP for the thumb).
    pub fn pip(self) -> usize {
        match self {
            Finger::Thumb  => THUMB_IP,
            Finger::Index  => INDEX_PIP,
            Finger::Middle => MIDDLE_PIP,
            Finger::Ring   => RING_PIP,
            Finger::Pinky  => PINKY_PIP,
        }
    }

    fn slot(self) -> usize { self as usize }
}

/// Extended/flexed flag per finger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerStates([bool; 5]);

impl FingerStates {
    pub const NONE: FingerStates = FingerStates([false; 5]);
    pub const ALL:  FingerStates = FingerStates([true; 5]);

    /// Build from a list of the fingers that are extended.
    pub fn from_extended(fingers: &[Finger]) -> Self {
        let mut s = Self::NONE;
        for &f in fingers { s.set(f, true); }
        s
    }

    pub fn is_extended(&self, finger: Finger) -> bool { self.0[finger.slot()] }

    pub fn set(&mut self, finger: Finger, extended: bool) { self.0[finger.slot()] = extended; }

    pub fn count(&self) -> usize { self.0.iter().filter(|&&e| e).count() }

    /// True when exactly the listed fingers are extended and no others.
    pub fn exactly(&self, fingers: &[Finger]) -> bool {
        *self == Self::from_extended(fingers)
    }
}

/// Classify each finger as extended or flexed from landmark geometry.
///
/// Thumb: tip is more than 1.1× as far from the wrist as the IP joint.
/// Others: tip is above (smaller `y` than) the PIP joint.
pub fn compute_finger_states(landmarks: &[Point; LANDMARK_COUNT]) -> FingerStates {
    let wrist = landmarks[WRIST];
    let mut states = FingerStates::NONE;

    let tip_dist = landmarks[THUMB_TIP].distance_to(&wrist);
    let ip_dist  = landmarks[THUMB_IP].distance_to(&wrist);
    states.set(Finger::Thumb, tip_dist > ip_dist * 1.1);

    for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
        states.set(finger, landmarks[finger.tip()].y < landmarks[finger.pip()].y);
    }
    states
}

// ════════════════════════════════════════════════════════════════════════════
// HandSnapshot
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// One detected hand for one frame.  Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct HandSnapshot {
    landmarks:  [Point; LANDMARK_COUNT],
    handedness: Handedness,
    confidence: f32,
    fingers:    FingerStates,
}

impl HandSnapshot {
    /// Build a snapshot, deriving finger states from the landmarks.
    pub fn new(landmarks: [Point; LANDMARK_COUNT], handedness: Handedness, confidence: f32) -> Self {
        let fingers = compute_finger_states(&landmarks);
        Self { landmarks, handedness, confidence, fingers }
    }

    /// Build a snapshot with finger states supplied by the pose backend.
    pub fn with_fingers(
        landmarks:  [Point; LANDMARK_COUNT],
        handedness: Handedness,
        confidence: f32,
        fingers:    FingerStates,
    ) -> Self {
        Self { landmarks, handedness, confidence, fingers }
    }

    pub fn landmarks(&self) -> &[Point; LANDMARK_COUNT] { &self.landmarks }
    pub fn landmark(&self, index: usize) -> Point { self.landmarks[index] }
    pub fn handedness(&self) -> Handedness { self.handedness }
    pub fn confidence(&self) -> f32 { self.confidence }
    pub fn fingers(&self) -> FingerStates { self.fingers }

    pub fn wrist(&self)      -> Point { self.landmarks[WRIST] }
    pub fn thumb_tip(&self)  -> Point { self.landmarks[THUMB_TIP] }
    pub fn index_tip(&self)  -> Point { self.landmarks[INDEX_TIP] }
    pub fn middle_tip(&self) -> Point { self.landmarks[MIDDLE_TIP] }

    /// Palm centre: mean of the four finger MCP joints.
    pub fn center(&self) -> Point {
        let mcps = [INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
        let (sx, sy) = mcps.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + self.landmarks[i].x, sy + self.landmarks[i].y)
        });
        Point::new(sx / 4.0, sy / 4.0)
    }

    pub fn num_extended(&self) -> usize { self.fingers.count() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn base() -> [Point; LANDMARK_COUNT] {
        let mut lm = [Point::new(0.5, 0.7); LANDMARK_COUNT];
        lm[WRIST] = Point::new(0.5, 0.8);
        lm
    }

    pub fn open_palm() -> [Point; LANDMARK_COUNT] {
        let mut lm = base();
        let pts = [
            (0.42, 0.72), (0.38, 0.65), (0.35, 0.58), (0.32, 0.50),
            (0.44, 0.62), (0.44, 0.52), (0.44, 0.42), (0.44, 0.32),
            (0.50, 0.60), (0.50, 0.50), (0.50, 0.40), (0.50, 0.30),
            (0.56, 0.62), (0.56, 0.52), (0.56, 0.42), (0.56, 0.32),
            (0.62, 0.65), (0.62, 0.55), (0.62, 0.45), (0.62, 0.35),
        ];
        for (i, &(x, y)) in pts.iter().enumerate() { lm[i + 1] = Point::new(x, y); }
        lm
    }

    pub fn fist() -> [Point; LANDMARK_COUNT] {
        let mut lm = base();
        let pts = [
            (0.45, 0.75), (0.42, 0.72), (0.43, 0.73), (0.44, 0.74),
            (0.44, 0.65), (0.44, 0.55), (0.44, 0.60), (0.44, 0.65),
            (0.50, 0.63), (0.50, 0.53), (0.50, 0.58), (0.50, 0.63),
            (0.56, 0.65), (0.56, 0.55), (0.56, 0.60), (0.56, 0.65),
            (0.62, 0.67), (0.62, 0.57), (0.62, 0.62), (0.62, 0.67),
        ];
        for (i, &(x, y)) in pts.iter().enumerate() { lm[i + 1] = Point::new(x, y); }
        lm
    }

    pub fn point() -> [Point; LANDMARK_COUNT] {
        let mut lm = fist();
        lm[INDEX_MCP] = Point::new(0.44, 0.62);
        lm[INDEX_PIP] = Point::new(0.44, 0.52);
        lm[INDEX_DIP] = Point::new(0.44, 0.42);
        lm[INDEX_TIP] = Point::new(0.44, 0.32);
        lm
    }

    pub fn hand(landmarks: [Point; LANDMARK_COUNT]) -> HandSnapshot {
        HandSnapshot::new(landmarks, Handedness::Right, 0.95)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn point_pixel_projection() {
        assert_eq!(Point::new(0.5, 0.25).pixel(640, 480), (320, 120));
    }

    #[test]
    fn open_palm_all_extended() {
        let s = compute_finger_states(&open_palm());
        assert_eq!(s, FingerStates::ALL);
        assert_eq!(s.count(), 5);
    }

    #[test]
    fn fist_none_extended() {
        assert_eq!(compute_finger_states(&fist()).count(), 0);
    }

    #[test]
    fn point_only_index() {
        let s = compute_finger_states(&point());
        assert!(s.exactly(&[Finger::Index]));
    }

    #[test]
    fn palm_center_is_mcp_mean() {
        let h = hand(open_palm());
        let c = h.center();
        assert!((c.x - 0.53).abs() < 1e-5);
        assert!((c.y - 0.6225).abs() < 1e-5);
    }

    #[test]
    fn with_fingers_overrides_geometry() {
        let h = HandSnapshot::with_fingers(
            fist(), Handedness::Left, 0.8, FingerStates::from_extended(&[Finger::Pinky]),
        );
        assert_eq!(h.num_extended(), 1);
        assert!(h.fingers().is_extended(Finger::Pinky));
        assert_eq!(h.handedness().label(), "Left");
    }
}
