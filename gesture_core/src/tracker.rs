//! Gesture state machine: debounce, tap, hold and swipe detection.
//!
//! The tracker is fed one [`GestureResult`] (or nothing, when no hand is
//! visible) per frame and answers with a fresh [`GestureState`] carrying at
//! most one [`GestureEvent`].
//!
//! ## Event precedence
//!
//! | Source | When | Wins over |
//! |---|---|---|
//! | swipe | hand centre moved > threshold within 0.1–0.5 s | everything |
//! | hold-end / tap | confirmed gesture *ends* (change or hand loss) | hold-start |
//! | hold-start | stable gesture held for `hold_duration` | nothing |

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use tracing::{debug, trace};

use crate::geometry::Point;
use crate::recognizer::{GestureResult, GestureType};

/// Position samples kept for swipe detection.
const HISTORY_LEN: usize = 30;
/// Minimum samples before a swipe is considered.
const SWIPE_MIN_SAMPLES: usize = 5;
/// Accepted time span (seconds) between oldest and newest sample.
const SWIPE_MIN_SPAN: f32 = 0.1;
const SWIPE_MAX_SPAN: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// A momentary event derived from continuous classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureEvent {
    #[default]
    None,
    Tap,
    HoldStart,
    HoldEnd,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
}

impl GestureEvent {
    /// Base of the spell trigger key, or `None` for events that never trigger.
    pub fn trigger_name(self) -> Option<&'static str> {
        match self {
            GestureEvent::None       => None,
            GestureEvent::Tap        => Some("tap"),
            GestureEvent::HoldStart  => Some("hold_start"),
            GestureEvent::HoldEnd    => Some("hold_end"),
            GestureEvent::SwipeLeft  => Some("swipe_left"),
            GestureEvent::SwipeRight => Some("swipe_right"),
            GestureEvent::SwipeUp    => Some("swipe_up"),
            GestureEvent::SwipeDown  => Some("swipe_down"),
        }
    }

    pub fn is_swipe(self) -> bool {
        matches!(
            self,
            GestureEvent::SwipeLeft | GestureEvent::SwipeRight
                | GestureEvent::SwipeUp | GestureEvent::SwipeDown
        )
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.trigger_name().unwrap_or("none"))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState / GestureConfig
// ════════════════════════════════════════════════════════════════════════════

/// The tracker's belief after one update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureState {
    pub current_gesture: GestureType,
    pub event:           GestureEvent,
    pub gesture_start:   Option<Instant>,
    pub is_holding:      bool,
    pub hand_center:     Option<Point>,
    pub index_tip:       Option<Point>,
}

/// Thresholds for the state machine.  Durations are in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Normalised displacement a swipe must exceed.
    pub swipe_threshold:  f32,
    pub hold_duration:    f32,
    pub tap_max_duration: f32,
    /// Consecutive frames a new gesture must persist before it is confirmed.
    pub debounce_frames:  u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold:  0.08,
            hold_duration:    0.5,
            tap_max_duration: 0.3,
            debounce_frames:  5,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTracker
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureTracker {
    config:           GestureConfig,
    current:          GestureType,
    gesture_start:    Option<Instant>,
    is_holding:       bool,
    debounce_counter: u32,
    pending:          GestureType,
    history:          VecDeque<(Point, Instant)>,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            current:          GestureType::None,
            gesture_start:    None,
            is_holding:       false,
            debounce_counter: 0,
            pending:          GestureType::None,
            history:          VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn config(&self) -> &GestureConfig { &self.config }

    /// Advance using the wall clock.
    pub fn update(&mut self, result: Option<&GestureResult>) -> GestureState {
        self.update_at(result, Instant::now())
    }

    /// Advance with an explicit timestamp (monotonic, sampled once per frame).
    pub fn update_at(&mut self, result: Option<&GestureResult>, now: Instant) -> GestureState {
        let Some(result) = result else {
            return self.hand_lost(now);
        };

        let mut event = GestureEvent::None;
        let center = result.hand.center();

        // ── swipe ─────────────────────────────────────────────────────────
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back((center, now));

        let swipe = self.detect_swipe();
        if swipe != GestureEvent::None {
            debug!(%swipe, "swipe detected");
            event = swipe;
            self.history.clear();
        }

        // ── debounce ──────────────────────────────────────────────────────
        if result.gesture != self.current {
            if result.gesture == self.pending {
                self.debounce_counter += 1;
            } else {
                self.pending = result.gesture;
                self.debounce_counter = 1;
            }

            if self.debounce_counter >= self.config.debounce_frames {
                let ending = self.ending_event(now);
                if event == GestureEvent::None {
                    event = ending.unwrap_or(GestureEvent::None);
                }
                debug!(from = %self.current, to = %result.gesture, "gesture confirmed");
                self.current = result.gesture;
                self.gesture_start = Some(now);
                self.debounce_counter = 0;
            }
        } else {
            self.debounce_counter = 0;
            self.pending = GestureType::None;

            // ── hold ──────────────────────────────────────────────────────
            if !self.is_holding && self.current != GestureType::None {
                if self.elapsed(now) >= self.config.hold_duration {
                    self.is_holding = true;
                    if event == GestureEvent::None {
                        event = GestureEvent::HoldStart;
                    }
                }
            }
        }

        if event != GestureEvent::None {
            trace!(%event, gesture = %self.current, "gesture event");
        }

        GestureState {
            current_gesture: self.current,
            event,
            gesture_start:   self.gesture_start,
            is_holding:      self.is_holding,
            hand_center:     Some(center),
            index_tip:       Some(result.hand.index_tip()),
        }
    }

    pub fn reset(&mut self) {
        self.current          = GestureType::None;
        self.gesture_start    = None;
        self.is_holding       = false;
        self.debounce_counter = 0;
        self.pending          = GestureType::None;
        self.history.clear();
    }

    fn hand_lost(&mut self, now: Instant) -> GestureState {
        let mut event = GestureEvent::None;
        if self.current != GestureType::None {
            event = self.ending_event(now).unwrap_or(GestureEvent::None);
            debug!(from = %self.current, "hand lost");
            self.current = GestureType::None;
        }
        GestureState { event, ..GestureState::default() }
    }

    /// Terminal event for the gesture that is ending right now.
    fn ending_event(&mut self, now: Instant) -> Option<GestureEvent> {
        if self.is_holding {
            self.is_holding = false;
            return Some(GestureEvent::HoldEnd);
        }
        if self.gesture_start.is_some() {
            let d = self.elapsed(now);
            if d > 0.0 && d < self.config.tap_max_duration {
                return Some(GestureEvent::Tap);
            }
        }
        None
    }

    fn elapsed(&self, now: Instant) -> f32 {
        self.gesture_start
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or(0.0)
    }

    fn detect_swipe(&self) -> GestureEvent {
        if self.history.len() < SWIPE_MIN_SAMPLES {
            return GestureEvent::None;
        }
        let (Some(&(oldest, t0)), Some(&(newest, t1))) = (self.history.front(), self.history.back())
        else {
            return GestureEvent::None;
        };

        let span = t1.saturating_duration_since(t0).as_secs_f32();
        if !(SWIPE_MIN_SPAN..=SWIPE_MAX_SPAN).contains(&span) {
            return GestureEvent::None;
        }

        let dx = newest.x - oldest.x;
        let dy = newest.y - oldest.y;
        let threshold = self.config.swipe_threshold;

        if dx.abs() > threshold && dx.abs() > dy.abs() {
            return if dx > 0.0 { GestureEvent::SwipeRight } else { GestureEvent::SwipeLeft };
        }
        if dy.abs() > threshold && dy.abs() > dx.abs() {
            return if dy > 0.0 { GestureEvent::SwipeDown } else { GestureEvent::SwipeUp };
        }
        GestureEvent::None
    }
}

impl Default for GestureTracker {
    fn default() -> Self { Self::new(GestureConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
