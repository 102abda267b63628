//! Software-rendered output window using `minifb`.
//!
//! The window doubles as the input device for [`SimulatedHands`]: the mouse
//! is the palm centre and the number keys pick a pose.
//!
//! | Key | Action |
//! |---|---|
//! | `1` … `6` | open palm, fist, point, peace, thumbs up, pinch |
//! | `H` | hide / show the hand |
//! | `Q` / `Esc` | quit |
//!
//! [`SimulatedHands`]: crate::vision::SimulatedHands

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Result};
use gesture_core::{GestureType, Point};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use particle_fx::Frame;
use tracing::debug;

use crate::vision::HandInput;

const POSE_KEYS: [(Key, GestureType); 6] = [
    (Key::Key1, GestureType::OpenPalm),
    (Key::Key2, GestureType::Fist),
    (Key::Key3, GestureType::Point),
    (Key::Key4, GestureType::Peace),
    (Key::Key5, GestureType::ThumbsUp),
    (Key::Key6, GestureType::Pinch),
];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    width:  usize,
    height: usize,
    input:  Option<Sender<HandInput>>,
    hidden: bool,
}

impl Visualizer {
    /// Open a fixed-size window.  `input` receives hand steering, if any.
    pub fn new(title: &str, width: usize, height: usize, input: Option<Sender<HandInput>>) -> Result<Self> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("opening window: {}", e))?;

        window.limit_update_rate(Some(Duration::from_millis(16)));

        Ok(Visualizer { window, width, height, input, hidden: false })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Forward mouse and keys to the hand simulator.  Returns false when the
    /// window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }
        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            debug!("quit requested");
            return false;
        }

        let Some(tx) = &self.input else { return true };

        if pressed(Key::H) {
            self.hidden = !self.hidden;
            if self.hidden {
                let _ = tx.send(HandInput::Hide);
            }
        }
        for (key, pose) in POSE_KEYS {
            if pressed(key) {
                let _ = tx.send(HandInput::Pose(pose));
            }
        }
        if !self.hidden {
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                let p = Point::new(mx / self.width as f32, my / self.height as f32);
                let _ = tx.send(HandInput::Move(p));
            }
        }
        true
    }

    /// Blit `frame`; it must match the window size.
    pub fn present(&mut self, frame: &Frame) -> Result<()> {
        self.window
            .update_with_buffer(frame.pixels(), frame.width(), frame.height())
            .map_err(|e| anyhow!("presenting frame: {}", e))
    }
}
