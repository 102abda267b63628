//! Application settings, read from a TOML document.
//!
//! Every section and every key is optional; anything left out takes the
//! default shown below.  A document that fails to parse is discarded
//! whole, never half-applied.
//!
//! ```toml
//! [camera]     device_id = 0, width = 1280, height = 720, fps = 30
//! [hands]      max_hands = 2, min_detection_confidence = 0.7, min_tracking_confidence = 0.5
//! [gestures]   swipe_threshold = 0.08, hold_duration = 0.5, tap_max_duration = 0.3, debounce_frames = 5
//! [particles]  max_particles = 2000, glow_enabled = true, glow_intensity = 0.3
//! [spells]     max_mana = 100, mana_regen = 8.0, show_mana_bar = true, show_spell_name = true
//! [audio]      enabled = true, volume = 0.5
//! [hud]        opacity = 0.85, color_primary = [200, 255, 0], ...
//! [effects]    scanlines_enabled = false, scanline_gap = 3, flicker_enabled = false, flicker_intensity = 0.05
//! [detection]  enabled = true, every_n_frames = 3, confidence_threshold = 0.5
//! [recording]  output_dir = "data/recordings"
//! [logging]    level = "INFO", file = "logs/spellcaster.log"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use gesture_core::GestureConfig;
use particle_fx::Rgb;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::hud::HudTheme;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera:    CameraSettings,
    pub hands:     HandsSettings,
    pub gestures:  GestureSettings,
    pub particles: ParticleSettings,
    pub spells:    SpellSettings,
    pub audio:     AudioSettings,
    pub hud:       HudSettings,
    pub effects:   EffectSettings,
    pub detection: DetectionSettings,
    pub recording: RecordingSettings,
    pub logging:   LoggingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub device_id: u32,
    pub width:     usize,
    pub height:    usize,
    pub fps:       u32,
}

impl Default for CameraSettings {
    fn default() -> Self { Self { device_id: 0, width: 1280, height: 720, fps: 30 } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsSettings {
    pub max_hands:                usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence:  f32,
}

impl Default for HandsSettings {
    fn default() -> Self {
        Self { max_hands: 2, min_detection_confidence: 0.7, min_tracking_confidence: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub swipe_threshold:  f32,
    pub hold_duration:    f32,
    pub tap_max_duration: f32,
    pub debounce_frames:  u32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        let d = GestureConfig::default();
        Self {
            swipe_threshold:  d.swipe_threshold,
            hold_duration:    d.hold_duration,
            tap_max_duration: d.tap_max_duration,
            debounce_frames:  d.debounce_frames,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub max_particles:  usize,
    pub glow_enabled:   bool,
    pub glow_intensity: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self { Self { max_particles: 2000, glow_enabled: true, glow_intensity: 0.3 } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellSettings {
    pub max_mana:        u32,
    pub mana_regen:      f32,
    pub show_mana_bar:   bool,
    pub show_spell_name: bool,
}

impl Default for SpellSettings {
    fn default() -> Self {
        Self { max_mana: 100, mana_regen: 8.0, show_mana_bar: true, show_spell_name: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    pub volume:  f32,
}

impl Default for AudioSettings {
    fn default() -> Self { Self { enabled: true, volume: 0.5 } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    pub opacity:         f32,
    pub color_primary:   [u8; 3],
    pub color_secondary: [u8; 3],
    pub color_alert:     [u8; 3],
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            opacity:         0.85,
            color_primary:   [200, 255, 0],
            color_secondary: [0, 170, 255],
            color_alert:     [255, 100, 0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub scanlines_enabled: bool,
    pub scanline_gap:      usize,
    pub flicker_enabled:   bool,
    pub flicker_intensity: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self { scanlines_enabled: false, scanline_gap: 3, flicker_enabled: false, flicker_intensity: 0.05 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub enabled:              bool,
    pub every_n_frames:       u64,
    pub confidence_threshold: f32,
}

impl Default for DetectionSettings {
    fn default() -> Self { Self { enabled: true, every_n_frames: 3, confidence_threshold: 0.5 } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_dir: String,
}

impl Default for RecordingSettings {
    fn default() -> Self { Self { output_dir: "data/recordings".into() } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` level name; case does not matter.
    pub level: String,
    pub file:  String,
}

impl Default for LoggingSettings {
    fn default() -> Self { Self { level: "INFO".into(), file: "logs/spellcaster.log".into() } }
}

// ════════════════════════════════════════════════════════════════════════════
// Loading
// ════════════════════════════════════════════════════════════════════════════

impl Settings {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing settings")
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                info!(path = %path.display(), "loaded config");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "invalid config, using defaults");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text)
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            swipe_threshold:  self.gestures.swipe_threshold,
            hold_duration:    self.gestures.hold_duration,
            tap_max_duration: self.gestures.tap_max_duration,
            debounce_frames:  self.gestures.debounce_frames.max(1),
        }
    }

    pub fn theme(&self) -> HudTheme {
        let rgb = |[r, g, b]: [u8; 3]| Rgb(r, g, b);
        HudTheme {
            primary:   rgb(self.hud.color_primary),
            secondary: rgb(self.hud.color_secondary),
            alert:     rgb(self.hud.color_alert),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
