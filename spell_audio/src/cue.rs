//! Procedural spell sound cues.
//!
//! Each spell name maps to a short [`SoundCue`]: a handful of MIDI notes
//! laid out on a millisecond timeline.  Cues are composed on first request
//! and kept in a process-wide cache for the life of the program.
//!
//! | Spell | Character | Instruments |
//! |---|---|---|
//! | `fireball` | rising whoosh over a low rumble | synth bass sweep, timpani |
//! | `lightning` | crackle with an electric buzz | sawtooth lead, gunshot |
//! | `shield` | resonant hum with overtones | choir pad chord |
//! | `force_push` | bass thud then a whoosh | synth drum, reverse cymbal |
//! | `teleport` | falling sweep breaking into glitches | crystal FX, square lead |
//! | `wind` | gentle rushing noise, slowly swelling | breath noise, seashore |

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, warn};

// ════════════════════════════════════════════════════════════════════════════
// General MIDI programs used by the cues
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI instrument numbers (0-indexed, as sent in Program Change).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneralMidi {
    SynthBass1    = 38,
    Timpani       = 47,
    Lead1Square   = 80,
    Lead2Saw      = 81,
    Pad4Choir     = 91,
    Fx3Crystal    = 98,
    SynthDrum     = 118,
    ReverseCymbal = 119,
    BreathNoise   = 121,
    Seashore      = 122,
    Gunshot       = 127,
}

impl GeneralMidi {
    pub fn program(self) -> u8 { self as u8 }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundCue
// ════════════════════════════════════════════════════════════════════════════

/// One note on the cue timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CueNote {
    pub channel:     u8,
    pub program:     u8,
    pub pitch:       u8,
    pub velocity:    u8,
    pub start_ms:    u32,
    pub duration_ms: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundCue {
    pub name:  String,
    pub notes: Vec<CueNote>,
}

impl SoundCue {
    /// Milliseconds until the last note ends.
    pub fn length_ms(&self) -> u32 {
        self.notes.iter().map(|n| n.start_ms + n.duration_ms).max().unwrap_or(0)
    }
}

/// Nearest MIDI pitch for a frequency in Hz (A4 = 440 Hz = 69).
pub fn pitch_for_hz(hz: f32) -> u8 {
    if hz <= 0.0 { return 0; }
    (69.0 + 12.0 * (hz / 440.0).log2()).round().clamp(0.0, 127.0) as u8
}

// ── Builder ───────────────────────────────────────────────────────────────

struct CueBuilder {
    name:  &'static str,
    notes: Vec<CueNote>,
}

impl CueBuilder {
    fn new(name: &'static str) -> Self { Self { name, notes: Vec::new() } }

    fn note(mut self, channel: u8, program: GeneralMidi, pitch: u8, velocity: u8, start_ms: u32, duration_ms: u32) -> Self {
        self.notes.push(CueNote {
            channel, program: program.program(), pitch, velocity, start_ms, duration_ms,
        });
        self
    }

    /// `steps` notes following `freq(t)` for `t` in `[0, 1)`, evenly spaced
    /// over `length_ms`, with velocity following `vel(t)`.
    #[allow(clippy::too_many_arguments)]
    fn sweep(
        mut self,
        channel: u8,
        program: GeneralMidi,
        steps: u32,
        length_ms: u32,
        freq: impl Fn(f32) -> f32,
        vel: impl Fn(f32) -> f32,
    ) -> Self {
        let step_ms = (length_ms / steps.max(1)).max(1);
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let velocity = vel(t).clamp(1.0, 127.0) as u8;
            self = self.note(channel, program, pitch_for_hz(freq(t)), velocity, i * step_ms, step_ms);
        }
        self
    }

    fn build(self) -> SoundCue {
        SoundCue { name: self.name.to_string(), notes: self.notes }
    }
}

/// Linear attack then linear release, as a 0–1 gain over normalised time.
fn envelope(t: f32, attack: f32, release: f32) -> f32 {
    if t < attack {
        t / attack
    } else if t > 1.0 - release {
        ((1.0 - t) / release).max(0.0)
    } else {
        1.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Composers
// ════════════════════════════════════════════════════════════════════════════

fn compose(name: &str) -> Option<SoundCue> {
    let cue = match name {
        "fireball"   => fireball(),
        "lightning"  => lightning(),
        "shield"     => shield(),
        "force_push" => force_push(),
        "teleport"   => teleport(),
        "wind"       => wind(),
        _            => return None,
    };
    Some(cue)
}

fn fireball() -> SoundCue {
    CueBuilder::new("fireball")
        .note(1, GeneralMidi::Timpani, pitch_for_hz(60.0), 90, 0, 600)
        .sweep(0, GeneralMidi::SynthBass1, 12, 600,
               |t| 150.0 + 600.0 * t * t,
               |t| 110.0 * envelope(t, 0.03, 0.5))
        .build()
}

fn lightning() -> SoundCue {
    // Fixed crackle pattern so the cue is identical on every run.
    const CRACKLE: [u8; 8] = [96, 101, 94, 103, 98, 105, 92, 100];
    let mut b = CueBuilder::new("lightning")
        .note(1, GeneralMidi::Gunshot, 60, 120, 0, 150)
        .note(0, GeneralMidi::Lead2Saw, pitch_for_hz(120.0), 80, 0, 400)
        .note(0, GeneralMidi::Lead2Saw, pitch_for_hz(240.0), 60, 0, 400);
    for (i, &p) in CRACKLE.iter().enumerate() {
        let t = i as f32 / CRACKLE.len() as f32;
        let v = (120.0 * envelope(t, 0.01, 0.4)).max(1.0) as u8;
        b = b.note(2, GeneralMidi::Lead2Saw, p, v, i as u32 * 45, 40);
    }
    b.build()
}

fn shield() -> SoundCue {
    let v = |gain: f32| (127.0 * gain) as u8;
    CueBuilder::new("shield")
        .note(0, GeneralMidi::Pad4Choir, pitch_for_hz(110.0), v(0.8), 0, 500)
        .note(0, GeneralMidi::Pad4Choir, pitch_for_hz(220.0), v(0.5), 0, 500)
        .note(0, GeneralMidi::Pad4Choir, pitch_for_hz(330.0), v(0.35), 0, 500)
        .note(0, GeneralMidi::Pad4Choir, pitch_for_hz(550.0), v(0.25), 0, 500)
        .build()
}

fn force_push() -> SoundCue {
    CueBuilder::new("force_push")
        .sweep(0, GeneralMidi::SynthDrum, 4, 350,
               |t| 50.0 * (-t * 0.35 * 8.0).exp() + 30.0,
               |t| 127.0 * (1.0 - t))
        .note(1, GeneralMidi::ReverseCymbal, 60, 70, 20, 150)
        .build()
}

fn teleport() -> SoundCue {
    CueBuilder::new("teleport")
        .sweep(0, GeneralMidi::Fx3Crystal, 8, 300,
               |t| 2000.0 * (-t * 0.3 * 6.0).exp() + 100.0,
               |t| 100.0 * envelope(t, 0.05, 0.2))
        .note(1, GeneralMidi::Lead1Square, 84, 70, 300, 50)
        .note(1, GeneralMidi::Lead1Square, 79, 60, 350, 50)
        .note(1, GeneralMidi::Lead1Square, 88, 50, 400, 50)
        .note(1, GeneralMidi::Lead1Square, 76, 40, 450, 50)
        .build()
}

fn wind() -> SoundCue {
    let tau = std::f32::consts::TAU;
    CueBuilder::new("wind")
        .note(1, GeneralMidi::Seashore, 60, 70, 0, 700)
        .sweep(0, GeneralMidi::BreathNoise, 7, 700,
               |_| 440.0,
               move |t| 90.0 * (0.5 + 0.5 * (tau * 3.0 * 0.7 * t).sin()) * envelope(t, 0.07, 0.43))
        .build()
}

// ════════════════════════════════════════════════════════════════════════════
// Process-wide cache
// ════════════════════════════════════════════════════════════════════════════

type CueCache = Mutex<HashMap<String, Option<Arc<SoundCue>>>>;

fn cache() -> &'static CueCache {
    static CACHE: OnceLock<CueCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Cue for `name`, composed on first request and cached thereafter.
///
/// Unknown names yield `None`; the miss is cached too, so the warning is
/// logged once per name.
pub fn cue_for(name: &str) -> Option<Arc<SoundCue>> {
    let mut guard = match cache().lock() {
        Ok(g)  => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(entry) = guard.get(name) {
        return entry.clone();
    }
    let entry = compose(name).map(Arc::new);
    match &entry {
        Some(c) => debug!(spell = name, notes = c.notes.len(), "sound cue composed"),
        None    => warn!(spell = name, "no sound cue for spell"),
    }
    guard.insert(name.to_string(), entry.clone());
    entry
}

/// Names with a composed cue.
pub const KNOWN_CUES: [&str; 6] = ["fireball", "lightning", "shield", "force_push", "teleport", "wind"];

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
