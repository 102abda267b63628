//! # spell_audio
//!
//! Short MIDI sound cues for spell casts, played on a background thread.
//!
//! ```rust,no_run
//! use spell_audio::AudioPlayer;
//!
//! let audio = AudioPlayer::new(true, 0.5);
//! audio.play("fireball");   // returns immediately
//! ```
//!
//! | Module | Contents |
//! |---|---|
//! | [`cue`] | per-spell cue composition and the process-wide cue cache |
//! | [`player`] | MIDI port selection and the fire-and-forget playback thread |
//!
//! When no MIDI output port exists the player degrades to a silent sink;
//! audio never fails a cast.

pub mod cue;
pub mod player;

pub use cue::{cue_for, pitch_for_hz, CueNote, GeneralMidi, SoundCue, KNOWN_CUES};
pub use player::{schedule, AudioPlayer, MidiOut, PlayerCommand, TimedMessage};
