//! Fire-and-forget MIDI playback thread.
//!
//! [`AudioPlayer::play`] looks up the cue for a spell name and hands it to a
//! background thread over a channel; the caller never waits.  The thread
//! opens a MIDI output port the first time it has something to play and
//! falls back to a silent sink when no port is available.  Either way the
//! decision is made once and cached.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cue::{cue_for, SoundCue};

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand: sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub enum PlayerCommand {
    /// Play a cue at the given volume (0–1).
    Play(Arc<SoundCue>, f32),
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn send(&mut self, message: &[u8]);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) {
        if let Err(e) = self.conn.send(message) {
            debug!(error = %e, "MIDI send failed");
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output: enumerate ports and pick first available
// ════════════════════════════════════════════════════════════════════════════

/// Try to open a MIDI output port, preferring a software synthesiser.
fn open_midi_output() -> Option<Box<dyn MidiOut>> {
    let midi_out = match midir::MidiOutput::new("spellcaster_audio") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed, audio disabled");
            return None;
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found, audio disabled (try `timidity -iA` or `fluidsynth`)");
        return None;
    }

    let port_idx = ports.iter().enumerate()
        .find(|(_, p)| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());

    match midi_out.connect(port, "spell-cues") {
        Ok(conn) => {
            info!(port = %name, "MIDI output opened");
            Some(Box::new(MidirOut { conn }))
        }
        Err(e) => {
            warn!(port = %name, error = %e, "MIDI connect failed, audio disabled");
            None
        }
    }
}


// ════════════════════════════════════════════════════════════════════════════
// Scheduling
// ════════════════════════════════════════════════════════════════════════════

/// A raw MIDI message due at `at_ms` after the cue starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedMessage {
    pub at_ms: u32,
    pub bytes: [u8; 3],
}

/// Flatten a cue into time-ordered program-change / note-on / note-off
/// messages.  `volume` scales every velocity; a zero result is raised to 1
/// so the note still sounds.
pub fn schedule(cue: &SoundCue, volume: f32) -> Vec<TimedMessage> {
    let volume = volume.clamp(0.0, 1.0);
    let mut out = Vec::with_capacity(cue.notes.len() * 3);
    let mut programs: [Option<u8>; 16] = [None; 16];

    for n in &cue.notes {
        let ch = n.channel & 0x0F;
        if programs[ch as usize] != Some(n.program) {
            programs[ch as usize] = Some(n.program);
            out.push(TimedMessage { at_ms: n.start_ms, bytes: [0xC0 | ch, n.program, 0] });
        }
        let velocity = ((n.velocity as f32 * volume).round() as u8).clamp(1, 127);
        out.push(TimedMessage { at_ms: n.start_ms, bytes: [0x90 | ch, n.pitch, velocity] });
        out.push(TimedMessage { at_ms: n.start_ms + n.duration_ms, bytes: [0x80 | ch, n.pitch, 0] });
    }
    // stable: program change stays ahead of the note it precedes
    out.sort_by_key(|m| m.at_ms);
    out
}

fn perform(out: &mut dyn MidiOut, messages: &[TimedMessage]) {
    let mut clock = 0u32;
    for m in messages {
        if m.at_ms > clock {
            thread::sleep(Duration::from_millis((m.at_ms - clock) as u64));
            clock = m.at_ms;
        }
        let len = if m.bytes[0] & 0xF0 == 0xC0 { 2 } else { 3 };
        out.send(&m.bytes[..len]);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AudioPlayer: handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub struct AudioPlayer {
    enabled: bool,
    volume:  f32,
    cmd_tx:  Option<Sender<PlayerCommand>>,
    handle:  Option<JoinHandle<()>>,
}

impl AudioPlayer {
    /// A disabled player never spawns a thread and ignores every request.
    pub fn new(enabled: bool, volume: f32) -> Self {
        Self::with_output(enabled, volume, open_midi_output)
    }

    /// Like [`AudioPlayer::new`] but with a custom port opener.
    pub fn with_output<F>(enabled: bool, volume: f32, open: F) -> Self
    where
        F: Fn() -> Option<Box<dyn MidiOut>> + Send + 'static,
    {
        let volume = volume.clamp(0.0, 1.0);
        if !enabled {
            return Self { enabled, volume, cmd_tx: None, handle: None };
        }

        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let spawned = thread::Builder::new()
            .name("spell-audio".into())
            .spawn(move || player_thread(cmd_rx, open));

        match spawned {
            Ok(handle) => Self { enabled, volume, cmd_tx: Some(cmd_tx), handle: Some(handle) },
            Err(e) => {
                warn!(error = %e, "could not start audio thread, audio disabled");
                Self { enabled: false, volume, cmd_tx: None, handle: None }
            }
        }
    }

    pub fn disabled() -> Self { Self::new(false, 0.0) }

    pub fn enabled(&self) -> bool { self.enabled }
    pub fn volume(&self)  -> f32  { self.volume }

    pub fn set_volume(&mut self, volume: f32) { self.volume = volume.clamp(0.0, 1.0); }

    /// Queue the cue for `spell_name`.  Never blocks, never fails.
    pub fn play(&self, spell_name: &str) {
        let Some(tx) = &self.cmd_tx else { return };
        let Some(cue) = cue_for(spell_name) else { return };
        if tx.send(PlayerCommand::Play(cue, self.volume)).is_err() {
            debug!(spell = spell_name, "audio thread gone, cue dropped");
        }
    }

    /// Stop the playback thread and wait for it to finish its current cue.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(PlayerCommand::Quit);
        }
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) { self.shutdown(); }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread: the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread<F>(cmd_rx: Receiver<PlayerCommand>, open: F)
where
    F: Fn() -> Option<Box<dyn MidiOut>>,
{
    // opened on the first cue; a failed open is not retried
    let mut output: Option<Box<dyn MidiOut>> = None;
    for cmd in cmd_rx {
        match cmd {
            PlayerCommand::Play(cue, volume) => {
                let messages = schedule(&cue, volume);
                let out = output.get_or_insert_with(|| open().unwrap_or_else(|| Box::new(NullOut)));
                perform(out.as_mut(), &messages);
            }
            PlayerCommand::Quit => return,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueNote;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn cue(notes: Vec<CueNote>) -> SoundCue {
        SoundCue { name: "test".into(), notes }
    }

    fn note(channel: u8, program: u8, pitch: u8, velocity: u8, start_ms: u32, duration_ms: u32) -> CueNote {
        CueNote { channel, program, pitch, velocity, start_ms, duration_ms }
    }

    #[test]
    fn schedule_orders_messages() {
        let c = cue(vec![note(0, 38, 60, 100, 0, 50), note(0, 38, 62, 100, 20, 10)]);
        let m = schedule(&c, 1.0);
        let times: Vec<u32> = m.iter().map(|m| m.at_ms).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(m[0].bytes, [0xC0, 38, 0]);
        assert_eq!(m[1].bytes, [0x90, 60, 100]);
        // one program change per channel while it does not change
        assert_eq!(m.iter().filter(|m| m.bytes[0] & 0xF0 == 0xC0).count(), 1);
        assert_eq!(m.last().map(|m| m.at_ms), Some(50));
    }

    #[test]
    fn volume_scales_velocity() {
        let c = cue(vec![note(2, 0, 60, 100, 0, 10)]);
        let m = schedule(&c, 0.5);
        assert_eq!(m[1].bytes, [0x92, 60, 50]);
        let m = schedule(&c, 0.0);
        assert_eq!(m[1].bytes[2], 1);
    }

    struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);
    impl MidiOut for Recorder {
        fn send(&mut self, message: &[u8]) {
            if let Ok(mut v) = self.0.lock() { v.push(message.to_vec()); }
        }
    }

    #[test]
    fn player_sends_cue_and_opens_port_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let opens = Arc::new(AtomicUsize::new(0));
        let (log2, opens2) = (log.clone(), opens.clone());
        let mut p = AudioPlayer::with_output(true, 1.0, move || {
            opens2.fetch_add(1, Ordering::SeqCst);
            Some(Box::new(Recorder(log2.clone())) as Box<dyn MidiOut>)
        });
        p.play("shield");
        p.play("shield");
        p.play("no_such_spell");
        p.shutdown();

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        let sent = log.lock().unwrap();
        // 4 notes × (on + off) + 1 program change, twice
        assert_eq!(sent.len(), 18);
        assert_eq!(sent[0].len(), 2);
    }

    #[test]
    fn failed_port_is_not_retried() {
        let opens = Arc::new(AtomicUsize::new(0));
        let opens2 = opens.clone();
        let mut p = AudioPlayer::with_output(true, 1.0, move || {
            opens2.fetch_add(1, Ordering::SeqCst);
            None
        });
        p.play("wind");
        p.play("wind");
        p.shutdown();
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_player_ignores_requests() {
        let p = AudioPlayer::disabled();
        assert!(!p.enabled());
        p.play("fireball");
    }
}
