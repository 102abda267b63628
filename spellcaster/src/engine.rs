//! The per-frame tick that ties every subsystem together.
//!
//! ```text
//!  frame ─► PoseSource ─► classify ─► GestureTracker ─► GestureState
//!                                                         │
//!            ┌────────────────────── spell mode ──────────┤
//!            ▼                                            ▼  hud mode
//!      SpellRegistry::handle_event              HudState ─► WidgetRegistry
//!            │                                            │
//!            ▼                                            ▼
//!  particles ─► spells ─► glow ─► HUD overlay ─► screen fx ─► skeleton ─► mana / banner
//! ```
//!
//! The engine never reads the clock: the caller passes one `Instant` per
//! frame, so a test can replay a minute of gestures in microseconds.

use std::path::PathBuf;
use std::time::Instant;

use gesture_core::{
    GestureEvent, GestureRecognizer, GestureResult, GestureState, GestureTracker, GestureType, Point,
};
use particle_fx::{
    EffectsPipeline, Frame, GlowEffect, HolographicFlicker, ParticleEngine, ScanlineEffect, ScreenEffects,
};
use spell_audio::AudioPlayer;
use tracing::{debug, info, warn};

use crate::collab::Collaborator;
use crate::config::Settings;
use crate::hud::{HudMode, HudState, HudTheme, WidgetRegistry};
use crate::overlay;
use crate::recording;
use crate::spells::{ManaSystem, SpellKind, SpellRegistry};
use crate::vision::{FrameSkippingDetector, PoseSource};

/// Longest step fed to the simulation, so a stalled frame never teleports
/// particles across the screen.
const MAX_DT: f32 = 0.1;
const FIRST_DT: f32 = 1.0 / 30.0;

/// Where a spell lands when no hand is visible.
const DEFAULT_CAST: Point = Point { x: 0.5, y: 0.5 };

// ════════════════════════════════════════════════════════════════════════════
// AppMode
// ════════════════════════════════════════════════════════════════════════════

/// Which layers run on top of the video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AppMode {
    /// Spells only.
    Spell,
    /// HUD only.
    Hud,
    /// Both; a swipe casts wind and cycles the HUD mode.
    #[default]
    Combined,
}

impl AppMode {
    pub fn spells(self) -> bool { matches!(self, AppMode::Spell | AppMode::Combined) }
    pub fn hud(self)    -> bool { matches!(self, AppMode::Hud | AppMode::Combined) }
}

/// Trigger keys installed on every engine.
pub const DEFAULT_BINDINGS: [(&str, SpellKind); 8] = [
    ("hold_start_fist",      SpellKind::Shield),
    ("hold_start_open_palm", SpellKind::ForcePush),
    ("hold_start_point",     SpellKind::Lightning),
    ("hold_start_pinch",     SpellKind::Teleport),
    ("swipe_left",           SpellKind::Wind),
    ("swipe_right",          SpellKind::Wind),
    ("swipe_up",             SpellKind::Fireball),
    ("tap_open_palm",        SpellKind::ForcePush),
];

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    mode:     AppMode,
    settings: Settings,
    theme:    HudTheme,

    // ── perception ────────────────────────────────────────────────────────
    pose:       Collaborator<Box<dyn PoseSource>>,
    recognizer: GestureRecognizer,
    tracker:    GestureTracker,
    detector:   FrameSkippingDetector,

    // ── effects ───────────────────────────────────────────────────────────
    particles: ParticleEngine,
    screen:    ScreenEffects,
    post:      EffectsPipeline,
    registry:  SpellRegistry,

    // ── hud ───────────────────────────────────────────────────────────────
    widgets:  WidgetRegistry,
    hud_mode: HudMode,

    // ── bookkeeping ───────────────────────────────────────────────────────
    last_tick:      Option<Instant>,
    frame_number:   u64,
    gesture:        GestureState,
    screenshot_dir: Option<PathBuf>,
    screenshots:    Vec<PathBuf>,
}

impl Engine {
    pub fn new(
        settings: Settings,
        mode:     AppMode,
        pose:     Collaborator<Box<dyn PoseSource>>,
        detector: FrameSkippingDetector,
        audio:    AudioPlayer,
    ) -> Self {
        let theme = settings.theme();
        let mana = ManaSystem::new(settings.spells.max_mana, settings.spells.mana_regen);
        let mut registry = SpellRegistry::new(mana, audio);
        for (trigger, kind) in DEFAULT_BINDINGS {
            registry.register(trigger, kind);
        }

        let post = EffectsPipeline::new(
            GlowEffect {
                enabled:   settings.particles.glow_enabled,
                intensity: settings.particles.glow_intensity,
                ..GlowEffect::default()
            },
            ScanlineEffect { enabled: settings.effects.scanlines_enabled, gap: settings.effects.scanline_gap },
            HolographicFlicker::new(settings.effects.flicker_enabled, settings.effects.flicker_intensity),
        );

        info!(?mode, max_particles = settings.particles.max_particles, "engine ready");
        Self {
            mode,
            theme,
            pose,
            recognizer:     GestureRecognizer::new(),
            tracker:        GestureTracker::new(settings.gesture_config()),
            detector,
            particles:      ParticleEngine::new(settings.particles.max_particles),
            screen:         ScreenEffects::new(),
            post,
            registry,
            widgets:        WidgetRegistry::standard(theme),
            hud_mode:       HudMode::default(),
            last_tick:      None,
            frame_number:   0,
            gesture:        GestureState::default(),
            screenshot_dir: None,
            screenshots:    Vec::new(),
            settings,
        }
    }

    /// Save a screenshot into `dir` whenever a thumbs-up is held.
    pub fn set_screenshot_dir(&mut self, dir: Option<PathBuf>) { self.screenshot_dir = dir; }

    pub fn mode(&self)         -> AppMode         { self.mode }
    pub fn hud_mode(&self)     -> HudMode         { self.hud_mode }
    pub fn gesture(&self)      -> &GestureState   { &self.gesture }
    pub fn registry(&self)     -> &SpellRegistry  { &self.registry }
    pub fn registry_mut(&mut self) -> &mut SpellRegistry { &mut self.registry }
    pub fn particles(&self)    -> &ParticleEngine { &self.particles }
    pub fn widgets(&self)      -> &WidgetRegistry { &self.widgets }
    pub fn frame_number(&self) -> u64             { self.frame_number }
    pub fn screenshots(&self)  -> &[PathBuf]      { &self.screenshots }

    /// Release the audio thread.  Particles and spells in flight are dropped.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        self.particles.clear();
        self.registry.audio_mut().shutdown();
        info!(frames = self.frame_number, "engine stopped");
    }

    /// Process one video frame and return the composited output.
    pub fn tick(&mut self, mut frame: Frame, now: Instant) -> Frame {
        let dt = match self.last_tick {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32().min(MAX_DT),
            None => FIRST_DT,
        };
        self.last_tick = Some(now);
        self.frame_number += 1;

        // ── perceive ──────────────────────────────────────────────────────
        let hands = match self.pose.get() {
            Some(source) => source.detect(&frame),
            None => Vec::new(),
        };
        let result: Option<GestureResult> = hands.first().map(|h| self.recognizer.classify(h));
        self.gesture = self.tracker.update_at(result.as_ref(), now);
        let event = self.gesture.event;

        // ── spells ────────────────────────────────────────────────────────
        let mut screenshot = false;
        if event != GestureEvent::None {
            let gesture_name = result.as_ref().map_or("", |r| r.gesture.name());
            debug!(%event, gesture = gesture_name, "gesture event");

            if self.mode.spells() {
                if event == GestureEvent::HoldEnd {
                    self.registry.dismiss_sustained();
                }
                let at = self.gesture.hand_center.unwrap_or(DEFAULT_CAST);
                self.registry.handle_event_at(
                    event, at.x, at.y, gesture_name, &mut self.particles, &mut self.screen, now,
                );
            }
            screenshot = event == GestureEvent::HoldStart
                && self.gesture.current_gesture == GestureType::ThumbsUp
                && self.screenshot_dir.is_some();
        }

        // ── hud ───────────────────────────────────────────────────────────
        let hud_overlay = if self.mode.hud() {
            let detections = if self.settings.detection.enabled {
                self.detector.detect(&frame)
            } else {
                Vec::new()
            };
            let mut state = HudState::new((frame.width(), frame.height()), now);
            state.hands        = hands.clone();
            state.gesture      = self.gesture.clone();
            state.detections   = detections;
            state.mode         = self.hud_mode;
            state.fps          = if dt > 0.0 { 1.0 / dt } else { 0.0 };
            state.frame_number = self.frame_number;
            state.particles    = (self.particles.count(), self.particles.capacity());
            state.spells       = self.registry.active_count();

            self.widgets.update_all(&mut state);
            if state.mode != self.hud_mode {
                info!(from = self.hud_mode.label(), to = state.mode.label(), "hud mode changed");
                self.hud_mode = state.mode;
            }
            let mut layer = Frame::new(frame.width(), frame.height());
            self.widgets.render_all(&mut layer, &state);
            Some(layer)
        } else {
            None
        };

        // ── simulate ──────────────────────────────────────────────────────
        self.registry.update(dt, self.gesture.hand_center, &mut self.particles, &mut self.screen);
        self.particles.update(dt);
        self.screen.update(dt);

        // ── render ────────────────────────────────────────────────────────
        self.particles.render(&mut frame);
        self.registry.render(&mut frame);
        if !self.particles.is_empty() {
            self.post.glow.apply(&mut frame);
        }
        if let Some(layer) = &hud_overlay {
            overlay::composite(&mut frame, layer, self.settings.hud.opacity);
            self.post.scanlines.apply(&mut frame);
            self.post.flicker.apply_at(&mut frame, now);
        }
        self.screen.apply(&mut frame);
        overlay::draw_skeleton(&mut frame, &hands, self.theme.primary);

        if self.mode.spells() {
            if self.settings.spells.show_mana_bar {
                overlay::draw_mana_bar(&mut frame, self.registry.mana());
            }
            if self.settings.spells.show_spell_name {
                if let Some(spell) = self.registry.latest() {
                    overlay::draw_spell_name(&mut frame, spell);
                }
            }
        }

        if screenshot {
            if let Some(dir) = &self.screenshot_dir {
                match recording::take_screenshot(&frame, dir) {
                    Ok(path) => self.screenshots.push(path),
                    Err(e) => warn!(error = %format!("{:#}", e), "screenshot failed"),
                }
            }
        }
        frame
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::SpellState;
    use crate::vision::{HandInput, SimulatedHands};
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    const W: usize = 160;
    const H: usize = 120;
    const STEP: Duration = Duration::from_millis(33);

    fn engine(mode: AppMode) -> (Engine, Sender<HandInput>) {
        let (sim, tx) = SimulatedHands::live();
        let pose: Box<dyn PoseSource> = Box::new(sim);
        let mut settings = Settings::default();
        settings.particles.max_particles = 500;
        let e = Engine::new(
            settings,
            mode,
            Collaborator::ready("pose", pose),
            FrameSkippingDetector::disabled(),
            AudioPlayer::disabled(),
        );
        (e, tx)
    }

    fn run(e: &mut Engine, t: &mut Instant, frames: usize) {
        for _ in 0..frames {
            *t += STEP;
            e.tick(Frame::new(W, H), *t);
        }
    }

    fn shield_state(e: &Engine) -> Option<SpellState> {
        e.registry()
            .active_spells()
            .iter()
            .find(|s| s.kind() == SpellKind::Shield)
            .map(|s| s.state())
    }

    #[test]
    fn default_bindings_are_installed() {
        let (e, _tx) = engine(AppMode::Combined);
        assert_eq!(e.registry().binding("hold_start_fist"), Some(SpellKind::Shield));
        assert_eq!(e.registry().binding("swipe_up"), Some(SpellKind::Fireball));
        assert_eq!(e.registry().binding("tap_open_palm"), Some(SpellKind::ForcePush));
        assert_eq!(e.registry().binding("hold_start_peace"), None);
    }

    #[test]
    fn held_fist_casts_shield_and_release_dismisses_it() {
        let (mut e, tx) = engine(AppMode::Spell);
        let mut t = Instant::now();
        tx.send(HandInput::Move(Point::new(0.5, 0.5))).unwrap();
        tx.send(HandInput::Pose(GestureType::Fist)).unwrap();

        // 5 frames to confirm, then 0.5 s of holding.
        run(&mut e, &mut t, 30);
        assert_eq!(e.gesture().current_gesture, GestureType::Fist);
        assert!(e.gesture().is_holding);
        assert_eq!(shield_state(&e), Some(SpellState::Active));
        // Cast costs 10, regenerated at 8/s for about a third of a second since.
        assert!(e.registry().mana().current() < 95.0);

        tx.send(HandInput::Pose(GestureType::Peace)).unwrap();
        run(&mut e, &mut t, 5);
        assert_eq!(e.gesture().current_gesture, GestureType::Peace);
        assert_eq!(shield_state(&e), Some(SpellState::Fading));

        run(&mut e, &mut t, 15);
        assert_eq!(shield_state(&e), None);
    }

    #[test]
    fn output_carries_the_mana_bar_in_spell_mode() {
        let (mut e, _tx) = engine(AppMode::Spell);
        let out = e.tick(Frame::new(W, H), Instant::now());
        assert!(!out.is_black());
        assert_eq!(e.frame_number(), 1);
    }

    #[test]
    fn swipe_cycles_hud_mode() {
        let (mut e, tx) = engine(AppMode::Hud);
        let mut t = Instant::now();
        tx.send(HandInput::Pose(GestureType::Point)).unwrap();
        assert_eq!(e.hud_mode(), HudMode::Combat);

        for i in 0..5 {
            tx.send(HandInput::Move(Point::new(0.3 + 0.03 * i as f32, 0.5))).unwrap();
            run(&mut e, &mut t, 1);
        }
        assert_eq!(e.hud_mode(), HudMode::Scan);
        // Hud-only: the swipe never reaches the spell registry.
        assert_eq!(e.registry().active_count(), 0);
    }

    #[test]
    fn spell_mode_draws_no_hud() {
        let (mut e, _tx) = engine(AppMode::Spell);
        let mut settings = Settings::default();
        settings.spells.show_mana_bar = false;
        e.settings = settings;
        let out = e.tick(Frame::new(W, H), Instant::now());
        assert!(out.is_black());
    }

    #[test]
    fn hud_mode_draws_widgets() {
        let (mut e, _tx) = engine(AppMode::Hud);
        let out = e.tick(Frame::new(W, H), Instant::now());
        assert!(!out.is_black());
    }

    #[test]
    fn thumbs_up_hold_saves_a_screenshot() {
        let dir = std::env::temp_dir().join(format!("spellcaster_engine_{}", std::process::id()));
        let (mut e, tx) = engine(AppMode::Combined);
        e.set_screenshot_dir(Some(dir.clone()));
        let mut t = Instant::now();
        tx.send(HandInput::Move(Point::new(0.5, 0.5))).unwrap();
        tx.send(HandInput::Pose(GestureType::ThumbsUp)).unwrap();
        run(&mut e, &mut t, 30);
        assert_eq!(e.screenshots().len(), 1);
        assert!(e.screenshots()[0].exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stalled_frames_are_clamped() {
        let (mut e, tx) = engine(AppMode::Spell);
        let mut t = Instant::now();
        tx.send(HandInput::Move(Point::new(0.5, 0.5))).unwrap();
        tx.send(HandInput::Pose(GestureType::Fist)).unwrap();
        run(&mut e, &mut t, 30);
        e.registry_mut().dismiss_sustained();
        // A ten second stall counts as 0.1 s: 0.03 of shrink from ~0.08.
        t += Duration::from_secs(10);
        e.tick(Frame::new(W, H), t);
        assert_eq!(shield_state(&e), Some(SpellState::Fading));
    }
}
