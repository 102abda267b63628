//! Spell registry: trigger bindings, mana, cooldowns and the active list.
//!
//! ```text
//!  GestureEvent + gesture name
//!        │  trigger key ("hold_start_fist", falls back to "hold_start")
//!        ▼
//!  binding ──▶ cooldown ready? ──▶ enough mana? ──▶ spend, arm, cast, play cue
//!                   │ no                │ no
//!                   └─ debug!, None     └─ debug!, None
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gesture_core::{GestureEvent, Point};
use particle_fx::{Frame, ParticleEngine, ScreenEffects};
use rand::rngs::StdRng;
use rand::SeedableRng;
use spell_audio::AudioPlayer;
use tracing::{debug, info};

use super::{Spell, SpellContext, SpellKind};

// ════════════════════════════════════════════════════════════════════════════
// ManaSystem
// ════════════════════════════════════════════════════════════════════════════

/// Mana pool; `0 ≤ current ≤ max` after every operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ManaSystem {
    max:        u32,
    current:    f32,
    regen_rate: f32,
}

impl ManaSystem {
    /// A full pool.
    pub fn new(max: u32, regen_rate: f32) -> Self {
        Self { max, current: max as f32, regen_rate: regen_rate.max(0.0) }
    }

    pub fn max(&self)        -> u32 { self.max }
    pub fn current(&self)    -> f32 { self.current }
    pub fn regen_rate(&self) -> f32 { self.regen_rate }

    pub fn can_cast(&self, cost: u32) -> bool { self.current >= cost as f32 }

    /// Deduct `cost`; leaves the pool untouched and returns false when short.
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_cast(cost) {
            return false;
        }
        self.current -= cost as f32;
        true
    }

    pub fn regenerate(&mut self, dt: f32) {
        self.current = (self.current + self.regen_rate * dt.max(0.0)).min(self.max as f32);
    }

    /// Fill fraction in [0, 1]; 0 for an empty-capacity pool.
    pub fn ratio(&self) -> f32 {
        if self.max == 0 { 0.0 } else { self.current / self.max as f32 }
    }
}

impl Default for ManaSystem {
    fn default() -> Self { Self::new(100, 8.0) }
}

// ════════════════════════════════════════════════════════════════════════════
// SpellCooldown
// ════════════════════════════════════════════════════════════════════════════

/// Ready-at instants per spell name.  Unseen names are always ready.
#[derive(Clone, Debug, Default)]
pub struct SpellCooldown {
    ready_at: HashMap<String, Instant>,
}

impl SpellCooldown {
    pub fn new() -> Self { Self::default() }

    pub fn is_ready(&self, name: &str) -> bool { self.is_ready_at(name, Instant::now()) }

    pub fn is_ready_at(&self, name: &str, now: Instant) -> bool {
        self.ready_at.get(name).map_or(true, |&t| now >= t)
    }

    pub fn trigger(&mut self, name: &str, seconds: f32) { self.trigger_at(name, seconds, Instant::now()) }

    pub fn trigger_at(&mut self, name: &str, seconds: f32, now: Instant) {
        let wait = Duration::from_secs_f32(seconds.max(0.0));
        self.ready_at.insert(name.to_string(), now + wait);
    }

    /// Seconds until ready, 0 when ready.
    pub fn remaining(&self, name: &str) -> f32 { self.remaining_at(name, Instant::now()) }

    pub fn remaining_at(&self, name: &str, now: Instant) -> f32 {
        self.ready_at
            .get(name)
            .map_or(0.0, |&t| t.saturating_duration_since(now).as_secs_f32())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SpellRegistry
// ════════════════════════════════════════════════════════════════════════════

pub struct SpellRegistry {
    bindings:  HashMap<String, SpellKind>,
    mana:      ManaSystem,
    cooldowns: SpellCooldown,
    active:    Vec<Spell>,
    audio:     AudioPlayer,
    rng:       StdRng,
}

impl SpellRegistry {
    pub fn new(mana: ManaSystem, audio: AudioPlayer) -> Self {
        Self::with_rng(mana, audio, StdRng::from_entropy())
    }

    /// Deterministic spell randomness.
    pub fn with_rng(mana: ManaSystem, audio: AudioPlayer, rng: StdRng) -> Self {
        Self {
            bindings:  HashMap::new(),
            mana,
            cooldowns: SpellCooldown::new(),
            active:    Vec::new(),
            audio,
            rng,
        }
    }

    pub fn mana(&self)      -> &ManaSystem    { &self.mana }
    pub fn cooldowns(&self) -> &SpellCooldown { &self.cooldowns }
    pub fn audio(&self)     -> &AudioPlayer   { &self.audio }
    pub fn audio_mut(&mut self) -> &mut AudioPlayer { &mut self.audio }

    /// Bind `trigger` (e.g. `hold_start_fist`, `swipe_up`) to a spell kind.
    /// A later binding for the same key replaces the earlier one.
    pub fn register(&mut self, trigger: &str, kind: SpellKind) {
        debug!(spell = kind.name(), trigger, "registered spell");
        self.bindings.insert(trigger.to_string(), kind);
    }

    pub fn binding(&self, trigger: &str) -> Option<SpellKind> { self.bindings.get(trigger).copied() }

    /// Try to cast whatever `event` (qualified by the current gesture name,
    /// empty for none) is bound to.  `None` when nothing is bound, the spell
    /// is cooling down or mana is short.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_event(
        &mut self,
        event:     GestureEvent,
        x:         f32,
        y:         f32,
        gesture:   &str,
        particles: &mut ParticleEngine,
        screen:    &mut ScreenEffects,
    ) -> Option<&Spell> {
        self.handle_event_at(event, x, y, gesture, particles, screen, Instant::now())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_event_at(
        &mut self,
        event:     GestureEvent,
        x:         f32,
        y:         f32,
        gesture:   &str,
        particles: &mut ParticleEngine,
        screen:    &mut ScreenEffects,
        now:       Instant,
    ) -> Option<&Spell> {
        let kind = self.resolve(event, gesture)?;
        let name = kind.name();

        if !self.cooldowns.is_ready_at(name, now) {
            debug!(spell = name, remaining = self.cooldowns.remaining_at(name, now), "spell on cooldown");
            return None;
        }
        if !self.mana.spend(kind.mana_cost()) {
            debug!(spell = name, need = kind.mana_cost(), have = self.mana.current(), "not enough mana");
            return None;
        }
        self.cooldowns.trigger_at(name, kind.cooldown(), now);

        let mut spell = Spell::new(kind);
        if event == GestureEvent::SwipeLeft {
            spell.set_direction(-1.0);
        }
        let mut ctx = SpellContext { particles, screen, rng: &mut self.rng };
        spell.cast(x, y, &mut ctx);
        self.audio.play(name);

        info!(
            spell = name,
            "Cast at ({:.2}, {:.2}) | mana {:.0}/{}",
            x, y, self.mana.current(), self.mana.max()
        );
        self.active.push(spell);
        self.active.last()
    }

    /// Gesture-qualified key first, then the bare event key.
    fn resolve(&self, event: GestureEvent, gesture: &str) -> Option<SpellKind> {
        let base = event.trigger_name()?;
        if !gesture.is_empty() {
            if let Some(kind) = self.binding(&format!("{}_{}", base, gesture)) {
                return Some(kind);
            }
        }
        self.binding(base)
    }

    /// Regenerate mana, advance every spell, then drop the dead.
    pub fn update(
        &mut self,
        dt:        f32,
        hand:      Option<Point>,
        particles: &mut ParticleEngine,
        screen:    &mut ScreenEffects,
    ) {
        self.mana.regenerate(dt);
        let mut ctx = SpellContext { particles, screen, rng: &mut self.rng };
        for spell in &mut self.active {
            spell.update(dt, hand, &mut ctx);
        }
        self.active.retain(Spell::is_alive);
    }

    /// Draw in cast order, so newer spells land on top.
    pub fn render(&self, frame: &mut Frame) {
        for spell in &self.active {
            spell.render(frame);
        }
    }

    /// Dismiss every sustained spell (shields) still up.
    pub fn dismiss_sustained(&mut self) {
        for spell in self.active.iter_mut().filter(|s| s.supports_dismiss()) {
            spell.dismiss();
        }
    }

    pub fn active_spells(&self) -> &[Spell] { &self.active }
    pub fn active_count(&self)  -> usize    { self.active.len() }

    /// Newest live spell, for the on-screen banner.
    pub fn latest(&self) -> Option<&Spell> { self.active.last() }

    pub fn clear(&mut self) { self.active.clear(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::SpellState;
    use super::*;

    fn registry() -> SpellRegistry {
        SpellRegistry::with_rng(ManaSystem::new(100, 8.0), AudioPlayer::disabled(), StdRng::seed_from_u64(3))
    }

    #[test]
    fn mana_spend_and_regen_stay_in_bounds() {
        let mut m = ManaSystem::new(100, 8.0);
        assert!(m.spend(30));
        assert_eq!(m.current(), 70.0);
        m.current = 5.0;
        assert!(!m.spend(10));
        assert_eq!(m.current(), 5.0);
        m.regenerate(100.0);
        assert_eq!(m.current(), 100.0);
        assert_eq!(m.ratio(), 1.0);
        assert_eq!(ManaSystem::new(0, 1.0).ratio(), 0.0);
    }

    #[test]
    fn cooldown_ready_only_after_duration() {
        let mut c = SpellCooldown::new();
        let t0 = Instant::now();
        assert!(c.is_ready_at("fireball", t0));
        c.trigger_at("fireball", 1.5, t0);
        assert!(!c.is_ready_at("fireball", t0));
        assert!(!c.is_ready_at("fireball", t0 + Duration::from_millis(1400)));
        assert!(c.is_ready_at("fireball", t0 + Duration::from_millis(1500)));
        assert!((c.remaining_at("fireball", t0 + Duration::from_millis(500)) - 1.0).abs() < 1e-3);
        assert_eq!(c.remaining_at("wind", t0), 0.0);
    }

    #[test]
    fn fireball_costs_mana_then_cools_down() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("swipe_up", SpellKind::Fireball);
        let t0 = Instant::now();

        let cast = r.handle_event_at(GestureEvent::SwipeUp, 0.5, 0.5, "", &mut h.particles, &mut h.screen, t0);
        let spell = cast.expect("fireball should cast");
        assert_eq!(spell.kind(), SpellKind::Fireball);
        assert!(spell.is_alive());
        assert_eq!(r.mana().current(), 80.0);

        let again = r.handle_event_at(GestureEvent::SwipeUp, 0.5, 0.5, "", &mut h.particles, &mut h.screen, t0);
        assert!(again.is_none());
        assert_eq!(r.mana().current(), 80.0);
        assert_eq!(r.active_count(), 1);

        let later = t0 + Duration::from_secs(2);
        assert!(r.handle_event_at(GestureEvent::SwipeUp, 0.5, 0.5, "", &mut h.particles, &mut h.screen, later).is_some());
    }

    #[test]
    fn bare_event_key_backs_up_gesture_keys() {
        let mut h = Harness::new();
        let t0 = Instant::now();

        // Only the bare key is bound: a swipe with an open palm still casts wind.
        let mut r = registry();
        r.register("swipe_left", SpellKind::Wind);
        assert_eq!(r.binding("swipe_left_open_palm"), None);
        let cast = r.handle_event_at(GestureEvent::SwipeLeft, 0.5, 0.5, "open_palm", &mut h.particles, &mut h.screen, t0);
        assert_eq!(cast.map(|s| s.kind()), Some(SpellKind::Wind));

        let mut r = registry();
        r.register("swipe_left", SpellKind::Wind);
        let cast = r.handle_event_at(GestureEvent::SwipeLeft, 0.5, 0.5, "", &mut h.particles, &mut h.screen, t0);
        assert_eq!(cast.map(|s| s.kind()), Some(SpellKind::Wind));

        // A gesture-qualified binding wins over the bare key.
        let mut r = registry();
        r.register("swipe_left", SpellKind::Wind);
        r.register("swipe_left_open_palm", SpellKind::Fireball);
        let cast = r.handle_event_at(GestureEvent::SwipeLeft, 0.5, 0.5, "open_palm", &mut h.particles, &mut h.screen, t0);
        assert_eq!(cast.map(|s| s.kind()), Some(SpellKind::Fireball));

        // Other gestures still reach the bare key.
        let cast = r.handle_event_at(GestureEvent::SwipeLeft, 0.5, 0.5, "fist", &mut h.particles, &mut h.screen, t0);
        assert_eq!(cast.map(|s| s.kind()), Some(SpellKind::Wind));
    }

    #[test]
    fn shield_dismissed_fades_out() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("hold_start_fist", SpellKind::Shield);

        let cast = r.handle_event(GestureEvent::HoldStart, 0.5, 0.5, "fist", &mut h.particles, &mut h.screen);
        assert_eq!(cast.map(|s| s.kind()), Some(SpellKind::Shield));

        for _ in 0..15 {
            r.update(1.0 / 30.0, Some(Point::new(0.5, 0.5)), &mut h.particles, &mut h.screen);
        }
        r.dismiss_sustained();
        assert_eq!(r.active_spells()[0].state(), SpellState::Fading);

        for _ in 0..30 {
            r.update(1.0 / 30.0, None, &mut h.particles, &mut h.screen);
        }
        assert_eq!(r.active_count(), 0);
    }

    #[test]
    fn short_mana_rejects_without_arming_cooldown() {
        let mut h = Harness::new();
        let mut r = SpellRegistry::with_rng(ManaSystem::new(20, 0.0), AudioPlayer::disabled(), StdRng::seed_from_u64(1));
        r.register("hold_start_pinch", SpellKind::Teleport);
        let t0 = Instant::now();
        assert!(r.handle_event_at(GestureEvent::HoldStart, 0.5, 0.5, "pinch", &mut h.particles, &mut h.screen, t0).is_none());
        assert!(r.cooldowns().is_ready_at("teleport", t0));
        assert_eq!(r.mana().current(), 20.0);
    }

    #[test]
    fn unbound_events_do_nothing() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("hold_start_fist", SpellKind::Shield);
        assert!(r.handle_event(GestureEvent::None, 0.5, 0.5, "fist", &mut h.particles, &mut h.screen).is_none());
        assert!(r.handle_event(GestureEvent::HoldStart, 0.5, 0.5, "peace", &mut h.particles, &mut h.screen).is_none());
        assert!(r.handle_event(GestureEvent::HoldStart, 0.5, 0.5, "", &mut h.particles, &mut h.screen).is_none());
        assert_eq!(r.mana().current(), 100.0);
    }

    #[test]
    fn specific_binding_wins_then_falls_back_to_base() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("tap", SpellKind::Lightning);
        r.register("tap_open_palm", SpellKind::ForcePush);
        let a = r.handle_event(GestureEvent::Tap, 0.5, 0.5, "open_palm", &mut h.particles, &mut h.screen).map(|s| s.kind());
        assert_eq!(a, Some(SpellKind::ForcePush));
        let b = r.handle_event(GestureEvent::Tap, 0.5, 0.5, "fist", &mut h.particles, &mut h.screen).map(|s| s.kind());
        assert_eq!(b, Some(SpellKind::Lightning));
    }

    #[test]
    fn swipe_left_wind_blows_left() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("swipe_left", SpellKind::Wind);
        r.handle_event(GestureEvent::SwipeLeft, 0.5, 0.5, "open_palm", &mut h.particles, &mut h.screen);
        assert!(h.particles.count() > 0);
        assert!(h.particles.particles().all(|p| p.vx < 0.0));
    }

    #[test]
    fn update_regenerates_and_clear_empties() {
        let mut h = Harness::new();
        let mut r = registry();
        r.register("swipe_up", SpellKind::Fireball);
        r.handle_event(GestureEvent::SwipeUp, 0.2, 0.8, "", &mut h.particles, &mut h.screen);
        r.update(0.5, None, &mut h.particles, &mut h.screen);
        assert_eq!(r.mana().current(), 84.0);
        assert_eq!(r.latest().map(|s| s.kind()), Some(SpellKind::Fireball));
        r.clear();
        assert_eq!(r.active_count(), 0);
    }
}
