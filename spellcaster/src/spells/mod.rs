//! Spells: a closed set of kinds sharing one lifecycle.
//!
//! ```text
//!   CASTING ──cast──▶ ACTIVE ──timer / dismiss──▶ FADING ──▶ DONE
//!                        └──────────── timer ─────────────────▲
//! ```
//!
//! | Kind | Trigger (default) | Mana | Cooldown |
//! |---|---|---|---|
//! | [`SpellKind::Fireball`]  | `swipe_up` | 20 | 1.5 s |
//! | [`SpellKind::Lightning`] | `hold_start_point` | 15 | 0.8 s |
//! | [`SpellKind::Shield`]    | `hold_start_fist` | 10 | 0.5 s |
//! | [`SpellKind::ForcePush`] | `hold_start_open_palm`, `tap_open_palm` | 15 | 1.0 s |
//! | [`SpellKind::Teleport`]  | `hold_start_pinch` | 25 | 2.0 s |
//! | [`SpellKind::Wind`]      | `swipe_left`, `swipe_right` | 10 | 0.6 s |
//!
//! A [`Spell`] is the kind, the shared [`Lifecycle`] and a per-kind body.
//! Bodies get the particle engine, the screen effects and the RNG through
//! a [`SpellContext`] so none of them own global state.

pub mod fireball;
pub mod force_push;
pub mod lightning;
pub mod registry;
pub mod shield;
pub mod teleport;
pub mod wind;

use std::fmt;

use gesture_core::Point;
use particle_fx::{Frame, ParticleEngine, ScreenEffects};
use rand::rngs::StdRng;

use fireball::Fireball;
use force_push::ForcePush;
use lightning::Lightning;
use shield::Shield;
use teleport::Teleport;
use wind::Wind;

pub use registry::{ManaSystem, SpellCooldown, SpellRegistry};

// ════════════════════════════════════════════════════════════════════════════
// SpellKind
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpellKind {
    Fireball,
    Lightning,
    Shield,
    ForcePush,
    Teleport,
    Wind,
}

impl SpellKind {
    pub const ALL: [SpellKind; 6] = [
        SpellKind::Fireball, SpellKind::Lightning, SpellKind::Shield,
        SpellKind::ForcePush, SpellKind::Teleport, SpellKind::Wind,
    ];

    /// Identity used for cooldowns, audio cues and logs.
    pub fn name(self) -> &'static str {
        match self {
            SpellKind::Fireball  => "fireball",
            SpellKind::Lightning => "lightning",
            SpellKind::Shield    => "shield",
            SpellKind::ForcePush => "force_push",
            SpellKind::Teleport  => "teleport",
            SpellKind::Wind      => "wind",
        }
    }

    pub fn mana_cost(self) -> u32 {
        match self {
            SpellKind::Fireball  => 20,
            SpellKind::Lightning => 15,
            SpellKind::Shield    => 10,
            SpellKind::ForcePush => 15,
            SpellKind::Teleport  => 25,
            SpellKind::Wind      => 10,
        }
    }

    /// Seconds before the same kind may be cast again.
    pub fn cooldown(self) -> f32 {
        match self {
            SpellKind::Fireball  => 1.5,
            SpellKind::Lightning => 0.8,
            SpellKind::Shield    => 0.5,
            SpellKind::ForcePush => 1.0,
            SpellKind::Teleport  => 2.0,
            SpellKind::Wind      => 0.6,
        }
    }

    /// Banner text shown under the mana bar.
    pub fn label(self) -> &'static str {
        match self {
            SpellKind::Fireball  => "FIREBALL",
            SpellKind::Lightning => "LIGHTNING",
            SpellKind::Shield    => "SHIELD",
            SpellKind::ForcePush => "FORCE PUSH",
            SpellKind::Teleport  => "TELEPORT",
            SpellKind::Wind      => "WIND",
        }
    }
}

impl fmt::Display for SpellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Lifecycle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellState {
    Casting,
    Active,
    Fading,
    Done,
}

impl SpellState {
    /// Legal moves; staying put is always allowed.
    pub fn can_become(self, next: SpellState) -> bool {
        use SpellState::*;
        self == next
            || matches!(
                (self, next),
                (Casting, Active) | (Active, Fading) | (Active, Done) | (Fading, Done)
            )
    }
}

/// State and age shared by every spell body.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    state:   SpellState,
    elapsed: f32,
}

impl Lifecycle {
    fn new() -> Self { Self { state: SpellState::Casting, elapsed: 0.0 } }

    pub fn state(&self)   -> SpellState { self.state }
    pub fn elapsed(&self) -> f32        { self.elapsed }
    pub fn is(&self, state: SpellState) -> bool { self.state == state }

    /// Move to `next`.
    ///
    /// # Panics
    /// On an illegal move, e.g. DONE → ACTIVE.
    pub fn transition(&mut self, next: SpellState) {
        assert!(
            self.state.can_become(next),
            "illegal spell transition {:?} -> {:?}",
            self.state, next
        );
        self.state = next;
    }
}

/// Side-effect targets handed to a spell while it is cast or updated.
pub struct SpellContext<'a> {
    pub particles: &'a mut ParticleEngine,
    pub screen:    &'a mut ScreenEffects,
    pub rng:       &'a mut StdRng,
}

// ════════════════════════════════════════════════════════════════════════════
// Spell
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub enum SpellBody {
    Fireball(Fireball),
    Lightning(Lightning),
    Shield(Shield),
    ForcePush(ForcePush),
    Teleport(Teleport),
    Wind(Wind),
}

#[derive(Clone, Debug)]
pub struct Spell {
    kind:   SpellKind,
    life:   Lifecycle,
    origin: Point,
    body:   SpellBody,
}

impl Spell {
    /// A fresh instance in CASTING.
    pub fn new(kind: SpellKind) -> Self {
        let body = match kind {
            SpellKind::Fireball  => SpellBody::Fireball(Fireball::new()),
            SpellKind::Lightning => SpellBody::Lightning(Lightning::new()),
            SpellKind::Shield    => SpellBody::Shield(Shield::new()),
            SpellKind::ForcePush => SpellBody::ForcePush(ForcePush::new()),
            SpellKind::Teleport  => SpellBody::Teleport(Teleport::new()),
            SpellKind::Wind      => SpellBody::Wind(Wind::new()),
        };
        Self { kind, life: Lifecycle::new(), origin: Point::new(0.5, 0.5), body }
    }

    pub fn kind(&self)      -> SpellKind  { self.kind }
    pub fn name(&self)      -> &'static str { self.kind.name() }
    pub fn mana_cost(&self) -> u32        { self.kind.mana_cost() }
    pub fn cooldown(&self)  -> f32        { self.kind.cooldown() }
    pub fn state(&self)     -> SpellState { self.life.state() }
    pub fn elapsed(&self)   -> f32        { self.life.elapsed() }
    pub fn origin(&self)    -> Point      { self.origin }
    pub fn body(&self)      -> &SpellBody { &self.body }

    pub fn is_alive(&self) -> bool { !self.life.is(SpellState::Done) }

    /// Start the spell at the hand position; moves CASTING → ACTIVE.
    pub fn cast(&mut self, x: f32, y: f32, ctx: &mut SpellContext<'_>) {
        self.origin = Point::new(x, y);
        let life = &mut self.life;
        match &mut self.body {
            SpellBody::Fireball(b)  => b.cast(life, x, y, ctx),
            SpellBody::Lightning(b) => b.cast(life, x, y, ctx),
            SpellBody::Shield(b)    => b.cast(life, x, y, ctx),
            SpellBody::ForcePush(b) => b.cast(life, x, y, ctx),
            SpellBody::Teleport(b)  => b.cast(life, x, y, ctx),
            SpellBody::Wind(b)      => b.cast(life, x, y, ctx),
        }
    }

    /// Advance by `dt` seconds.  `hand` is the current palm centre, if any.
    pub fn update(&mut self, dt: f32, hand: Option<Point>, ctx: &mut SpellContext<'_>) {
        self.life.elapsed += dt;
        if self.life.is(SpellState::Done) {
            return;
        }
        let life = &mut self.life;
        match &mut self.body {
            SpellBody::Fireball(b)  => b.update(life, dt, ctx),
            SpellBody::Lightning(b) => b.update(life, hand, ctx),
            SpellBody::Shield(b)    => b.update(life, dt, hand, ctx),
            SpellBody::ForcePush(b) => b.update(life, dt),
            SpellBody::Teleport(b)  => b.update(life, ctx),
            SpellBody::Wind(b)      => b.update(life, dt, ctx),
        }
    }

    /// Draw spell geometry beyond its particles.
    pub fn render(&self, frame: &mut Frame) {
        if self.life.is(SpellState::Done) {
            return;
        }
        match &self.body {
            SpellBody::Fireball(b)  => b.render(&self.life, frame),
            SpellBody::Lightning(b) => b.render(&self.life, frame),
            SpellBody::Shield(b)    => b.render(&self.life, frame),
            SpellBody::ForcePush(b) => b.render(frame),
            SpellBody::Teleport(b)  => b.render(frame),
            SpellBody::Wind(_)      => {}
        }
    }

    /// Whether [`Spell::dismiss`] can end this spell early.
    pub fn supports_dismiss(&self) -> bool { matches!(self.body, SpellBody::Shield(_)) }

    /// ACTIVE → FADING for dismissible spells; a no-op otherwise.
    pub fn dismiss(&mut self) {
        if let SpellBody::Shield(b) = &mut self.body {
            b.dismiss(&mut self.life);
        }
    }

    /// Wind direction: positive blows right, negative left.  Other kinds ignore it.
    pub fn set_direction(&mut self, direction: f32) {
        if let SpellBody::Wind(b) = &mut self.body {
            b.set_direction(direction);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers shared by the bodies
// ════════════════════════════════════════════════════════════════════════════

/// Normalised point to pixel coordinates.
pub(crate) fn to_px(frame: &Frame, x: f32, y: f32) -> (i32, i32) {
    ((x * frame.width() as f32) as i32, (y * frame.height() as f32) as i32)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;

    #[test]
    fn stats_table() {
        assert_eq!(SpellKind::Fireball.mana_cost(), 20);
        assert_eq!(SpellKind::Teleport.cooldown(), 2.0);
        assert_eq!(SpellKind::ForcePush.name(), "force_push");
        let names: Vec<_> = SpellKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, spell_audio::KNOWN_CUES);
    }

    #[test]
    fn legal_transitions() {
        use SpellState::*;
        assert!(Casting.can_become(Active));
        assert!(Active.can_become(Fading));
        assert!(Active.can_become(Done));
        assert!(Fading.can_become(Done));
        assert!(Done.can_become(Done));
        assert!(!Done.can_become(Active));
        assert!(!Fading.can_become(Active));
        assert!(!Casting.can_become(Fading));
    }

    #[test]
    #[should_panic(expected = "illegal spell transition")]
    fn done_to_active_panics() {
        let mut life = Lifecycle::new();
        life.transition(SpellState::Active);
        life.transition(SpellState::Done);
        life.transition(SpellState::Active);
    }

    #[test]
    fn every_kind_casts_into_active() {
        for kind in SpellKind::ALL {
            let mut h = Harness::new();
            let mut s = Spell::new(kind);
            assert_eq!(s.state(), SpellState::Casting);
            s.cast(0.3, 0.4, &mut h.ctx());
            assert_eq!(s.state(), SpellState::Active, "{}", kind);
            assert_eq!(s.origin(), Point::new(0.3, 0.4));
        }
    }

    #[test]
    fn every_kind_eventually_dies() {
        for kind in SpellKind::ALL {
            let mut h = Harness::new();
            let mut s = Spell::new(kind);
            s.cast(0.5, 0.5, &mut h.ctx());
            let mut frame = Frame::new(64, 48);
            for _ in 0..400 {
                s.update(1.0 / 30.0, Some(Point::new(0.5, 0.5)), &mut h.ctx());
                s.render(&mut frame);
                s.dismiss();
            }
            assert!(!s.is_alive(), "{} still alive in {:?}", kind, s.state());
        }
    }

    #[test]
    fn only_shield_is_dismissible() {
        let dismissible: Vec<_> = SpellKind::ALL.iter()
            .filter(|&&k| Spell::new(k).supports_dismiss())
            .collect();
        assert_eq!(dismissible, [&SpellKind::Shield]);
    }

    #[test]
    fn dismiss_is_noop_for_other_kinds() {
        let mut h = Harness::new();
        let mut s = Spell::new(SpellKind::Lightning);
        s.cast(0.5, 0.5, &mut h.ctx());
        s.dismiss();
        assert_eq!(s.state(), SpellState::Active);
    }
}
