//! Heads-up display: a registry of widgets drawn onto a black overlay.
//!
//! | Widget | Modes | Shows |
//! |---|---|---|
//! | [`ModeMenu`]         | all | current mode, swipe to cycle |
//! | [`TargetingReticle`] | COMBAT, SCAN | reticle on the index fingertip, lock-on |
//! | [`StatsPanel`]       | all | FPS, pool load, spells, clock, frame |
//! | [`Radar`]            | COMBAT, SCAN | sweep and detection blips |
//! | [`ObjectTags`]       | COMBAT, SCAN | bracketed labels on detections |
//!
//! Widgets outside the current mode are frozen: neither updated nor drawn.
//! The menu is registered first so a mode switch applies to every later
//! widget in the same frame.

pub mod menu;
pub mod object_tags;
pub mod radar;
pub mod stats;
pub mod targeting;

use std::time::Instant;

use gesture_core::{GestureState, HandSnapshot};
use particle_fx::{Frame, Rgb};
use tracing::debug;

use crate::vision::Detection;

pub use menu::ModeMenu;
pub use object_tags::ObjectTags;
pub use radar::Radar;
pub use stats::StatsPanel;
pub use targeting::TargetingReticle;

/// Background of HUD panels.
pub(crate) const PANEL_BG: Rgb = Rgb(15, 15, 15);

// ════════════════════════════════════════════════════════════════════════════
// HudMode / HudTheme
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HudMode {
    #[default]
    Combat,
    Scan,
    Navigation,
}

impl HudMode {
    /// Cycle order of the mode menu.
    pub const ALL: [HudMode; 3] = [HudMode::Combat, HudMode::Scan, HudMode::Navigation];

    pub fn label(self) -> &'static str {
        match self {
            HudMode::Combat     => "COMBAT",
            HudMode::Scan       => "SCAN",
            HudMode::Navigation => "NAV",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            HudMode::Combat     => Rgb(255, 100, 0),
            HudMode::Scan       => Rgb(200, 255, 0),
            HudMode::Navigation => Rgb(0, 200, 255),
        }
    }

    /// Position in [`HudMode::ALL`].
    pub fn index(self) -> usize {
        match self {
            HudMode::Combat     => 0,
            HudMode::Scan       => 1,
            HudMode::Navigation => 2,
        }
    }
}

/// Colours shared by the widgets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudTheme {
    pub primary:   Rgb,
    pub secondary: Rgb,
    pub alert:     Rgb,
}

impl Default for HudTheme {
    fn default() -> Self {
        Self {
            primary:   Rgb(200, 255, 0),
            secondary: Rgb(0, 170, 255),
            alert:     Rgb(255, 100, 0),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HudState
// ════════════════════════════════════════════════════════════════════════════

/// Everything a widget may look at for one frame.
#[derive(Clone, Debug)]
pub struct HudState {
    pub frame_size:   (usize, usize),
    pub hands:        Vec<HandSnapshot>,
    pub gesture:      GestureState,
    pub detections:   Vec<Detection>,
    pub mode:         HudMode,
    pub fps:          f32,
    pub frame_number: u64,
    /// Sampled once per frame; widgets never read the clock themselves.
    pub now:          Instant,
    /// Live particles and pool capacity.
    pub particles:    (usize, usize),
    pub spells:       usize,
}

impl HudState {
    pub fn new(frame_size: (usize, usize), now: Instant) -> Self {
        Self {
            frame_size,
            hands:        Vec::new(),
            gesture:      GestureState::default(),
            detections:   Vec::new(),
            mode:         HudMode::default(),
            fps:          0.0,
            frame_number: 0,
            now,
            particles:    (0, 0),
            spells:       0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Widget
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub enum WidgetBody {
    ModeMenu(ModeMenu),
    Targeting(TargetingReticle),
    Stats(StatsPanel),
    Radar(Radar),
    ObjectTags(ObjectTags),
}

impl WidgetBody {
    fn default_modes(&self) -> &'static [HudMode] {
        const ALL: &[HudMode] = &HudMode::ALL;
        const FIELD: &[HudMode] = &[HudMode::Combat, HudMode::Scan];
        match self {
            WidgetBody::ModeMenu(_) | WidgetBody::Stats(_) => ALL,
            WidgetBody::Targeting(_) | WidgetBody::Radar(_) | WidgetBody::ObjectTags(_) => FIELD,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Widget {
    enabled: bool,
    modes:   Vec<HudMode>,
    body:    WidgetBody,
}

impl Widget {
    /// Enabled, active in the body's usual modes.
    pub fn new(body: WidgetBody) -> Self {
        Self { enabled: true, modes: body.default_modes().to_vec(), body }
    }

    /// Restrict to `modes`.
    pub fn only_in(mut self, modes: &[HudMode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn name(&self) -> &'static str {
        match self.body {
            WidgetBody::ModeMenu(_)   => "mode_menu",
            WidgetBody::Targeting(_)  => "targeting",
            WidgetBody::Stats(_)      => "stats",
            WidgetBody::Radar(_)      => "radar",
            WidgetBody::ObjectTags(_) => "object_tags",
        }
    }

    pub fn body(&self)    -> &WidgetBody { &self.body }
    pub fn enabled(&self) -> bool        { self.enabled }
    pub fn modes(&self)   -> &[HudMode]  { &self.modes }

    pub fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled; }

    pub fn is_active(&self, mode: HudMode) -> bool {
        self.enabled && self.modes.contains(&mode)
    }

    /// Advance one frame.  Only the menu writes to `state`.
    pub fn update(&mut self, state: &mut HudState) {
        match &mut self.body {
            WidgetBody::ModeMenu(w)   => w.update(state),
            WidgetBody::Targeting(w)  => w.update(state),
            WidgetBody::Stats(w)      => w.update(state),
            WidgetBody::Radar(w)      => w.update(state),
            WidgetBody::ObjectTags(w) => w.update(state),
        }
    }

    pub fn render(&self, overlay: &mut Frame, state: &HudState) {
        match &self.body {
            WidgetBody::ModeMenu(w)   => w.render(overlay, state),
            WidgetBody::Targeting(w)  => w.render(overlay, state),
            WidgetBody::Stats(w)      => w.render(overlay, state),
            WidgetBody::Radar(w)      => w.render(overlay, state),
            WidgetBody::ObjectTags(w) => w.render(overlay, state),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WidgetRegistry
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct WidgetRegistry {
    widgets: Vec<Widget>,
}

impl WidgetRegistry {
    pub fn new() -> Self { Self::default() }

    /// The stock layout: menu first, then reticle, stats, radar and tags.
    pub fn standard(theme: HudTheme) -> Self {
        let mut reg = Self::new();
        reg.register(Widget::new(WidgetBody::ModeMenu(ModeMenu::new())));
        reg.register(Widget::new(WidgetBody::Targeting(TargetingReticle::new(theme))));
        reg.register(Widget::new(WidgetBody::Stats(StatsPanel::new(theme))));
        reg.register(Widget::new(WidgetBody::Radar(Radar::new(theme))));
        reg.register(Widget::new(WidgetBody::ObjectTags(ObjectTags::new(theme))));
        reg
    }

    pub fn register(&mut self, widget: Widget) {
        debug!(widget = widget.name(), modes = ?widget.modes(), "registered widget");
        self.widgets.push(widget);
    }

    pub fn widgets(&self) -> &[Widget] { &self.widgets }
    pub fn widgets_mut(&mut self) -> &mut [Widget] { &mut self.widgets }
    pub fn len(&self) -> usize { self.widgets.len() }
    pub fn is_empty(&self) -> bool { self.widgets.is_empty() }

    pub fn get_active(&self, mode: HudMode) -> Vec<&Widget> {
        self.widgets.iter().filter(|w| w.is_active(mode)).collect()
    }

    /// Update active widgets in registration order.  Activity is checked
    /// against `state.mode` as it stands when each widget's turn comes.
    pub fn update_all(&mut self, state: &mut HudState) {
        for widget in &mut self.widgets {
            if widget.is_active(state.mode) {
                widget.update(state);
            }
        }
    }

    pub fn render_all(&self, overlay: &mut Frame, state: &HudState) {
        for widget in &self.widgets {
            if widget.is_active(state.mode) {
                widget.render(overlay, state);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Drawing helpers
// ════════════════════════════════════════════════════════════════════════════

/// Straight arrow from `(x0, y0)` to `(x1, y1)`; `tip` is the barb length as
/// a fraction of the shaft.
pub(crate) fn draw_arrow(frame: &mut Frame, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb, tip: f32) {
    frame.draw_line(x0, y0, x1, y1, color, 1);
    let (dx, dy) = ((x1 - x0) as f32, (y1 - y0) as f32);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return;
    }
    let back = dy.atan2(dx) + std::f32::consts::PI;
    let barb = len * tip;
    for side in [-1.0_f32, 1.0] {
        let a = back + side * std::f32::consts::FRAC_PI_4;
        let bx = x1 + (barb * a.cos()).round() as i32;
        let by = y1 + (barb * a.sin()).round() as i32;
        frame.draw_line(x1, y1, bx, by, color, 1);
    }
}

/// `text` with its baseline at `y`, the way overlay labels are positioned.
pub(crate) fn draw_label(frame: &mut Frame, text: &str, x: i32, y: i32, scale: i32, color: Rgb) {
    frame.draw_text(text, x, y - 5 * scale.max(1), scale, color);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::GestureEvent;

    fn radar_only_in_combat() -> Widget {
        Widget::new(WidgetBody::Radar(Radar::new(HudTheme::default()))).only_in(&[HudMode::Combat])
    }

    fn sweep(reg: &WidgetRegistry) -> f32 {
        reg.widgets().iter()
            .find_map(|w| match w.body() {
                WidgetBody::Radar(r) => Some(r.sweep_angle()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn default_modes() {
        let theme = HudTheme::default();
        let reg = WidgetRegistry::standard(theme);
        let names: Vec<_> = reg.get_active(HudMode::Navigation).iter().map(|w| w.name()).collect();
        assert_eq!(names, ["mode_menu", "stats"]);
        assert_eq!(reg.get_active(HudMode::Combat).len(), 5);
    }

    #[test]
    fn combat_only_widget_is_frozen_in_navigation() {
        let mut reg = WidgetRegistry::new();
        reg.register(radar_only_in_combat());
        let mut state = HudState::new((320, 240), Instant::now());
        state.mode = HudMode::Navigation;

        for _ in 0..10 {
            reg.update_all(&mut state);
        }
        assert_eq!(sweep(&reg), 0.0);

        let mut overlay = Frame::new(320, 240);
        reg.render_all(&mut overlay, &state);
        assert!(overlay.is_black());

        state.mode = HudMode::Combat;
        reg.update_all(&mut state);
        reg.render_all(&mut overlay, &state);
        assert_eq!(sweep(&reg), 3.0);
        assert!(!overlay.is_black());
    }

    #[test]
    fn disabled_widget_is_skipped() {
        let mut reg = WidgetRegistry::new();
        let mut w = radar_only_in_combat();
        w.set_enabled(false);
        reg.register(w);
        let mut state = HudState::new((320, 240), Instant::now());
        reg.update_all(&mut state);
        assert_eq!(sweep(&reg), 0.0);
        assert!(reg.get_active(HudMode::Combat).is_empty());
    }

    #[test]
    fn mode_switch_reaches_later_widgets_same_frame() {
        let mut reg = WidgetRegistry::new();
        reg.register(Widget::new(WidgetBody::ModeMenu(ModeMenu::starting_in(HudMode::Navigation))));
        reg.register(radar_only_in_combat());
        let mut state = HudState::new((320, 240), Instant::now());
        state.mode = HudMode::Navigation;
        state.gesture.event = GestureEvent::SwipeRight;

        reg.update_all(&mut state);
        assert_eq!(state.mode, HudMode::Combat);
        assert_eq!(sweep(&reg), 3.0);
    }

    #[test]
    fn arrow_has_barbs() {
        let mut f = Frame::new(40, 20);
        draw_arrow(&mut f, 30, 10, 10, 10, Rgb::WHITE, 0.4);
        assert_eq!(f.get_pixel(20, 10), Some(Rgb::WHITE));
        let barb_pixels = f.pixels().iter().enumerate()
            .filter(|&(i, &p)| p != 0 && i / 40 != 10)
            .count();
        assert!(barb_pixels >= 4);
    }
}
