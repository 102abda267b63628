//! Final-pass drawing on the composited frame: HUD blend, hand skeletons,
//! mana bar and the name of the spell just cast.

use gesture_core::geometry::HAND_CONNECTIONS;
use gesture_core::HandSnapshot;
use particle_fx::{blend_rgb, text_width, Frame, Rgb};

use crate::spells::{ManaSystem, Spell, SpellKind};

// ════════════════════════════════════════════════════════════════════════════
// HUD composite
// ════════════════════════════════════════════════════════════════════════════

/// Blend every non-black `overlay` pixel onto `frame` at `opacity`.
/// Black overlay pixels leave the frame untouched.
pub fn composite(frame: &mut Frame, overlay: &Frame, opacity: f32) {
    if overlay.width() != frame.width() || overlay.height() != frame.height() {
        return;
    }
    let opacity = opacity.clamp(0.0, 1.0);
    for (dst, &src) in frame.pixels_mut().iter_mut().zip(overlay.pixels()) {
        if src & 0x00FF_FFFF != 0 {
            *dst = blend_rgb(Rgb::from_u32(*dst), Rgb::from_u32(src), opacity).to_u32();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Skeleton
// ════════════════════════════════════════════════════════════════════════════

/// Bones in half the HUD colour, joints as small dots.
pub fn draw_skeleton(frame: &mut Frame, hands: &[HandSnapshot], color: Rgb) {
    let color = Rgb(color.0 / 2, color.1 / 2, color.2 / 2);
    let (w, h) = (frame.width(), frame.height());
    for hand in hands {
        let pts: Vec<(i32, i32)> = hand.landmarks().iter().map(|p| p.pixel(w, h)).collect();
        for &(a, b) in HAND_CONNECTIONS.iter() {
            frame.draw_line(pts[a].0, pts[a].1, pts[b].0, pts[b].1, color, 1);
        }
        for &(x, y) in &pts {
            frame.fill_circle(x, y, 2, color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Mana bar
// ════════════════════════════════════════════════════════════════════════════

const BAR_X: i32 = 20;
const BAR_W: i32 = 200;
const BAR_H: i32 = 14;
const BAR_BOTTOM_MARGIN: i32 = 30;
const BAR_BG: Rgb = Rgb(40, 40, 40);
const MANA_FULL: Rgb = Rgb(70, 130, 255);
const MANA_LOW: Rgb = Rgb(255, 70, 70);

/// Pixel width the mana bar is filled to.
pub fn mana_fill(mana: &ManaSystem) -> i32 {
    (BAR_W as f32 * mana.ratio().clamp(0.0, 1.0)) as i32
}

/// Bar along the bottom-left edge with a `MANA cur/max` caption.
pub fn draw_mana_bar(frame: &mut Frame, mana: &ManaSystem) {
    let y = frame.height() as i32 - BAR_BOTTOM_MARGIN - BAR_H;
    let color = if mana.ratio() < 0.25 { MANA_LOW } else { MANA_FULL };
    frame.fill_rect(BAR_X, y, BAR_W, BAR_H, BAR_BG);
    let fill = mana_fill(mana);
    if fill > 0 {
        frame.fill_rect(BAR_X, y, fill, BAR_H, color);
    }
    frame.stroke_rect(BAR_X, y, BAR_W, BAR_H, color);

    let caption = format!("MANA {:.0}/{}", mana.current(), mana.max());
    frame.draw_text(&caption, BAR_X, y - 14, 2, Rgb::WHITE);
}

// ════════════════════════════════════════════════════════════════════════════
// Spell banner
// ════════════════════════════════════════════════════════════════════════════

/// Seconds the banner stays up after a cast.
const BANNER_SECS: f32 = 1.5;
const BANNER_SCALE: i32 = 3;
const BANNER_Y: i32 = 70;

pub fn banner_color(kind: SpellKind) -> Rgb {
    match kind {
        SpellKind::Fireball  => Rgb(255, 120, 20),
        SpellKind::Lightning => Rgb(150, 180, 255),
        SpellKind::Shield    => Rgb(0, 150, 200),
        SpellKind::ForcePush => Rgb(0, 200, 200),
        SpellKind::Teleport  => Rgb(255, 120, 255),
        SpellKind::Wind      => Rgb(200, 230, 200),
    }
}

/// Name of `spell`, fading out over the first second and a half.
pub fn draw_spell_name(frame: &mut Frame, spell: &Spell) {
    let fade = 1.0 - spell.elapsed() / BANNER_SECS;
    if fade <= 0.0 {
        return;
    }
    let label = spell.kind().label();
    let x = (frame.width() as i32 - text_width(label, BANNER_SCALE)) / 2;
    frame.draw_text(label, x, BANNER_Y, BANNER_SCALE, banner_color(spell.kind()).scale(fade));
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::test_support::Harness;
    use crate::vision::hand_for;
    use gesture_core::{GestureType, Handedness, Point};

    #[test]
    fn composite_skips_black_and_blends_the_rest() {
        let mut frame = Frame::filled(2, 1, Rgb(100, 100, 100));
        let mut overlay = Frame::new(2, 1);
        overlay.set_pixel(1, 0, Rgb(200, 0, 0));
        composite(&mut frame, &overlay, 0.5);
        assert_eq!(frame.get_pixel(0, 0), Some(Rgb(100, 100, 100)));
        assert_eq!(frame.get_pixel(1, 0), Some(Rgb(150, 50, 50)));
    }

    #[test]
    fn composite_ignores_mismatched_sizes() {
        let mut frame = Frame::filled(4, 4, Rgb(9, 9, 9));
        let overlay = Frame::filled(2, 2, Rgb::WHITE);
        composite(&mut frame, &overlay, 1.0);
        assert!(frame.pixels().iter().all(|&p| Rgb::from_u32(p) == Rgb(9, 9, 9)));
    }

    #[test]
    fn skeleton_marks_joints_at_half_colour() {
        let mut f = Frame::new(200, 200);
        let lm = hand_for(GestureType::OpenPalm, Point::new(0.5, 0.5));
        let hand = HandSnapshot::new(lm, Handedness::Right, 0.9);
        draw_skeleton(&mut f, &[hand], Rgb(200, 100, 50));
        let (x, y) = lm[0].pixel(200, 200);
        assert_eq!(f.get_pixel(x, y), Some(Rgb(100, 50, 25)));
    }

    #[test]
    fn mana_bar_fill_tracks_ratio() {
        let mut mana = ManaSystem::new(100, 0.0);
        assert_eq!(mana_fill(&mana), BAR_W);
        mana.spend(60);
        assert_eq!(mana_fill(&mana), 80);

        let mut f = Frame::new(320, 240);
        draw_mana_bar(&mut f, &mana);
        let y = 240 - BAR_BOTTOM_MARGIN - BAR_H + BAR_H / 2;
        assert_eq!(f.get_pixel(BAR_X + 40, y), Some(MANA_FULL));
        assert_eq!(f.get_pixel(BAR_X + 120, y), Some(BAR_BG));
    }

    #[test]
    fn low_mana_turns_red() {
        let mut mana = ManaSystem::new(100, 0.0);
        mana.spend(90);
        let mut f = Frame::new(320, 240);
        draw_mana_bar(&mut f, &mana);
        let y = 240 - BAR_BOTTOM_MARGIN - BAR_H + BAR_H / 2;
        assert_eq!(f.get_pixel(BAR_X + 5, y), Some(MANA_LOW));
    }

    #[test]
    fn banner_fades_out() {
        let mut h = Harness::new();
        let mut spell = Spell::new(SpellKind::Shield);
        spell.cast(0.5, 0.5, &mut h.ctx());

        let mut fresh = Frame::new(320, 240);
        draw_spell_name(&mut fresh, &spell);
        assert!(!fresh.is_black());

        for _ in 0..20 {
            spell.update(0.1, Some(Point::new(0.5, 0.5)), &mut h.ctx());
        }
        let mut stale = Frame::new(320, 240);
        draw_spell_name(&mut stale, &spell);
        assert!(stale.is_black());
    }
}
