//! Software raster: a packed-pixel [`Frame`] and the drawing primitives the
//! particle engine, spells and HUD widgets paint with.
//!
//! Pixels are `0x00RRGGBB`, row-major, which is exactly what a `minifb`
//! window consumes.  Every primitive clips against the frame bounds, so
//! callers may pass coordinates that are partly or wholly off-screen.

// ════════════════════════════════════════════════════════════════════════════
// Rgb
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn r(self) -> u8 { self.0 }
    pub fn g(self) -> u8 { self.1 }
    pub fn b(self) -> u8 { self.2 }

    pub fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }

    pub fn from_u32(p: u32) -> Self {
        Rgb((p >> 16) as u8, (p >> 8) as u8, p as u8)
    }

    /// Multiply every channel by `k`, saturating.
    pub fn scale(self, k: f32) -> Self {
        let s = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
        Rgb(s(self.0), s(self.1), s(self.2))
    }

    /// Rec. 601 luma in `0..=255`.
    pub fn luma(self) -> f32 {
        0.299 * self.0 as f32 + 0.587 * self.1 as f32 + 0.114 * self.2 as f32
    }

    pub fn is_black(self) -> bool { self == Rgb::BLACK }
}

/// Linear blend. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u8, cb: u8| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u8;
    Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Saturating additive blend: `a + b·weight`.
pub fn add_rgb(a: Rgb, b: Rgb, weight: f32) -> Rgb {
    let add = |ca: u8, cb: u8| (ca as f32 + cb as f32 * weight).clamp(0.0, 255.0) as u8;
    Rgb(add(a.0, b.0), add(a.1, b.1), add(a.2, b.2))
}

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width:  usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Frame {
    /// A black frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self { width, height, pixels: vec![color.to_u32(); width * height] }
    }

    /// Wrap an existing buffer; `None` if its length is not `width × height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self { width, height, pixels })
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.pixels }
    pub fn pixels_mut(&mut self) -> &mut [u32] { &mut self.pixels }
    pub fn into_pixels(self) -> Vec<u32> { self.pixels }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.in_bounds(x, y)
            .then(|| Rgb::from_u32(self.pixels[y as usize * self.width + x as usize]))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if self.in_bounds(x, y) {
            self.pixels[y as usize * self.width + x as usize] = color.to_u32();
        }
    }

    /// Blend `color` into one pixel at opacity `alpha`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if let Some(under) = self.get_pixel(x, y) {
            self.set_pixel(x, y, blend_rgb(under, color, alpha));
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color.to_u32());
    }

    /// True when every pixel is black.
    pub fn is_black(&self) -> bool { self.pixels.iter().all(|&p| p & 0x00FF_FFFF == 0) }

    // ── Rectangles ────────────────────────────────────────────────────────

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        let (x0, y0) = (x.max(0), y.max(0));
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        let c = color.to_u32();
        for row in y0..y1 {
            let base = row as usize * self.width;
            for col in x0..x1 {
                self.pixels[base + col as usize] = c;
            }
        }
    }

    /// Translucent filled rectangle.
    pub fn fill_rect_alpha(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb, alpha: f32) {
        for row in y.max(0)..(y + h).min(self.height as i32) {
            for col in x.max(0)..(x + w).min(self.width as i32) {
                self.blend_pixel(col, row, color, alpha);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        if w <= 0 || h <= 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    // ── Lines ─────────────────────────────────────────────────────────────

    /// Bresenham segment; `thickness > 1` stamps a square brush.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb, thickness: i32) {
        let r = (thickness.max(1) - 1) / 2;
        let extra = (thickness.max(1) - 1) % 2;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            if r == 0 && extra == 0 {
                self.set_pixel(x, y, color);
            } else {
                self.fill_rect(x - r, y - r, 2 * r + 1 + extra, 2 * r + 1 + extra, color);
            }
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    pub fn stroke_polyline(&mut self, pts: &[(i32, i32)], color: Rgb, thickness: i32) {
        for w in pts.windows(2) {
            self.draw_line(w[0].0, w[0].1, w[1].0, w[1].1, color, thickness);
        }
    }

    pub fn stroke_polygon(&mut self, pts: &[(i32, i32)], color: Rgb, thickness: i32) {
        self.stroke_polyline(pts, color, thickness);
        if let (Some(&a), Some(&b)) = (pts.last(), pts.first()) {
            self.draw_line(a.0, a.1, b.0, b.1, color, thickness);
        }
    }

    /// Even-odd scanline fill.
    pub fn fill_polygon(&mut self, pts: &[(i32, i32)], color: Rgb) {
        if pts.len() < 3 { return; }
        let ymin = pts.iter().map(|p| p.1).min().unwrap_or(0).max(0);
        let ymax = pts.iter().map(|p| p.1).max().unwrap_or(0).min(self.height as i32 - 1);
        let mut xs: Vec<i32> = Vec::with_capacity(pts.len());
        for y in ymin..=ymax {
            xs.clear();
            let yc = y as f32 + 0.5;
            for i in 0..pts.len() {
                let (ax, ay) = pts[i];
                let (bx, by) = pts[(i + 1) % pts.len()];
                let (ayf, byf) = (ay as f32, by as f32);
                if (ayf <= yc && byf > yc) || (byf <= yc && ayf > yc) {
                    let t = (yc - ayf) / (byf - ayf);
                    xs.push((ax as f32 + t * (bx - ax) as f32).round() as i32);
                }
            }
            xs.sort_unstable();
            for span in xs.chunks_exact(2) {
                self.fill_rect(span[0], y, span[1] - span[0] + 1, 1, color);
            }
        }
    }

    // ── Circles and arcs ──────────────────────────────────────────────────

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, color: Rgb) {
        if r < 0 { return; }
        let r2 = r * r + r;
        for dy in -r..=r {
            let y = cy + dy;
            if y < 0 || y >= self.height as i32 { continue; }
            let mut half = 0;
            while (half + 1) * (half + 1) + dy * dy <= r2 { half += 1; }
            self.fill_rect(cx - half, y, 2 * half + 1, 1, color);
        }
    }

    pub fn stroke_circle(&mut self, cx: i32, cy: i32, r: i32, color: Rgb, thickness: i32) {
        self.stroke_ellipse(cx, cy, r, r, 0.0, 360.0, color, thickness);
    }

    /// Elliptical arc from `start_deg` to `end_deg` (clockwise on screen,
    /// 0° pointing right).
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_ellipse(
        &mut self,
        cx: i32, cy: i32,
        rx: i32, ry: i32,
        start_deg: f32, end_deg: f32,
        color: Rgb, thickness: i32,
    ) {
        if rx <= 0 && ry <= 0 {
            self.set_pixel(cx, cy, color);
            return;
        }
        let span = (end_deg - start_deg).abs().min(360.0);
        let circumference = std::f32::consts::TAU * rx.max(ry) as f32;
        let steps = ((circumference * span / 360.0) / 3.0).ceil().max(4.0) as usize;
        let point = |deg: f32| {
            let a = deg.to_radians();
            (cx + (rx as f32 * a.cos()).round() as i32, cy + (ry as f32 * a.sin()).round() as i32)
        };
        let dir = if end_deg >= start_deg { 1.0 } else { -1.0 };
        let mut prev = point(start_deg);
        for i in 1..=steps {
            let next = point(start_deg + dir * span * i as f32 / steps as f32);
            self.draw_line(prev.0, prev.1, next.0, next.1, color, thickness);
            prev = next;
        }
    }

    /// Diamond (rotated square) outline of radius `r`.
    pub fn draw_diamond(&mut self, cx: i32, cy: i32, r: i32, color: Rgb) {
        for dy in 0..=r {
            let dx = r - dy;
            self.set_pixel(cx + dx, cy + dy, color);
            self.set_pixel(cx - dx, cy + dy, color);
            self.set_pixel(cx + dx, cy - dy, color);
            self.set_pixel(cx - dx, cy - dy, color);
        }
    }

    pub fn fill_diamond(&mut self, cx: i32, cy: i32, r: i32, color: Rgb) {
        for dy in -r..=r {
            let half = r - dy.abs();
            self.fill_rect(cx - half, cy + dy, 2 * half + 1, 1, color);
        }
    }

    // ── Text ──────────────────────────────────────────────────────────────

    /// Draw `text` with the built-in 3×5 font, each font pixel `scale`² px.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: Rgb) {
        let s = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * s, y + row as i32 * s, s, s, color);
                    }
                }
            }
            cx += 4 * s;
            if cx >= self.width as i32 { break; }
        }
    }

    // ── Regions ───────────────────────────────────────────────────────────

    /// Copy of the clipped rectangle `[x0, x1) × [y0, y1)`.
    pub fn region(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Frame {
        let (x0, y0) = (x0.max(0) as usize, y0.max(0) as usize);
        let x1 = (x1.max(0) as usize).min(self.width);
        let y1 = (y1.max(0) as usize).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return Frame::new(0, 0);
        }
        let w = x1 - x0;
        let mut pixels = Vec::with_capacity(w * (y1 - y0));
        for row in y0..y1 {
            let base = row * self.width;
            pixels.extend_from_slice(&self.pixels[base + x0..base + x1]);
        }
        Frame { width: w, height: y1 - y0, pixels }
    }

    /// Weighted blend of `patch` back into the frame at `(x0, y0)`:
    /// `dst = dst·(1−alpha) + patch·alpha`.
    pub fn blend_region(&mut self, x0: i32, y0: i32, patch: &Frame, alpha: f32) {
        for py in 0..patch.height as i32 {
            for px in 0..patch.width as i32 {
                let (x, y) = (x0 + px, y0 + py);
                if let (Some(under), Some(over)) = (self.get_pixel(x, y), patch.get_pixel(px, py)) {
                    self.set_pixel(x, y, blend_rgb(under, over, alpha));
                }
            }
        }
    }

    /// Copy `patch` into the frame at `(x0, y0)` unchanged.
    pub fn paste(&mut self, x0: i32, y0: i32, patch: &Frame) {
        self.blend_region(x0, y0, patch, 1.0);
    }

    /// Translate the whole image by `(dx, dy)` pixels, filling the exposed
    /// border by reflecting the image about its edges.
    pub fn translate_reflect(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 { return; }
        let src = self.pixels.clone();
        let (w, h) = (self.width as i32, self.height as i32);
        for y in 0..h {
            let sy = reflect(y - dy, h) as usize;
            for x in 0..w {
                let sx = reflect(x - dx, w) as usize;
                self.pixels[y as usize * self.width + x as usize] = src[sy * self.width + sx];
            }
        }
    }
}

/// Reflect `i` into `[0, n)` without repeating the edge pixel (`dcba|abcd|dcba`
/// becomes `dcb|abcd|cba`).
fn reflect(i: i32, n: i32) -> i32 {
    if n <= 1 { return 0; }
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    if m < n { m } else { period - m }
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { n * 4 * scale.max(1) - scale.max(1) }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '[' => [0b011, 0b010, 0b010, 0b010, 0b011],
        ']' => [0b110, 0b010, 0b010, 0b010, 0b110],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_packing() {
        let c = Rgb(0x12, 0x34, 0x56);
        assert_eq!(c.to_u32(), 0x0012_3456);
        assert_eq!(Rgb::from_u32(0xFF12_3456), c);
    }

    #[test]
    fn blend_endpoints() {
        let a = Rgb(0, 100, 200);
        let b = Rgb(200, 0, 100);
        assert_eq!(blend_rgb(a, b, 0.0), a);
        assert_eq!(blend_rgb(a, b, 1.0), b);
        assert_eq!(blend_rgb(a, b, 0.5), Rgb(100, 50, 150));
    }

    #[test]
    fn add_saturates() {
        assert_eq!(add_rgb(Rgb(200, 10, 0), Rgb(100, 10, 0), 1.0), Rgb(255, 20, 0));
    }

    #[test]
    fn out_of_bounds_drawing_is_clipped() {
        let mut f = Frame::new(10, 10);
        f.set_pixel(-1, 5, Rgb::WHITE);
        f.fill_rect(-5, -5, 3, 3, Rgb::WHITE);
        f.fill_circle(100, 100, 4, Rgb::WHITE);
        f.draw_line(-20, -20, -10, -30, Rgb::WHITE, 3);
        assert!(f.is_black());
        f.fill_rect(8, 8, 10, 10, Rgb::WHITE);
        assert_eq!(f.pixels().iter().filter(|&&p| p != 0).count(), 4);
    }

    #[test]
    fn line_endpoints_drawn() {
        let mut f = Frame::new(20, 20);
        f.draw_line(2, 3, 15, 11, Rgb::WHITE, 1);
        assert_eq!(f.get_pixel(2, 3), Some(Rgb::WHITE));
        assert_eq!(f.get_pixel(15, 11), Some(Rgb::WHITE));
    }

    #[test]
    fn filled_circle_is_symmetric() {
        let mut f = Frame::new(21, 21);
        f.fill_circle(10, 10, 5, Rgb::WHITE);
        assert_eq!(f.get_pixel(10, 10), Some(Rgb::WHITE));
        assert_eq!(f.get_pixel(15, 10), Some(Rgb::WHITE));
        assert_eq!(f.get_pixel(5, 10), Some(Rgb::WHITE));
        assert_eq!(f.get_pixel(16, 10), Some(Rgb::BLACK));
        assert_eq!(f.get_pixel(14, 14), Some(Rgb::BLACK));
    }

    #[test]
    fn polygon_fill_covers_interior() {
        let mut f = Frame::new(20, 20);
        f.fill_polygon(&[(2, 2), (17, 2), (17, 17), (2, 17)], Rgb::WHITE);
        assert_eq!(f.get_pixel(10, 10), Some(Rgb::WHITE));
        assert_eq!(f.get_pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn region_and_blend_back() {
        let mut f = Frame::filled(8, 8, Rgb(100, 100, 100));
        let mut patch = f.region(2, 2, 6, 6);
        assert_eq!((patch.width(), patch.height()), (4, 4));
        patch.fill(Rgb(200, 200, 200));
        f.blend_region(2, 2, &patch, 0.5);
        assert_eq!(f.get_pixel(3, 3), Some(Rgb(150, 150, 150)));
        assert_eq!(f.get_pixel(1, 1), Some(Rgb(100, 100, 100)));
    }

    #[test]
    fn region_clips_to_frame() {
        let f = Frame::new(5, 5);
        let r = f.region(3, 3, 10, 10);
        assert_eq!((r.width(), r.height()), (2, 2));
        assert_eq!(f.region(7, 7, 9, 9).width(), 0);
    }

    #[test]
    fn reflect_translation_preserves_size_and_shifts() {
        let mut f = Frame::new(6, 1);
        f.set_pixel(0, 0, Rgb::WHITE);
        f.translate_reflect(2, 0);
        assert_eq!(f.get_pixel(2, 0), Some(Rgb::WHITE));
        assert_eq!(f.pixels().len(), 6);
    }

    #[test]
    fn reflect_index() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
    }

    #[test]
    fn text_draws_pixels() {
        let mut f = Frame::new(40, 10);
        f.draw_text("HI", 1, 1, 1, Rgb::WHITE);
        assert!(!f.is_black());
        assert_eq!(text_width("HI", 1), 7);
        assert_eq!(text_width("", 2), 0);
    }
}
