use uefi::proto::console::gop::BltPixel;

use super::font::{self, GLYPH_SIZE};
use super::gop::{Color, Rect};

pub struct Canvas<'a> {
    pixels: &'a mut [BltPixel],
    width: usize,
    height: usize,
    clip: Rect,
    scale: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(pixels: &'a mut [BltPixel], width: usize, height: usize, scale: usize) -> Self {
        Self {
            pixels,
            width,
            height,
            clip: Rect::new(0, 0, width, height),
            scale: scale.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Restricts drawing to `area` (intersected with the canvas).
    pub fn set_clip(&mut self, area: Rect) {
        self.clip = area
            .intersect(&Rect::new(0, 0, self.width, self.height))
            .unwrap_or_default();
    }

    pub fn put(&mut self, x: usize, y: usize, color: Color) {
        if self.clip.contains(x as i32, y as i32) {
            self.pixels[y * self.width + x] = color.to_blt();
        }
    }

    fn put_signed(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 {
            self.put(x as usize, y as usize, color);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            Color::from_blt(self.pixels[y * self.width + x])
        } else {
            Color::BLACK
        }
    }

    pub fn fill_rect(&mut self, area: Rect, color: Color) {
        let Some(area) = area.intersect(&self.clip) else {
            return;
        };
        let pixel = color.to_blt();
        for row in area.y..area.bottom() {
            let start = row * self.width + area.x;
            self.pixels[start..start + area.w].fill(pixel);
        }
    }

    /// Blends `color` over the existing pixels; `alpha` out of 255.
    pub fn shade_rect(&mut self, area: Rect, color: Color, alpha: u8) {
        let Some(area) = area.intersect(&self.clip) else {
            return;
        };
        for row in area.y..area.bottom() {
            let start = row * self.width + area.x;
            for px in &mut self.pixels[start..start + area.w] {
                *px = Color::from_blt(*px).mix(color, alpha).to_blt();
            }
        }
    }

    pub fn stroke_rect(&mut self, area: Rect, thickness: usize, color: Color) {
        let t = thickness.min(area.w / 2).min(area.h / 2).max(1);
        self.fill_rect(Rect::new(area.x, area.y, area.w, t), color);
        self.fill_rect(Rect::new(area.x, area.bottom().saturating_sub(t), area.w, t), color);
        self.fill_rect(Rect::new(area.x, area.y, t, area.h), color);
        self.fill_rect(Rect::new(area.right().saturating_sub(t), area.y, t, area.h), color);
    }

    pub fn draw_char(&mut self, ch: char, x: usize, y: usize, color: Color) {
        let rows = font::glyph(ch);
        for (gy, bits) in rows.iter().enumerate() {
            for gx in 0..GLYPH_SIZE {
                if bits & (1 << gx) == 0 {
                    continue;
                }
                let px = x + gx * self.scale;
                let py = y + gy * self.scale;
                self.fill_rect(Rect::new(px, py, self.scale, self.scale), color);
            }
        }
    }

    /// Draws one line of text; stops at the right edge of the clip.
    pub fn draw_text(&mut self, text: &str, x: usize, y: usize, color: Color) {
        let advance = font::char_width(self.scale);
        let mut cx = x;
        for ch in text.chars() {
            if cx >= self.clip.right() {
                break;
            }
            self.draw_char(ch, cx, y, color);
            cx += advance;
        }
    }

    pub fn text_width(&self, text: &str) -> usize {
        font::text_width(text, self.scale)
    }

    pub fn line_height(&self) -> usize {
        font::line_height(self.scale)
    }

    /// Bresenham line, `width` pixels thick.
    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), width: usize, color: Color) {
        let (mut x0, mut y0) = from;
        let (x1, y1) = to;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = (width / 2) as i32;
        loop {
            for oy in -half..=half {
                for ox in -half..=half {
                    self.put_signed(x0 + ox, y0 + oy, color);
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Midpoint circle outline.
    pub fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: Color) {
        let (cx, cy) = center;
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            for (px, py) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.put_signed(cx + px, cy + py, color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    pub fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Color) {
        let (cx, cy) = center;
        for dy in -radius..=radius {
            let span = libm::sqrtf((radius * radius - dy * dy) as f32) as i32;
            let y = cy + dy;
            if y < 0 {
                continue;
            }
            let x0 = (cx - span).max(0) as usize;
            let x1 = (cx + span).max(-1) + 1;
            if x1 <= 0 {
                continue;
            }
            self.fill_rect(Rect::new(x0, y as usize, x1 as usize - x0, 1), color);
        }
    }

    /// Copies a `w × h` image with its top-left corner at (`x`, `y`).
    pub fn blit_image(&mut self, x: usize, y: usize, w: usize, h: usize, image: &[BltPixel]) {
        if image.len() < w * h {
            return;
        }
        let Some(area) = Rect::new(x, y, w, h).intersect(&self.clip) else {
            return;
        };
        for row in area.y..area.bottom() {
            let src_start = (row - y) * w + (area.x - x);
            let dst_start = row * self.width + area.x;
            self.pixels[dst_start..dst_start + area.w]
                .copy_from_slice(&image[src_start..src_start + area.w]);
        }
    }
}
