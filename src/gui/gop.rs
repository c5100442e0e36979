use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use uefi::proto::console::gop::BltPixel;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_blt(self) -> BltPixel {
        BltPixel::new(self.r, self.g, self.b)
    }

    pub fn from_blt(px: BltPixel) -> Self {
        Self::new(px.red, px.green, px.blue)
    }

    /// Linear blend towards `other`; `alpha` is the weight of `other` out of 255.
    pub fn mix(self, other: Color, alpha: u8) -> Self {
        let blend = |a: u8, b: u8| -> u8 {
            ((a as u16 * (255 - alpha as u16) + b as u16 * alpha as u16) / 255) as u8
        };
        Self::new(blend(self.r, other.r), blend(self.g, other.g), blend(self.b, other.b))
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const SCREEN_BG: Self = Self::new(255, 205, 210);
    pub const TAB_BAR: Self = Self::new(66, 66, 66);
    pub const TAB_TEXT: Self = Self::new(250, 250, 250);
    pub const TAB_ACTIVE: Self = Self::new(33, 150, 243);
    pub const PANEL: Self = Self::new(255, 255, 255);
    pub const BORDER: Self = Self::new(0, 0, 0);
    pub const BUTTON: Self = Self::new(33, 150, 243);
    pub const BUTTON_CHECKED: Self = Self::new(21, 101, 192);
    pub const FOCUS: Self = Self::new(255, 152, 0);
    pub const GREY: Self = Self::new(158, 158, 158);
    pub const YELLOW: Self = Self::new(255, 235, 59);
    pub const GREEN: Self = Self::new(76, 175, 80);
    pub const RED: Self = Self::new(244, 67, 54);
    pub const TEXT: Self = Self::new(33, 33, 33);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x as i32
            && px < (self.x + self.w) as i32
            && py >= self.y as i32
            && py < (self.y + self.h) as i32
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn right(&self) -> usize {
        self.x + self.w
    }

    pub fn bottom(&self) -> usize {
        self.y + self.h
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Smallest rectangle covering both; empty inputs are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: usize,
    pub height: usize,
}

impl ScreenInfo {
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

/// Picks the largest mode that fits inside `max`; ties keep the first.
pub fn best_mode<I>(resolutions: I, max: (usize, usize)) -> Option<usize>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut best: Option<(usize, usize)> = None;
    for (index, (w, h)) in resolutions.into_iter().enumerate() {
        if w > max.0 || h > max.1 {
            continue;
        }
        match best {
            Some((_, area)) if area >= w * h => {}
            _ => best = Some((index, w * h)),
        }
    }
    best.map(|(index, _)| index)
}

/// The hardware side of the display port: a frame buffer reachable through
/// a block transfer.
pub trait BlitTarget {
    fn resolution(&self) -> (usize, usize);

    /// Copies `dims` pixels starting at `src` in `buffer` (rows `px_stride`
    /// pixels apart) to `dest` in video memory.
    fn blit_buffer_to_video(
        &mut self,
        buffer: &[BltPixel],
        src: (usize, usize),
        dest: (usize, usize),
        dims: (usize, usize),
        px_stride: usize,
    ) -> Result<()>;
}

/// Double-buffered display.
///
/// The toolkit draws into the back buffer and flushes damaged rectangles.
/// At the end of a frame the buffers swap and the damaged regions are
/// copied forward so the new back buffer holds the complete frame.
pub struct DisplayPort {
    target: Option<Box<dyn BlitTarget>>,
    buffers: [Vec<BltPixel>; 2],
    back: usize,
    in_flight: bool,
    width: usize,
    height: usize,
    damage: Vec<Rect>,
}

impl DisplayPort {
    pub fn new(target: Box<dyn BlitTarget>) -> Self {
        let (width, height) = target.resolution();
        let black = BltPixel::new(0, 0, 0);
        Self {
            target: Some(target),
            buffers: [vec![black; width * height], vec![black; width * height]],
            back: 0,
            in_flight: false,
            width,
            height,
            damage: Vec::new(),
        }
    }

    pub fn screen(&self) -> ScreenInfo {
        ScreenInfo {
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.target.is_none()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Size in bytes of one buffer.
    pub fn buffer_bytes(&self) -> usize {
        self.buffers[self.back].len() * core::mem::size_of::<BltPixel>()
    }

    pub fn draw_buffer(&mut self) -> Result<&mut [BltPixel]> {
        if self.target.is_none() {
            return Err(Error::DisplayClosed);
        }
        if self.in_flight {
            return Err(Error::FlushPending);
        }
        Ok(&mut self.buffers[self.back])
    }

    pub fn front_buffer(&self) -> &[BltPixel] {
        &self.buffers[self.back ^ 1]
    }

    /// Sends one rectangle of the back buffer to the screen.
    pub fn flush_region(&mut self, area: Rect) -> Result<()> {
        if self.in_flight {
            return Err(Error::FlushPending);
        }
        let target = self.target.as_mut().ok_or(Error::DisplayClosed)?;
        let Some(area) = area.intersect(&Rect::new(0, 0, self.width, self.height)) else {
            return Ok(());
        };

        self.in_flight = true;
        let result = target.blit_buffer_to_video(
            &self.buffers[self.back],
            (area.x, area.y),
            (area.x, area.y),
            (area.w, area.h),
            self.width,
        );
        self.damage.push(area);
        self.flush_ready();
        result
    }

    /// Completion signal for the flush in flight; the back buffer may be
    /// drawn into again.
    pub fn flush_ready(&mut self) {
        self.in_flight = false;
    }

    pub fn finish_frame(&mut self) {
        if self.target.is_none() || self.damage.is_empty() {
            return;
        }
        let shown = self.back;
        self.back ^= 1;

        let (first, second) = self.buffers.split_at_mut(1);
        let (src, dst) = if shown == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };
        for area in self.damage.drain(..) {
            for row in area.y..area.bottom() {
                let start = row * self.width + area.x;
                let end = start + area.w;
                dst[start..end].copy_from_slice(&src[start..end]);
            }
        }
    }

    /// Releases both buffers and the hardware target.
    pub fn close(&mut self) {
        self.target = None;
        self.buffers = [Vec::new(), Vec::new()];
        self.damage.clear();
        self.in_flight = false;
    }
}
