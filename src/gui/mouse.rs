use super::canvas::Canvas;
use super::gop::{Color, Rect};

pub const CURSOR_WIDTH: usize = 12;
pub const CURSOR_HEIGHT: usize = 19;

/// Arrow cursor: 0=transparent, 1=black outline, 2=white fill
static CURSOR_BITMAP: [[u8; CURSOR_WIDTH]; CURSOR_HEIGHT] = [
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 2, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 2, 2, 2, 1, 0, 0, 0, 0, 0, 0, 0],
    [1, 2, 2, 2, 2, 1, 0, 0, 0, 0, 0, 0],
    [1, 2, 2, 2, 2, 2, 1, 0, 0, 0, 0, 0],
    [1, 2, 2, 2, 2, 2, 2, 1, 0, 0, 0, 0],
    [1, 2, 2, 2, 2, 2, 2, 2, 1, 0, 0, 0],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 1, 0, 0],
    [1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 0],
    [1, 2, 2, 1, 2, 2, 1, 0, 0, 0, 0, 0],
    [1, 2, 1, 0, 1, 2, 2, 1, 0, 0, 0, 0],
    [1, 1, 0, 0, 1, 2, 2, 1, 0, 0, 0, 0],
    [1, 0, 0, 0, 0, 1, 2, 2, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 2, 2, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 2, 2, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 2, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0],
];

/// One report from an absolute pointing device.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteSample {
    pub current_x: u64,
    pub current_y: u64,
    pub min_x: u64,
    pub max_x: u64,
    pub min_y: u64,
    pub max_y: u64,
    pub active_buttons: u32,
}

/// One report from a relative pointing device plus its resolution
/// (counts per millimetre).
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeSample {
    pub dx: i32,
    pub dy: i32,
    pub resolution_x: u64,
    pub resolution_y: u64,
    pub left: bool,
    pub right: bool,
}

/// What the toolkit sees once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerReport {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
}

pub struct PointerTracker {
    pub x: i32,
    pub y: i32,
    pub left_button: bool,
    pub right_button: bool,
    screen_w: i32,
    screen_h: i32,
    damping: i64,
}

impl PointerTracker {
    pub fn new(screen_w: usize, screen_h: usize, damping: i64) -> Self {
        Self {
            x: (screen_w / 2) as i32,
            y: (screen_h / 2) as i32,
            left_button: false,
            right_button: false,
            screen_w: screen_w.max(1) as i32,
            screen_h: screen_h.max(1) as i32,
            damping: damping.max(1),
        }
    }

    pub fn report(&self) -> PointerReport {
        PointerReport {
            x: self.x,
            y: self.y,
            pressed: self.left_button,
        }
    }

    /// Maps device coordinates straight onto the screen. Returns `false`
    /// (and releases) when the device reports an empty range.
    pub fn apply_absolute(&mut self, sample: &AbsoluteSample) -> bool {
        let range_x = sample.max_x.saturating_sub(sample.min_x);
        let range_y = sample.max_y.saturating_sub(sample.min_y);
        if range_x == 0 || range_y == 0 {
            self.release();
            return false;
        }
        self.x = scale_absolute(sample.current_x, range_x, self.screen_w);
        self.y = scale_absolute(sample.current_y, range_y, self.screen_h);
        self.left_button = sample.active_buttons & 0x1 != 0;
        self.right_button = sample.active_buttons & 0x2 != 0;
        true
    }

    pub fn apply_relative(&mut self, sample: &RelativeSample) {
        let dx = scale_relative(sample.dx, self.screen_w, self.damping, sample.resolution_x);
        let dy = scale_relative(sample.dy, self.screen_h, self.damping, sample.resolution_y);
        self.x = clamp_axis(self.x as i64 + dx, self.screen_w);
        self.y = clamp_axis(self.y as i64 + dy, self.screen_h);
        self.left_button = sample.left;
        self.right_button = sample.right;
    }

    /// A read failed or nothing is pending: keep the position, drop the buttons.
    pub fn release(&mut self) {
        self.left_button = false;
        self.right_button = false;
    }

    pub fn cursor_rect(&self) -> Rect {
        Rect::new(self.x as usize, self.y as usize, CURSOR_WIDTH, CURSOR_HEIGHT)
    }

    pub fn draw_cursor(&self, canvas: &mut Canvas<'_>) {
        let cx = self.x as usize;
        let cy = self.y as usize;
        for (dy, row) in CURSOR_BITMAP.iter().enumerate() {
            for (dx, &cell) in row.iter().enumerate() {
                match cell {
                    1 => canvas.put(cx + dx, cy + dy, Color::BLACK),
                    2 => canvas.put(cx + dx, cy + dy, Color::WHITE),
                    _ => {}
                }
            }
        }
    }
}

fn scale_absolute(current: u64, range: u64, extent: i32) -> i32 {
    let pos = (current as u128 * extent as u128 / range as u128) as u64;
    pos.min(extent as u64 - 1) as i32
}

fn scale_relative(delta: i32, extent: i32, damping: i64, resolution: u64) -> i64 {
    let resolution = resolution.clamp(1, i64::MAX as u64) as i64;
    delta as i64 * extent as i64 / damping.saturating_mul(resolution)
}

fn clamp_axis(pos: i64, extent: i32) -> i32 {
    pos.clamp(0, extent as i64 - 1) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs_sample(x: u64, y: u64, max: u64, buttons: u32) -> AbsoluteSample {
        AbsoluteSample {
            current_x: x,
            current_y: y,
            min_x: 0,
            max_x: max,
            min_y: 0,
            max_y: max,
            active_buttons: buttons,
        }
    }

    #[test]
    fn starts_centred_and_released() {
        let tracker = PointerTracker::new(800, 600, 50);
        assert_eq!(
            tracker.report(),
            PointerReport { x: 400, y: 300, pressed: false }
        );
    }

    #[test]
    fn absolute_mapping_scales_and_clamps() {
        let mut tracker = PointerTracker::new(1024, 768, 50);
        assert!(tracker.apply_absolute(&abs_sample(500, 250, 1000, 1)));
        assert_eq!(tracker.report(), PointerReport { x: 512, y: 192, pressed: true });

        assert!(tracker.apply_absolute(&abs_sample(1000, 5000, 1000, 0)));
        assert_eq!((tracker.x, tracker.y), (1023, 767));
        assert!(!tracker.left_button);
    }

    #[test]
    fn absolute_mapping_stays_on_screen_for_any_report() {
        let mut tracker = PointerTracker::new(640, 480, 50);
        for &(x, y, max) in &[
            (0, 0, 1),
            (u64::MAX, u64::MAX, 1),
            (u64::MAX, 3, u64::MAX),
            (7, 7, 7),
            (123_456, 654_321, 65_535),
        ] {
            tracker.apply_absolute(&abs_sample(x, y, max, 0));
            assert!((0..640).contains(&tracker.x), "x={} for {:?}", tracker.x, (x, y, max));
            assert!((0..480).contains(&tracker.y), "y={} for {:?}", tracker.y, (x, y, max));
        }
    }

    #[test]
    fn zero_range_is_a_failed_read() {
        let mut tracker = PointerTracker::new(640, 480, 50);
        tracker.left_button = true;
        assert!(!tracker.apply_absolute(&abs_sample(10, 10, 0, 1)));
        assert_eq!(tracker.report(), PointerReport { x: 320, y: 240, pressed: false });
    }

    #[test]
    fn relative_motion_is_damped_by_resolution() {
        let mut tracker = PointerTracker::new(1000, 1000, 50);
        tracker.apply_relative(&RelativeSample {
            dx: 100,
            dy: -50,
            resolution_x: 2,
            resolution_y: 0,
            left: true,
            right: false,
        });
        // 100 * 1000 / (50 * 2) = 1000; -50 * 1000 / (50 * 1) = -1000
        assert_eq!(tracker.report(), PointerReport { x: 999, y: 0, pressed: true });
    }

    #[test]
    fn relative_clamping_is_idempotent() {
        let mut tracker = PointerTracker::new(320, 200, 50);
        let push = RelativeSample {
            dx: i32::MAX,
            dy: i32::MIN,
            resolution_x: 1,
            resolution_y: 1,
            ..Default::default()
        };
        tracker.apply_relative(&push);
        let first = (tracker.x, tracker.y);
        tracker.apply_relative(&push);
        assert_eq!((tracker.x, tracker.y), first);
        assert_eq!(first, (319, 0));
    }

    #[test]
    fn small_motions_truncate_towards_zero() {
        let mut tracker = PointerTracker::new(100, 100, 50);
        tracker.apply_relative(&RelativeSample {
            dx: 1,
            dy: -1,
            resolution_x: 10,
            resolution_y: 10,
            ..Default::default()
        });
        assert_eq!((tracker.x, tracker.y), (50, 50));
    }

    #[test]
    fn cursor_is_drawn_at_tracked_position() {
        let tracker = PointerTracker::new(40, 40, 50);
        let mut pixels = alloc::vec![Color::GREY.to_blt(); 40 * 40];
        let mut canvas = Canvas::new(&mut pixels, 40, 40, 1);
        tracker.draw_cursor(&mut canvas);
        assert_eq!(Color::from_blt(pixels[20 * 40 + 20]), Color::BLACK);
        assert_eq!(Color::from_blt(pixels[22 * 40 + 21]), Color::WHITE);
        assert_eq!(Color::from_blt(pixels[20 * 40 + 22]), Color::GREY);
    }
}
