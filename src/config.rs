//! Runtime configuration.
//!
//! Defaults are compiled in; the image load options may override them with
//! whitespace-separated `key=value` tokens, e.g. `tick=20 mode=1024x768 log=info`.

use core::str::FromStr;

use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Stall between loop ticks, in milliseconds.
    pub tick_ms: u64,
    pub clock_refresh_ms: u64,
    /// Divisor applied to relative pointer motion.
    pub pointer_damping: i64,
    /// Integer scale applied to the 8x8 glyphs.
    pub font_scale: usize,
    /// Largest graphics mode the display port will select.
    pub max_mode: (usize, usize),
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            clock_refresh_ms: 250,
            pointer_damping: 50,
            font_scale: 2,
            max_mode: (1280, 1024),
            log_level: LevelFilter::Warn,
        }
    }
}

impl Config {
    pub fn from_options(options: &str) -> Self {
        let mut config = Self::default();
        config.apply_options(options);
        config
    }

    /// Applies every recognised token; bad tokens are logged and skipped.
    pub fn apply_options(&mut self, options: &str) {
        for token in options.split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                // The first token is usually the image path.
                continue;
            };
            if !self.apply(key, value) {
                log::warn!("ignoring option '{}'", token);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "tick" => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => self.tick_ms = ms,
                _ => return false,
            },
            "damping" => match value.parse::<i64>() {
                Ok(d) if d > 0 => self.pointer_damping = d,
                _ => return false,
            },
            "scale" => match value.parse::<usize>() {
                Ok(s) if (1..=4).contains(&s) => self.font_scale = s,
                _ => return false,
            },
            "mode" => {
                let Some((w, h)) = value.split_once('x') else {
                    return false;
                };
                match (w.parse::<usize>(), h.parse::<usize>()) {
                    (Ok(w), Ok(h)) if w > 0 && h > 0 => self.max_mode = (w, h),
                    _ => return false,
                }
            }
            "log" => match LevelFilter::from_str(value) {
                Ok(level) => self.log_level = level,
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }
}
