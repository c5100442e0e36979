//! Input port: one poll per device class per tick.

use alloc::boxed::Box;

use super::gop::ScreenInfo;
use super::keyboard::{map_key, KeyStroke, UiKey};
use super::mouse::{AbsoluteSample, PointerReport, PointerTracker, RelativeSample};
use crate::error::Result;

/// `Ok(None)` means nothing is pending this tick.
pub trait AbsolutePointerDevice {
    fn read(&mut self) -> Result<Option<AbsoluteSample>>;
}

pub trait SimplePointerDevice {
    fn read(&mut self) -> Result<Option<RelativeSample>>;
}

pub trait KeyboardDevice {
    fn read_key(&mut self) -> Result<Option<KeyStroke>>;
}

pub enum PointerSource {
    Absolute(Box<dyn AbsolutePointerDevice>),
    Simple(Box<dyn SimplePointerDevice>),
}

impl PointerSource {
    /// An absolute device wins over a relative one.
    pub fn select(
        absolute: Option<Box<dyn AbsolutePointerDevice>>,
        simple: Option<Box<dyn SimplePointerDevice>>,
    ) -> Option<Self> {
        match (absolute, simple) {
            (Some(dev), _) => Some(Self::Absolute(dev)),
            (None, Some(dev)) => Some(Self::Simple(dev)),
            (None, None) => None,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Self::Absolute(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyReport {
    pub key: Option<UiKey>,
    pub pressed: bool,
}

impl KeyReport {
    const RELEASED: Self = Self {
        key: None,
        pressed: false,
    };
}

pub struct InputPort {
    pointer: Option<PointerSource>,
    keyboard: Option<Box<dyn KeyboardDevice>>,
    tracker: PointerTracker,
}

impl InputPort {
    pub fn new(
        screen: ScreenInfo,
        damping: i64,
        pointer: Option<PointerSource>,
        keyboard: Option<Box<dyn KeyboardDevice>>,
    ) -> Self {
        Self {
            pointer,
            keyboard,
            tracker: PointerTracker::new(screen.width, screen.height, damping),
        }
    }

    pub fn has_pointer(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn has_keyboard(&self) -> bool {
        self.keyboard.is_some()
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// `None` when there is no pointing device at all.
    pub fn poll_pointer(&mut self) -> Option<PointerReport> {
        let tracker = &mut self.tracker;
        match self.pointer.as_mut()? {
            PointerSource::Absolute(dev) => match dev.read() {
                Ok(Some(sample)) => {
                    tracker.apply_absolute(&sample);
                }
                Ok(None) => tracker.release(),
                Err(e) => {
                    log::debug!("absolute pointer read failed: {}", e);
                    tracker.release();
                }
            },
            PointerSource::Simple(dev) => match dev.read() {
                Ok(Some(sample)) => tracker.apply_relative(&sample),
                Ok(None) => tracker.release(),
                Err(e) => {
                    log::debug!("pointer read failed: {}", e);
                    tracker.release();
                }
            },
        }
        Some(tracker.report())
    }

    pub fn poll_key(&mut self) -> KeyReport {
        let Some(keyboard) = self.keyboard.as_mut() else {
            return KeyReport::RELEASED;
        };
        match keyboard.read_key() {
            Ok(Some(stroke)) => match map_key(&stroke) {
                Some(key) => KeyReport {
                    key: Some(key),
                    pressed: true,
                },
                None => KeyReport::RELEASED,
            },
            Ok(None) => KeyReport::RELEASED,
            Err(e) => {
                log::debug!("key read failed: {}", e);
                KeyReport::RELEASED
            }
        }
    }

    pub fn close(&mut self) {
        self.pointer = None;
        self.keyboard = None;
    }
}
