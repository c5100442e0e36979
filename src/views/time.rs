//! "Time&Date" tab: an analog clock refreshed from the real-time clock and a
//! calendar opened on today's date.

use crate::error::Result;
use crate::gui::timer::TimerId;
use crate::gui::widget::{CalendarDate, ClockFace, Flow, WidgetId};
use crate::gui::{Ui, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for DateTime {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    pub fn face(&self) -> ClockFace {
        ClockFace {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    pub fn date(&self) -> CalendarDate {
        CalendarDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

pub trait Clock {
    fn now(&mut self) -> Result<DateTime>;
}

pub struct TimeView {
    pub clock: WidgetId,
    pub calendar: WidgetId,
    pub timer: TimerId,
}

impl TimeView {
    pub fn build(ui: &mut Ui, tab: WidgetId, clock: &mut dyn Clock, refresh_ms: u64) -> Result<Self> {
        ui.set_flow(tab, Flow::Row)?;
        let now = clock.now().unwrap_or_else(|err| {
            log::warn!("real-time clock unavailable: {}", err);
            DateTime::default()
        });
        let face = ui.add_clock(tab, now.face())?;
        let calendar = ui.add_calendar(tab, now.date())?;
        let timer = ui.create_timer(refresh_ms, true);
        Ok(Self {
            clock: face,
            calendar,
            timer,
        })
    }

    /// Moves the hands on every refresh tick. Returns whether the event
    /// belonged to this view.
    pub fn on_event(&self, ui: &mut Ui, clock: &mut dyn Clock, event: &UiEvent) -> Result<bool> {
        if *event != UiEvent::Timer(self.timer) {
            return Ok(false);
        }
        match clock.now() {
            Ok(now) => ui.set_clock(self.clock, now.face())?,
            Err(err) => log::debug!("clock refresh skipped: {}", err),
        }
        Ok(true)
    }
}
