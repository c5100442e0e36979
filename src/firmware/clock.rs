use uefi::runtime;

use crate::error::Result;
use crate::views::{Clock, DateTime};

/// The runtime services real-time clock.
pub struct RuntimeClock;

impl Clock for RuntimeClock {
    fn now(&mut self) -> Result<DateTime> {
        let time = runtime::get_time()?;
        Ok(DateTime {
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        })
    }
}
