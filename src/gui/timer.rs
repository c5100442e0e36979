use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(usize);

struct Timer {
    period_ms: u64,
    next_due: u64,
}

/// Periodic timers driven by the toolkit clock.
#[derive(Default)]
pub struct Timers {
    slots: Vec<Option<Timer>>,
}

impl Timers {
    /// A `ready` timer fires on the next `due` call instead of one period later.
    pub fn create(&mut self, period_ms: u64, now: u64, ready: bool) -> TimerId {
        let period_ms = period_ms.max(1);
        let next_due = if ready { now } else { now + period_ms };
        self.slots.push(Some(Timer { period_ms, next_due }));
        TimerId(self.slots.len() - 1)
    }

    pub fn delete(&mut self, id: TimerId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Timers due at `now`. Missed periods collapse into one firing.
    pub fn due(&mut self, now: u64) -> Vec<TimerId> {
        let mut fired = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(timer) = slot else {
                continue;
            };
            if now >= timer.next_due {
                fired.push(TimerId(index));
                let elapsed = now - timer.next_due;
                timer.next_due = now + timer.period_ms - elapsed % timer.period_ms;
            }
        }
        fired
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let mut timers = Timers::default();
        let t = timers.create(250, 0, false);
        assert!(timers.due(240).is_empty());
        assert_eq!(timers.due(250), [t]);
        assert!(timers.due(260).is_empty());
        assert_eq!(timers.due(500), [t]);
    }

    #[test]
    fn ready_timer_fires_immediately() {
        let mut timers = Timers::default();
        let t = timers.create(250, 1000, true);
        assert_eq!(timers.due(1000), [t]);
        assert!(timers.due(1010).is_empty());
    }

    #[test]
    fn late_ticks_do_not_burst() {
        let mut timers = Timers::default();
        let t = timers.create(100, 0, false);
        assert_eq!(timers.due(1050), [t]);
        assert!(timers.due(1090).is_empty());
        assert_eq!(timers.due(1100), [t]);
    }

    #[test]
    fn deleted_timers_stay_silent() {
        let mut timers = Timers::default();
        let t = timers.create(10, 0, true);
        timers.delete(t);
        assert!(!timers.is_active(t));
        assert!(timers.due(100).is_empty());
    }
}
