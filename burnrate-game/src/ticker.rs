//! Fixed-interval tick schedule polled against an injected clock.
use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    interval: TimeDelta,
    next_due: Option<DateTime<Utc>>,
}

impl Ticker {
    /// Stopped ticker firing every `interval_secs` (minimum one second) once started.
    #[must_use]
    pub fn new(interval_secs: i64) -> Self {
        Self {
            interval: TimeDelta::try_seconds(interval_secs.max(1)).unwrap_or(TimeDelta::MAX),
            next_due: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Schedule the first tick one interval after `now`. Restarting resets the phase.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = now.checked_add_signed(self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    #[must_use]
    pub const fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// Number of ticks that fell due at or before `now`; the schedule moves past them.
    pub fn due_ticks(&mut self, now: DateTime<Utc>) -> u64 {
        let Some(next) = self.next_due else {
            return 0;
        };
        if now < next {
            return 0;
        }
        let interval_ms = self.interval.num_milliseconds().max(1);
        let behind_ms = (now - next).num_milliseconds();
        let count = behind_ms / interval_ms + 1;
        self.next_due = TimeDelta::try_milliseconds(interval_ms.saturating_mul(count))
            .and_then(|advance| next.checked_add_signed(advance));
        u64::try_from(count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn stopped_ticker_never_fires() {
        let mut ticker = Ticker::new(60);
        assert!(!ticker.is_running());
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::hours(5)), 0);
    }

    #[test]
    fn counts_elapsed_intervals_and_keeps_phase() {
        let mut ticker = Ticker::new(60);
        ticker.start(t0());
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::seconds(59)), 0);
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::seconds(60)), 1);
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::seconds(90)), 0);
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::seconds(305)), 4);
        assert_eq!(ticker.next_due(), Some(t0() + TimeDelta::seconds(360)));
    }

    #[test]
    fn stop_then_restart_resets_schedule() {
        let mut ticker = Ticker::new(60);
        ticker.start(t0());
        ticker.stop();
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::hours(1)), 0);
        ticker.start(t0() + TimeDelta::hours(1));
        assert_eq!(ticker.due_ticks(t0() + TimeDelta::seconds(3_660)), 1);
    }
}
