//! Drift-free countdown arithmetic.
//!
//! Remaining time is always derived from a fixed anchor instant and the
//! current wall clock, never by decrementing a counter per tick, so
//! scheduling jitter cannot accumulate over multi-day countdowns.

use chrono::{DateTime, Utc};

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Remaining time until the target, clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub ms: u64,
}

impl Remaining {
    pub const ZERO: Remaining = Remaining { ms: 0 };

    pub fn is_zero(&self) -> bool {
        self.ms == 0
    }

    pub fn days(&self) -> u64 {
        self.ms / MS_PER_DAY
    }

    pub fn hours(&self) -> u64 {
        (self.ms % MS_PER_DAY) / MS_PER_HOUR
    }

    pub fn minutes(&self) -> u64 {
        (self.ms % MS_PER_HOUR) / MS_PER_MINUTE
    }

    pub fn seconds(&self) -> u64 {
        (self.ms % MS_PER_MINUTE) / MS_PER_SECOND
    }
}

/// A single countdown cycle: an anchor instant and the duration it started
/// with.
#[derive(Debug, Clone, Copy)]
pub struct CountdownClock {
    anchor: DateTime<Utc>,
    initial_duration_ms: u64,
}

impl CountdownClock {
    /// Anchor a new cycle at `now` with a fixed duration.
    pub fn new(now: DateTime<Utc>, duration_ms: u64) -> Self {
        Self {
            anchor: now,
            initial_duration_ms: duration_ms,
        }
    }

    /// Anchor a new cycle at `now` counting down to `target`. A target at or
    /// before `now` yields a zero-length cycle.
    pub fn for_target(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let duration_ms = (target - now).num_milliseconds().max(0) as u64;
        Self::new(now, duration_ms)
    }

    pub fn initial_duration_ms(&self) -> u64 {
        self.initial_duration_ms
    }

    /// Remaining time at `now`: `max(0, initial_duration - (now - anchor))`.
    ///
    /// A wall clock that stepped backwards past the anchor reads as zero
    /// elapsed, so remaining never exceeds the initial duration.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Remaining {
        let elapsed_ms = (now - self.anchor).num_milliseconds().max(0) as u64;
        Remaining {
            ms: self.initial_duration_ms.saturating_sub(elapsed_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_remaining_depends_only_on_elapsed_wall_clock() {
        let clock = CountdownClock::new(t0(), 90_000);

        assert_eq!(clock.remaining_at(t0()).ms, 90_000);
        assert_eq!(clock.remaining_at(t0() + Duration::seconds(60)).ms, 30_000);
        assert_eq!(clock.remaining_at(t0() + Duration::seconds(90)).ms, 0);
        assert_eq!(clock.remaining_at(t0() + Duration::seconds(120)).ms, 0);

        // remaining(t1) - remaining(t2) == t2 - t1 exactly, regardless of
        // how often (or whether) anything sampled in between.
        let t1 = t0() + Duration::milliseconds(12_345);
        let t2 = t0() + Duration::milliseconds(67_890);
        let drop = clock.remaining_at(t1).ms - clock.remaining_at(t2).ms;
        assert_eq!(drop, 67_890 - 12_345);
    }

    #[test]
    fn test_remaining_is_monotonically_non_increasing() {
        let clock = CountdownClock::new(t0(), 5_000);
        let mut last = u64::MAX;
        for ms in (0..8_000).step_by(137) {
            let rem = clock.remaining_at(t0() + Duration::milliseconds(ms)).ms;
            assert!(rem <= last);
            last = rem;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_target_in_the_past_is_a_zero_cycle() {
        let clock = CountdownClock::for_target(t0(), t0() - Duration::hours(1));
        assert_eq!(clock.initial_duration_ms(), 0);
        assert!(clock.remaining_at(t0()).is_zero());
    }

    #[test]
    fn test_target_in_the_future() {
        let clock = CountdownClock::for_target(t0(), t0() + Duration::milliseconds(90_000));
        assert_eq!(clock.initial_duration_ms(), 90_000);
    }

    #[test]
    fn test_backwards_clock_step_reads_as_zero_elapsed() {
        let clock = CountdownClock::new(t0(), 10_000);
        let rem = clock.remaining_at(t0() - Duration::seconds(30));
        assert_eq!(rem.ms, 10_000);
    }

    #[test]
    fn test_component_decomposition() {
        let rem = Remaining {
            ms: MS_PER_DAY + MS_PER_HOUR + MS_PER_MINUTE + MS_PER_SECOND + 1,
        };
        assert_eq!(rem.days(), 1);
        assert_eq!(rem.hours(), 1);
        assert_eq!(rem.minutes(), 1);
        assert_eq!(rem.seconds(), 1);

        assert_eq!(Remaining::ZERO.days(), 0);
        assert!(Remaining::ZERO.is_zero());
    }
}
