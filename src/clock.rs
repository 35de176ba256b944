// Clock - source of "now" and of the driver's local calendar day
//
// Records carry UTC instants. "Today" is always a LOCAL calendar date, so the
// clock owns both the instant and the timezone used to turn it into a date.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use std::sync::{Arc, RwLock};

pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of `instant` in the clock's local timezone
    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate;

    /// Today's local calendar date
    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    /// Check if `instant` falls on today's local calendar date
    fn is_today(&self, instant: DateTime<Utc>) -> bool {
        self.local_date(instant) == self.today()
    }
}

// ============================================================================
// SYSTEM CLOCK
// ============================================================================

/// Wall clock in the host's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&Local).date_naive()
    }
}

// ============================================================================
// OFFSET CLOCK
// ============================================================================

/// Wall clock pinned to a fixed UTC offset instead of the host timezone
///
/// Used when the configuration sets `utc_offset_minutes` (e.g. +240 for Dubai).
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    offset: FixedOffset,
}

impl OffsetClock {
    pub fn new(offset: FixedOffset) -> Self {
        OffsetClock { offset }
    }

    /// Build from minutes east of UTC; out-of-range values yield None
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

// ============================================================================
// FIXED CLOCK
// ============================================================================

/// Manually driven clock for tests and replays
///
/// Cloning shares the same underlying instant, so a test can keep a handle
/// and advance time under a store that owns another clone.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        FixedClock {
            now: Arc::new(RwLock::new(now)),
            offset,
        }
    }

    /// Fixed clock at `now` in UTC
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// Shared system clock handle
pub fn system() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dubai() -> FixedOffset {
        FixedOffset::east_opt(4 * 3600).unwrap()
    }

    #[test]
    fn test_fixed_clock_local_date_uses_offset() {
        // 22:30 UTC is already the next day in Dubai (+04:00)
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 22, 30, 0).unwrap();
        let clock = FixedClock::new(now, dubai());

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(
            FixedClock::utc(now).today(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_is_today_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(now, dubai());

        // Local midnight in Dubai is 20:00 UTC the previous day
        let start_of_day = Utc.with_ymd_and_hms(2024, 4, 30, 20, 0, 0).unwrap();
        let just_before = start_of_day - chrono::Duration::seconds(1);

        assert!(clock.is_today(start_of_day));
        assert!(!clock.is_today(just_before));
    }

    #[test]
    fn test_fixed_clock_clones_share_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(now, dubai());
        let handle = clock.clone();

        handle.advance(chrono::Duration::days(1));

        assert_eq!(clock.now(), now + chrono::Duration::days(1));
    }

    #[test]
    fn test_offset_clock_rejects_out_of_range() {
        assert!(OffsetClock::from_minutes(240).is_some());
        assert!(OffsetClock::from_minutes(24 * 60).is_none());
        assert!(OffsetClock::from_minutes(40_000_000).is_none());
        assert!(OffsetClock::from_minutes(i32::MIN).is_none());
    }
}
