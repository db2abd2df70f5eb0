//! Injectable time source for month-window and deadline checks

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in UTC
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant, for deterministic evaluation
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock { instant }
    }

    /// Pin the clock to midday UTC of the given date
    pub fn at_date(date: NaiveDate) -> Self {
        let midday = NaiveTime::MIN + Duration::hours(12);
        FixedClock {
            instant: date.and_time(midday).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }
}
