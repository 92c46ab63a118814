//! Time source

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date at `utc_offset_hours` east of UTC
    fn today(&self, utc_offset_hours: i32) -> NaiveDate {
        (self.now() + TimeDelta::hours(i64::from(utc_offset_hours))).date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
