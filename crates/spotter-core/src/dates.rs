//! Service-period date arithmetic
//!
//! Month-based durations follow calendar months and clamp to the last day of
//! a shorter month (Jan 31 + 1 month = Feb 28). Day-based durations are exact.

use chrono::{Days, Months, NaiveDate};
use spotter_types::PlanDuration;

/// `start` moved forward by `duration`
pub fn add_duration(start: NaiveDate, duration: PlanDuration) -> Option<NaiveDate> {
    match duration {
        PlanDuration::Months(m) => start.checked_add_months(Months::new(m)),
        PlanDuration::Days(d) => start.checked_add_days(Days::new(u64::from(d))),
    }
}

/// `end` moved backward by `duration`
pub fn sub_duration(end: NaiveDate, duration: PlanDuration) -> Option<NaiveDate> {
    match duration {
        PlanDuration::Months(m) => end.checked_sub_months(Months::new(m)),
        PlanDuration::Days(d) => end.checked_sub_days(Days::new(u64::from(d))),
    }
}

/// Computed service period of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePeriod {
    /// First day of service
    pub start: NaiveDate,
    /// Last day of service
    pub end: NaiveDate,
    /// Periods actually billed
    pub periods: u32,
}

/// Forward computation at request time
///
/// A day pass always covers one period ending the next calendar day.
pub fn service_period(
    start: NaiveDate,
    duration: PlanDuration,
    periods: u32,
    is_day_pass: bool,
) -> Option<ServicePeriod> {
    if is_day_pass {
        return Some(ServicePeriod {
            start,
            end: start.succ_opt()?,
            periods: 1,
        });
    }
    Some(ServicePeriod {
        start,
        end: add_duration(start, duration.times(periods))?,
        periods,
    })
}

/// Backward recovery from a stored end date
///
/// Month clamping makes the forward step many-to-one (Jan 28..=31 + 1 month
/// all land on Feb 28), so the latest start whose forward end is `end` wins.
/// The day-pass end is re-derived from the recovered start so it always lands
/// on the next calendar day.
pub fn recover_period(
    end: NaiveDate,
    duration: PlanDuration,
    periods: u32,
    is_day_pass: bool,
) -> Option<ServicePeriod> {
    if is_day_pass {
        let start = end.pred_opt()?;
        return service_period(start, duration, 1, true);
    }
    let total = duration.times(periods);
    let earliest = sub_duration(end, total)?;
    let start = earliest
        .iter_days()
        .take(MAX_CLAMPED_DAYS + 1)
        .filter(|candidate| add_duration(*candidate, total) == Some(end))
        .last()
        .unwrap_or(earliest);
    Some(ServicePeriod {
        start,
        end,
        periods,
    })
}

/// Days a month end can lose to clamping (31 down to 28)
const MAX_CLAMPED_DAYS: usize = 3;

/// Service period granted on approval
///
/// Requests carry the start quoted to the member; rows without one fall back
/// to backward recovery from the stored end.
pub fn approval_period(
    requested_start: Option<NaiveDate>,
    end: NaiveDate,
    duration: PlanDuration,
    periods: u32,
    is_day_pass: bool,
) -> Option<ServicePeriod> {
    match requested_start {
        Some(start) => service_period(start, duration, periods, is_day_pass),
        None => recover_period(end, duration, periods, is_day_pass),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_arithmetic_clamps_to_month_end() {
        assert_eq!(
            add_duration(date(2025, 1, 31), PlanDuration::Months(1)),
            Some(date(2025, 2, 28))
        );
        assert_eq!(
            add_duration(date(2024, 1, 31), PlanDuration::Months(1)),
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn test_periods_multiply_duration() {
        let period = service_period(date(2025, 6, 1), PlanDuration::Months(1), 3, false).unwrap();
        assert_eq!(period.end, date(2025, 9, 1));
        assert_eq!(period.periods, 3);
    }

    #[test]
    fn test_day_pass_forces_single_day() {
        let period = service_period(date(2025, 12, 31), PlanDuration::Days(1), 5, true).unwrap();
        assert_eq!(period.end, date(2026, 1, 1));
        assert_eq!(period.periods, 1);
    }

    #[test]
    fn test_recovery_reproduces_start() {
        let forward = service_period(date(2025, 6, 1), PlanDuration::Months(12), 1, false).unwrap();
        let back = recover_period(forward.end, PlanDuration::Months(12), 1, false).unwrap();
        assert_eq!(back, forward);

        let forward = service_period(date(2025, 6, 1), PlanDuration::Days(1), 1, true).unwrap();
        let back = recover_period(forward.end, PlanDuration::Days(1), 1, true).unwrap();
        assert_eq!(back, forward);
    }

    #[test]
    fn test_recovery_prefers_latest_clamped_start() {
        let forward = service_period(date(2025, 1, 31), PlanDuration::Months(1), 1, false).unwrap();
        assert_eq!(forward.end, date(2025, 2, 28));

        let back = recover_period(forward.end, PlanDuration::Months(1), 1, false).unwrap();
        assert_eq!(back.start, date(2025, 1, 31));

        // Unclamped ends still recover the exact start
        let forward = service_period(date(2024, 3, 15), PlanDuration::Months(2), 1, false).unwrap();
        let back = recover_period(forward.end, PlanDuration::Months(2), 1, false).unwrap();
        assert_eq!(back, forward);
    }

    #[test]
    fn test_approval_period_uses_requested_start() {
        let end = date(2025, 2, 28);
        let period =
            approval_period(Some(date(2025, 1, 29)), end, PlanDuration::Months(1), 1, false)
                .unwrap();
        assert_eq!(period.start, date(2025, 1, 29));
        assert_eq!(period.end, end);

        let legacy = approval_period(None, end, PlanDuration::Months(1), 1, false).unwrap();
        assert_eq!(legacy.start, date(2025, 1, 31));
    }
}
