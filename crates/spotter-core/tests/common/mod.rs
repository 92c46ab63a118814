//! Common test utilities for spotter-core integration tests

pub mod mock_mailer;
pub mod mock_repos;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use spotter_core::{EngineConfig, FixedClock, SubscriptionService};

#[allow(unused_imports)]
pub use mock_mailer::MockMailer;
#[allow(unused_imports)]
pub use mock_repos::{MockPlanRepository, MockSubscriptionRepository, MockUserRepository};

pub type TestService =
    SubscriptionService<MockUserRepository, MockPlanRepository, MockSubscriptionRepository>;

/// Repositories and a service frozen at one instant
#[allow(dead_code)]
pub struct Harness {
    pub users: Arc<MockUserRepository>,
    pub plans: Arc<MockPlanRepository>,
    pub subscriptions: Arc<MockSubscriptionRepository>,
    pub config: EngineConfig,
    pub clock: Arc<FixedClock>,
    pub service: TestService,
}

/// Build a harness with the standard catalog at `now`
///
/// The business offset is zero so `today` is the UTC date of `now`.
#[allow(dead_code)]
pub fn harness_at(now: DateTime<Utc>) -> Harness {
    let users = Arc::new(MockUserRepository::new());
    let plans = Arc::new(MockPlanRepository::with_standard_catalog());
    let subscriptions = Arc::new(MockSubscriptionRepository::new(
        Arc::clone(&users),
        Arc::clone(&plans),
    ));
    let config = EngineConfig::default().with_utc_offset_hours(0);
    let clock = Arc::new(FixedClock(now));

    let service = SubscriptionService::new(
        config.clone(),
        Arc::clone(&users),
        Arc::clone(&plans),
        Arc::clone(&subscriptions),
    )
    .with_clock(clock.clone());

    Harness {
        users,
        plans,
        subscriptions,
        config,
        clock,
        service,
    }
}

/// Noon UTC on a date
#[allow(dead_code)]
pub fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
