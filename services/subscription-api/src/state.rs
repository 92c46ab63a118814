//! Application state for the Subscription API service.

use spotter_core::{
    Clock, ExpiryNotifier, Mailer, StaleRequestReaper, SubscriptionService, SystemClock,
};
use spotter_db::pg::{
    PgPlanRepository, PgSubscriptionRepository, PgUserRepository, Repositories,
};
use spotter_db::DbPool;
use std::sync::Arc;

use crate::config::Config;

/// Subscription service over the PostgreSQL repositories
pub type Service = SubscriptionService<PgUserRepository, PgPlanRepository, PgSubscriptionRepository>;

/// Stale-request reaper over the PostgreSQL repositories
pub type Reaper = StaleRequestReaper<PgSubscriptionRepository>;

/// Expiry notifier with the configured mail transport
pub type Notifier = ExpiryNotifier<PgSubscriptionRepository, dyn Mailer>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Request pipeline, approval workflow and queries
    pub subscriptions: Arc<Service>,
    /// Pending request expiry job
    pub reaper: Arc<Reaper>,
    /// Expiry reminder job
    pub notifier: Arc<Notifier>,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(repos: Repositories, mailer: Arc<dyn Mailer>, pool: DbPool, config: Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine = config.engine.clone();
        let subscriptions = Arc::new(repos.subscriptions);

        let service = SubscriptionService::new(
            engine.clone(),
            Arc::new(repos.users),
            Arc::new(repos.plans),
            subscriptions.clone(),
        )
        .with_clock(clock.clone());
        let reaper = StaleRequestReaper::new(engine.clone(), subscriptions.clone(), clock.clone());
        let notifier = ExpiryNotifier::new(engine, subscriptions, mailer, clock);

        Self {
            subscriptions: Arc::new(service),
            reaper: Arc::new(reaper),
            notifier: Arc::new(notifier),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
