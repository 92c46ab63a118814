//! Stale-request reaper
//!
//! Cancels pending requests older than the configured time to live. The
//! predicate is purely age based, so overlapping or repeated runs are safe.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use spotter_db::{StatusChange, SubscriptionRepository};
use spotter_types::Subscription;
use tracing::{info, instrument};

use crate::{clock::Clock, config::EngineConfig, SubscriptionError};

/// Actor recorded on reaped rows
pub const REAPER_ACTOR: &str = "system:stale-request-reaper";

/// Result of one reaper run
#[derive(Debug, Clone, Serialize)]
pub struct ReapOutcome {
    /// Number of requests cancelled
    pub expired_count: usize,
    /// Cancelled requests
    pub expired: Vec<Subscription>,
}

/// Stale-request reaper
pub struct StaleRequestReaper<S: SubscriptionRepository> {
    subscriptions: Arc<S>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl<S: SubscriptionRepository> StaleRequestReaper<S> {
    /// Create a new reaper
    pub fn new(config: EngineConfig, subscriptions: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscriptions,
            config,
            clock,
        }
    }

    /// Cancel every pending request older than the time to live
    #[instrument(skip(self))]
    pub async fn reap(&self) -> Result<ReapOutcome, SubscriptionError> {
        let now = self.clock.now();
        let ttl = self.config.pending_ttl_delta();
        let cutoff = now - ttl;

        let rows = self
            .subscriptions
            .cancel_pending_requested_before(
                cutoff,
                StatusChange {
                    decided_by: Some(REAPER_ACTOR.to_string()),
                    decided_at: now,
                    reason: Some(format!(
                        "expired: not approved within {} hours",
                        ttl.num_hours()
                    )),
                },
            )
            .await?;

        let expired = rows
            .into_iter()
            .map(Subscription::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if !expired.is_empty() {
            counter!("subscription_requests_expired_total").increment(expired.len() as u64);
            info!(expired_count = expired.len(), %cutoff, "Stale subscription requests cancelled");
        }

        Ok(ReapOutcome {
            expired_count: expired.len(),
            expired,
        })
    }
}
