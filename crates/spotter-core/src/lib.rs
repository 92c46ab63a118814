//! Spotter Core - Subscription lifecycle engine
//!
//! Plan compatibility rules, the request pipeline, the approval workflow
//! (including combination-package expansion) and the two periodic jobs: the
//! stale-request reaper and the expiry notifier.
//!
//! # Example
//!
//! ```rust,ignore
//! use spotter_core::{EngineConfig, SubscriptionRequest, SubscriptionService};
//! use spotter_db::Repositories;
//!
//! let repos = Repositories::new(pool);
//! let service = SubscriptionService::new(
//!     EngineConfig::default(),
//!     Arc::new(repos.users),
//!     Arc::new(repos.plans),
//!     Arc::new(repos.subscriptions),
//! );
//!
//! let outcome = service
//!     .request(SubscriptionRequest {
//!         user_id,
//!         plan_id: PlanId(2),
//!         mode: RequestMode::Renewal,
//!         periods: 1,
//!     })
//!     .await?;
//! ```

pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod mailer;
pub mod notifier;
pub mod reaper;
pub mod resolver;
pub mod roles;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::SubscriptionError;
pub use mailer::{Email, LogMailer, MailError, Mailer, SmtpConfig, SmtpMailer};
pub use notifier::{
    render_reminder, DeliveryStatus, ExpiryNotifier, NotificationDetail, NotifyOutcome,
    ReminderTier,
};
pub use reaper::{ReapOutcome, StaleRequestReaper};
pub use resolver::{resolve, ActivePlan, Portfolio};
pub use roles::PlanRoles;
pub use service::{
    ApprovalKind, ApprovalOutcome, AvailablePlans, PendingRequestStatus, PlanAvailability,
    RequestOutcome, SubscriptionRequest, SubscriptionService, SubscriptionView,
};
