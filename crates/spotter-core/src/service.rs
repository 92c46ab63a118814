//! Subscription service
//!
//! Request pipeline, approval workflow and the read-side queries over a
//! user's subscriptions.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use metrics::counter;
use serde::Serialize;
use spotter_db::{
    ApproveSubscription, CreatePendingSubscription, DbError, ExpandPackage, PackageComponent,
    PlanRepository, StatusChange, SubscriptionRepository, SubscriptionRow, UserRepository,
    UserRow,
};
use spotter_types::{
    AccountStatus, AvailabilityReason, DisplayStatus, Plan, PlanId, PlanRole, RequestMode,
    Subscription, SubscriptionId, SubscriptionStatus, UserId,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    clock::{Clock, SystemClock},
    config::EngineConfig,
    dates::{approval_period, service_period},
    resolver::{resolve, ActivePlan, Portfolio},
    SubscriptionError,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// A member's request for a plan
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    /// Requesting user
    pub user_id: UserId,
    /// Requested plan
    pub plan_id: PlanId,
    /// How the service period is positioned
    pub mode: RequestMode,
    /// Number of plan periods to pay for
    pub periods: u32,
}

/// Result of an accepted request
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    /// Stored pending subscription
    pub subscription: Subscription,
    /// Requested plan name
    pub plan_name: String,
    /// Mode the request was made in
    pub mode: RequestMode,
    /// Computed first day of service
    pub service_start: NaiveDate,
    /// Computed last day of service
    pub end_date: NaiveDate,
    /// Periods billed
    pub periods: u32,
    /// Total price in cents
    pub total_price_cents: i64,
}

/// Which approval path a request took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    /// Start recovered from the stored end date
    Standard,
    /// Single-day access
    DayPass,
    /// Package expanded into its component subscriptions
    CombinationPackage,
}

impl ApprovalKind {
    /// Metrics label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::DayPass => "day_pass",
            Self::CombinationPackage => "combination_package",
        }
    }
}

/// Result of an approval
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    /// Approval path
    pub kind: ApprovalKind,
    /// Approved rows (three for a package)
    pub subscriptions: Vec<Subscription>,
    /// Recorded sale
    pub sale_id: Uuid,
}

/// A subscription with its plan name and read-time status
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    /// Stored subscription
    #[serde(flatten)]
    pub subscription: Subscription,
    /// Plan name
    pub plan_name: String,
    /// Status as shown to the user today
    pub display_status: DisplayStatus,
    /// Label of `display_status`
    pub status_label: &'static str,
}

/// The pending request of a user and how long it has left
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequestStatus {
    /// Pending subscription
    pub subscription: Subscription,
    /// Plan name
    pub plan_name: String,
    /// When the reaper will cancel the request
    pub expires_at: DateTime<Utc>,
    /// Whether the request is already past its time to live
    pub is_expired: bool,
    /// Seconds until `expires_at` (zero once expired)
    pub seconds_remaining: i64,
}

/// A catalog plan decorated for one user
#[derive(Debug, Clone, Serialize)]
pub struct PlanAvailability {
    /// Catalog plan
    #[serde(flatten)]
    pub plan: Plan,
    /// Business role of the plan
    pub role: PlanRole,
    /// Whether the plan may be requested
    pub available: bool,
    /// Inverse of `available`
    pub is_locked: bool,
    /// Resolver reason
    pub reason: AvailabilityReason,
    /// Display message
    pub message: String,
    /// Display icon
    pub icon: &'static str,
}

/// Catalog as seen by one user
#[derive(Debug, Clone, Serialize)]
pub struct AvailablePlans {
    /// Whether a pending request blocks new requests
    pub has_pending_request: bool,
    /// The blocking pending request
    pub pending_request: Option<PendingRequestStatus>,
    /// Explanation when no plans are offered
    pub message: Option<String>,
    /// Decorated plans (empty while a request is pending)
    pub plans: Vec<PlanAvailability>,
    /// Active subscriptions
    pub active_subscriptions: Vec<SubscriptionView>,
    /// Whether a membership fee is active
    pub has_active_membership_fee: bool,
    /// Whether a monthly-tier plan is active
    pub has_active_monthly_plan: bool,
}

// =============================================================================
// Service
// =============================================================================

/// Subscription lifecycle service
pub struct SubscriptionService<U: UserRepository, P: PlanRepository, S: SubscriptionRepository> {
    config: EngineConfig,
    users: Arc<U>,
    plans: Arc<P>,
    subscriptions: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<U: UserRepository, P: PlanRepository, S: SubscriptionRepository> SubscriptionService<U, P, S> {
    /// Create a new subscription service on the system clock
    pub fn new(config: EngineConfig, users: Arc<U>, plans: Arc<P>, subscriptions: Arc<S>) -> Self {
        Self {
            config,
            users,
            plans,
            subscriptions,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.clock.today(self.config.utc_offset_hours)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Every catalog plan, cheapest first
    pub async fn plans(&self) -> Result<Vec<Plan>, SubscriptionError> {
        let rows = self.plans.list().await?;
        Ok(rows.into_iter().map(Plan::from).collect())
    }

    async fn catalog(&self) -> Result<HashMap<PlanId, Plan>, SubscriptionError> {
        Ok(self
            .plans()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    async fn plan(&self, plan_id: PlanId) -> Result<Plan, SubscriptionError> {
        self.plans
            .find_by_id(plan_id.0)
            .await?
            .map(Plan::from)
            .ok_or(SubscriptionError::PlanNotFound)
    }

    /// Catalog decorated with availability for one user
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn available_plans(&self, user_id: UserId) -> Result<AvailablePlans, SubscriptionError> {
        self.user(user_id).await?;
        let catalog = self.catalog().await?;
        let today = self.today();

        let active_rows = self
            .subscriptions
            .find_active_by_user_id(user_id.0, today)
            .await?;
        let portfolio = portfolio_of(&active_rows, &catalog);
        let roles = &self.config.roles;
        let has_active_membership_fee = portfolio.has_role(roles, PlanRole::MembershipFee);
        let has_active_monthly_plan = portfolio.has_monthly_plan(roles);
        let active_subscriptions = active_rows
            .into_iter()
            .map(|row| view(row, &catalog, today))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(pending) = self.pending_request(user_id).await? {
            let message = SubscriptionError::AlreadyPending {
                plan_name: pending.plan_name.clone(),
            }
            .to_string();
            return Ok(AvailablePlans {
                has_pending_request: true,
                pending_request: Some(pending),
                message: Some(message),
                plans: Vec::new(),
                active_subscriptions,
                has_active_membership_fee,
                has_active_monthly_plan,
            });
        }

        let mut plans: Vec<_> = catalog.into_values().collect();
        plans.sort_by_key(|p| (p.price_cents, p.id));
        let plans = plans
            .into_iter()
            .map(|plan| {
                let availability = resolve(plan.id, &portfolio, roles);
                PlanAvailability {
                    role: roles.role_of(plan.id),
                    available: availability.available,
                    is_locked: availability.is_locked(),
                    icon: availability.icon(),
                    reason: availability.reason,
                    message: availability.message,
                    plan,
                }
            })
            .collect();

        Ok(AvailablePlans {
            has_pending_request: false,
            pending_request: None,
            message: None,
            plans,
            active_subscriptions,
            has_active_membership_fee,
            has_active_monthly_plan,
        })
    }

    // =========================================================================
    // Request Pipeline
    // =========================================================================

    /// Submit a subscription request
    #[instrument(
        skip(self, req),
        fields(user_id = %req.user_id, plan_id = %req.plan_id, mode = %req.mode)
    )]
    pub async fn request(&self, req: SubscriptionRequest) -> Result<RequestOutcome, SubscriptionError> {
        let result = self.request_inner(req).await;
        let label = match &result {
            Ok(_) => "accepted",
            Err(e) => e.reason_code(),
        };
        counter!("subscription_requests_total", "result" => label).increment(1);
        if let Err(e) = &result {
            if e.is_validation() {
                warn!(reason = e.reason_code(), "Subscription request rejected: {}", e);
            }
        }
        result
    }

    async fn request_inner(&self, req: SubscriptionRequest) -> Result<RequestOutcome, SubscriptionError> {
        let user = self.user(req.user_id).await?;
        ensure_can_subscribe(&user)?;

        if let Some(pending) = self.subscriptions.find_pending_by_user_id(user.id).await? {
            return Err(self.already_pending(&pending).await);
        }

        let plan = self.plan(req.plan_id).await?;
        if req.periods == 0 {
            return Err(SubscriptionError::InvalidRequest(
                "periods must be at least 1".to_string(),
            ));
        }

        let now = self.clock.now();
        let today = self.today();
        let roles = &self.config.roles;
        let role = roles.role_of(plan.id);
        let is_day_pass = role == PlanRole::DayPass;
        // A package grants fixed terms on approval, so it is billed once
        let periods = if plan.is_combination || role == PlanRole::CombinationPackage {
            1
        } else {
            req.periods
        };

        let start = match req.mode {
            RequestMode::Renewal => self
                .subscriptions
                .find_active_by_user_id(user.id, today)
                .await?
                .iter()
                .filter(|row| row.plan_id == plan.id.0)
                .map(|row| row.end_date)
                .max()
                .ok_or_else(|| {
                    SubscriptionError::PrerequisiteMissing(format!(
                        "You have no active {} subscription to renew.",
                        plan.name
                    ))
                })?,
            RequestMode::AdvancePayment => self
                .subscriptions
                .find_active_by_user_id(user.id, today)
                .await?
                .iter()
                .map(|row| row.end_date)
                .max()
                .ok_or_else(|| {
                    SubscriptionError::PrerequisiteMissing(
                        "Advance payment requires an active subscription.".to_string(),
                    )
                })?,
            RequestMode::New => {
                let catalog = self.catalog().await?;
                let active = self
                    .subscriptions
                    .find_active_by_user_id(user.id, today)
                    .await?;
                let availability = resolve(plan.id, &portfolio_of(&active, &catalog), roles);
                if !availability.available {
                    return Err(SubscriptionError::PlanIncompatible {
                        reason: availability.reason,
                        message: availability.message,
                    });
                }
                today
            }
        };

        let period = service_period(start, plan.duration(), periods, is_day_pass).ok_or_else(
            || SubscriptionError::InvalidRequest("service period is out of range".to_string()),
        )?;
        let total_price_cents = plan.total_price_cents(period.periods);

        let row = self
            .subscriptions
            .create_pending(CreatePendingSubscription {
                id: Uuid::new_v4(),
                user_id: user.id,
                plan_id: plan.id.0,
                requested_at: now,
                requested_start: period.start,
                end_date: period.end,
                periods: i32::try_from(period.periods).map_err(|_| {
                    SubscriptionError::InvalidRequest("periods is too large".to_string())
                })?,
                amount_paid_cents: total_price_cents,
                discount_type: "none".to_string(),
            })
            .await;

        let row = match row {
            Ok(row) => row,
            Err(DbError::Conflict(_)) => {
                // Lost a race with a concurrent request from the same user
                return Err(match self.subscriptions.find_pending_by_user_id(user.id).await? {
                    Some(pending) => self.already_pending(&pending).await,
                    None => SubscriptionError::AlreadyPending {
                        plan_name: plan.name.clone(),
                    },
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            subscription_id = %row.id,
            service_start = %period.start,
            end_date = %period.end,
            periods = period.periods,
            "Subscription requested"
        );

        Ok(RequestOutcome {
            subscription: Subscription::try_from(row)?,
            plan_name: plan.name,
            mode: req.mode,
            service_start: period.start,
            end_date: period.end,
            periods: period.periods,
            total_price_cents,
        })
    }

    async fn already_pending(&self, pending: &SubscriptionRow) -> SubscriptionError {
        let plan_name = match self.plans.find_by_id(pending.plan_id).await {
            Ok(Some(plan)) => plan.plan_name,
            _ => format!("plan {}", pending.plan_id),
        };
        SubscriptionError::AlreadyPending { plan_name }
    }

    async fn user(&self, user_id: UserId) -> Result<UserRow, SubscriptionError> {
        self.users
            .find_by_id(user_id.0)
            .await?
            .ok_or(SubscriptionError::UserNotFound)
    }

    // =========================================================================
    // Approval Workflow
    // =========================================================================

    /// Approve a pending request
    #[instrument(skip(self), fields(subscription_id = %id))]
    pub async fn approve(
        &self,
        id: SubscriptionId,
        approved_by: &str,
    ) -> Result<ApprovalOutcome, SubscriptionError> {
        let row = self
            .row_for_transition(id, SubscriptionStatus::PendingApproval, SubscriptionStatus::Approved)
            .await?;
        let plan = self.plan(PlanId(row.plan_id)).await?;
        let role = self.config.roles.role_of(plan.id);
        let now = self.clock.now();

        let (kind, record) = if plan.is_combination || role == PlanRole::CombinationPackage {
            let record = self.expand_package(&row, &plan, approved_by, now).await?;
            (ApprovalKind::CombinationPackage, record)
        } else {
            let is_day_pass = role == PlanRole::DayPass;
            let period = approval_period(
                row.requested_start,
                row.end_date,
                plan.duration(),
                stored_periods(&row)?,
                is_day_pass,
            )
            .ok_or_else(|| SubscriptionError::Internal("service start is out of range".to_string()))?;

            let record = self
                .subscriptions
                .approve(ApproveSubscription {
                    id: row.id,
                    service_start: period.start,
                    end_date: period.end,
                    decided_by: approved_by.to_string(),
                    decided_at: now,
                })
                .await?;
            let kind = if is_day_pass {
                ApprovalKind::DayPass
            } else {
                ApprovalKind::Standard
            };
            (kind, record)
        };

        let Some(record) = record else {
            return Err(self.conflict_after_race(id, SubscriptionStatus::PendingApproval).await);
        };

        counter!("subscription_approvals_total", "kind" => kind.as_str()).increment(1);
        info!(
            kind = kind.as_str(),
            rows = record.subscriptions.len(),
            sale_id = %record.sale_id,
            approved_by,
            "Subscription approved"
        );

        Ok(ApprovalOutcome {
            kind,
            subscriptions: record
                .subscriptions
                .into_iter()
                .map(Subscription::try_from)
                .collect::<Result<_, _>>()?,
            sale_id: record.sale_id,
        })
    }

    async fn expand_package(
        &self,
        row: &SubscriptionRow,
        plan: &Plan,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<spotter_db::ApprovalRecord>, SubscriptionError> {
        let roles = &self.config.roles;

        // Components start on the day quoted at request time, which already
        // chains a renewal from the previous package receipt
        let start = approval_period(
            row.requested_start,
            row.end_date,
            plan.duration(),
            stored_periods(row)?,
            false,
        )
        .map(|period| period.start)
        .ok_or_else(|| SubscriptionError::Internal("package start is out of range".to_string()))?;

        let out_of_range = || SubscriptionError::Internal("package end is out of range".to_string());
        let fee_end = start
            .checked_add_days(Days::new(u64::from(self.config.package_fee_days)))
            .ok_or_else(out_of_range)?;
        let access_end = start
            .checked_add_days(Days::new(u64::from(self.config.package_access_days)))
            .ok_or_else(out_of_range)?;

        let fee_plan = self.plan(roles.membership_fee).await?;
        let total = row.amount_paid_cents;
        let fee_share = fee_plan.price_cents.clamp(0, total.max(0));
        let access_share = total - fee_share;

        let component = |plan_id: PlanId, end_date: NaiveDate, amount: i64, discount: &str| {
            PackageComponent {
                id: Uuid::new_v4(),
                plan_id: plan_id.0,
                service_start: start,
                end_date,
                amount_paid_cents: amount,
                discount_type: discount.to_string(),
            }
        };

        let components = vec![
            component(roles.membership_fee, fee_end, fee_share, "package"),
            component(roles.member_monthly, access_end, access_share, "package"),
            component(plan.id, access_end, 0, "package_receipt"),
        ];

        Ok(self
            .subscriptions
            .expand_package(ExpandPackage {
                pending_id: row.id,
                user_id: row.user_id,
                components,
                sale_total_cents: total,
                decided_by: approved_by.to_string(),
                decided_at: now,
            })
            .await?)
    }

    /// Decline a pending request
    #[instrument(skip(self), fields(subscription_id = %id))]
    pub async fn decline(
        &self,
        id: SubscriptionId,
        declined_by: &str,
        reason: Option<String>,
    ) -> Result<Subscription, SubscriptionError> {
        self.row_for_transition(id, SubscriptionStatus::PendingApproval, SubscriptionStatus::Rejected)
            .await?;

        let row = self
            .subscriptions
            .update_status_if(
                id.0,
                SubscriptionStatus::PendingApproval.as_str(),
                SubscriptionStatus::Rejected.as_str(),
                StatusChange {
                    decided_by: Some(declined_by.to_string()),
                    decided_at: self.clock.now(),
                    reason,
                },
            )
            .await?;
        let Some(row) = row else {
            return Err(self.conflict_after_race(id, SubscriptionStatus::PendingApproval).await);
        };

        counter!("subscription_declines_total").increment(1);
        info!(declined_by, "Subscription declined");
        Ok(Subscription::try_from(row)?)
    }

    /// Cancel the caller's own pending request
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cancel_pending_request(&self, user_id: UserId) -> Result<Subscription, SubscriptionError> {
        let pending = self
            .subscriptions
            .find_pending_by_user_id(user_id.0)
            .await?
            .ok_or(SubscriptionError::PendingRequestNotFound)?;

        let row = self
            .subscriptions
            .update_status_if(
                pending.id,
                SubscriptionStatus::PendingApproval.as_str(),
                SubscriptionStatus::Cancelled.as_str(),
                StatusChange {
                    decided_by: None,
                    decided_at: self.clock.now(),
                    reason: Some("cancelled by member".to_string()),
                },
            )
            .await?
            .ok_or(SubscriptionError::PendingRequestNotFound)?;

        info!(subscription_id = %row.id, "Pending request cancelled by member");
        Ok(Subscription::try_from(row)?)
    }

    /// Cancel an approved subscription
    #[instrument(skip(self), fields(subscription_id = %id))]
    pub async fn cancel_subscription(
        &self,
        id: SubscriptionId,
        cancelled_by: &str,
    ) -> Result<Subscription, SubscriptionError> {
        self.row_for_transition(id, SubscriptionStatus::Approved, SubscriptionStatus::Cancelled)
            .await?;

        let row = self
            .subscriptions
            .update_status_if(
                id.0,
                SubscriptionStatus::Approved.as_str(),
                SubscriptionStatus::Cancelled.as_str(),
                StatusChange {
                    decided_by: Some(cancelled_by.to_string()),
                    decided_at: self.clock.now(),
                    reason: Some("cancelled by staff".to_string()),
                },
            )
            .await?;
        let Some(row) = row else {
            return Err(self.conflict_after_race(id, SubscriptionStatus::Approved).await);
        };

        info!(cancelled_by, "Subscription cancelled");
        Ok(Subscription::try_from(row)?)
    }

    /// Load a row that must be in `expected` and allowed to move to `next`
    async fn row_for_transition(
        &self,
        id: SubscriptionId,
        expected: SubscriptionStatus,
        next: SubscriptionStatus,
    ) -> Result<SubscriptionRow, SubscriptionError> {
        let row = self
            .subscriptions
            .find_by_id(id.0)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;
        let current = row.status()?;
        if current != expected || !current.can_transition_to(next) {
            return Err(SubscriptionError::StateConflict { current, expected });
        }
        Ok(row)
    }

    /// Error for a status-guarded write that matched no row
    async fn conflict_after_race(
        &self,
        id: SubscriptionId,
        expected: SubscriptionStatus,
    ) -> SubscriptionError {
        match self.subscriptions.find_by_id(id.0).await {
            Ok(Some(row)) => match row.status() {
                Ok(current) => SubscriptionError::StateConflict { current, expected },
                Err(e) => e.into(),
            },
            Ok(None) => SubscriptionError::SubscriptionNotFound,
            Err(e) => e.into(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The user's pending request with its remaining lifetime
    pub async fn pending_request(
        &self,
        user_id: UserId,
    ) -> Result<Option<PendingRequestStatus>, SubscriptionError> {
        let Some(row) = self.subscriptions.find_pending_by_user_id(user_id.0).await? else {
            return Ok(None);
        };
        let plan_name = self
            .plans
            .find_by_id(row.plan_id)
            .await?
            .map(|p| p.plan_name)
            .unwrap_or_default();

        let expires_at = row.requested_at + self.config.pending_ttl_delta();
        let remaining = (expires_at - self.clock.now()).num_seconds();

        Ok(Some(PendingRequestStatus {
            subscription: Subscription::try_from(row)?,
            plan_name,
            expires_at,
            is_expired: remaining <= 0,
            seconds_remaining: remaining.max(0),
        }))
    }

    /// Every subscription of a user, newest first
    pub async fn user_subscriptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SubscriptionView>, SubscriptionError> {
        self.user(user_id).await?;
        let catalog = self.catalog().await?;
        let today = self.today();
        self.subscriptions
            .find_by_user_id(user_id.0)
            .await?
            .into_iter()
            .map(|row| view(row, &catalog, today))
            .collect()
    }

    /// Staff queue of pending requests, oldest first
    pub async fn pending_subscriptions(&self) -> Result<Vec<SubscriptionView>, SubscriptionError> {
        let catalog = self.catalog().await?;
        let today = self.today();
        self.subscriptions
            .find_pending()
            .await?
            .into_iter()
            .map(|row| view(row, &catalog, today))
            .collect()
    }

    /// The subscription that best describes the user's access today
    ///
    /// Day pass beats a monthly plan, which beats the membership fee; ties go
    /// to the most recent start.
    pub async fn current_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionView>, SubscriptionError> {
        let catalog = self.catalog().await?;
        let today = self.today();
        let roles = &self.config.roles;

        let current = self
            .subscriptions
            .find_active_by_user_id(user_id.0, today)
            .await?
            .into_iter()
            .min_by_key(|row| {
                (
                    roles.role_of(PlanId(row.plan_id)).display_priority(),
                    Reverse(row.service_start),
                    Reverse(row.end_date),
                )
            });

        current.map(|row| view(row, &catalog, today)).transpose()
    }

    /// Whether the user holds an active premium-granting subscription
    pub async fn has_premium_access(&self, user_id: UserId) -> Result<bool, SubscriptionError> {
        let roles = &self.config.roles;
        Ok(self
            .subscriptions
            .find_active_by_user_id(user_id.0, self.today())
            .await?
            .iter()
            .any(|row| roles.role_of(PlanId(row.plan_id)).grants_premium()))
    }
}

fn stored_periods(row: &SubscriptionRow) -> Result<u32, SubscriptionError> {
    u32::try_from(row.periods)
        .map_err(|_| SubscriptionError::Internal(format!("stored periods {}", row.periods)))
}

fn ensure_can_subscribe(user: &UserRow) -> Result<(), SubscriptionError> {
    let status = user.status()?;
    if status != AccountStatus::Approved {
        return Err(SubscriptionError::UserInactive {
            status: status.to_string(),
        });
    }
    if !user.is_customer {
        return Err(SubscriptionError::UserInactive {
            status: "not_a_customer".to_string(),
        });
    }
    Ok(())
}

fn plan_name(catalog: &HashMap<PlanId, Plan>, plan_id: i32) -> String {
    catalog
        .get(&PlanId(plan_id))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("plan {plan_id}"))
}

fn portfolio_of(active: &[SubscriptionRow], catalog: &HashMap<PlanId, Plan>) -> Portfolio {
    Portfolio::new(
        active
            .iter()
            .map(|row| ActivePlan {
                plan_id: PlanId(row.plan_id),
                plan_name: plan_name(catalog, row.plan_id),
                end_date: row.end_date,
            })
            .collect(),
    )
}

fn view(
    row: SubscriptionRow,
    catalog: &HashMap<PlanId, Plan>,
    today: NaiveDate,
) -> Result<SubscriptionView, SubscriptionError> {
    let plan_name = plan_name(catalog, row.plan_id);
    let subscription = Subscription::try_from(row)?;
    let display_status = subscription.display_status(today);
    Ok(SubscriptionView {
        subscription,
        plan_name,
        display_status,
        status_label: display_status.label(),
    })
}
