//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;
}

/// Plan catalog repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// List every plan, cheapest first
    async fn list(&self) -> DbResult<Vec<PlanRow>>;

    /// Find a plan by ID
    async fn find_by_id(&self, id: i32) -> DbResult<Option<PlanRow>>;
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find every subscription of a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>>;

    /// Find the pending request of a user, if any
    async fn find_pending_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find all pending requests, oldest first
    async fn find_pending(&self) -> DbResult<Vec<SubscriptionRow>>;

    /// Find approved subscriptions of a user whose end date is on or after `today`
    async fn find_active_by_user_id(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> DbResult<Vec<SubscriptionRow>>;

    /// Insert a pending request
    ///
    /// Fails with [`crate::DbError::Conflict`] when the user already has one.
    async fn create_pending(&self, sub: CreatePendingSubscription) -> DbResult<SubscriptionRow>;

    /// Approve a pending request and record its payment and sale
    ///
    /// Returns `None` when the row is no longer pending.
    async fn approve(&self, approval: ApproveSubscription) -> DbResult<Option<ApprovalRecord>>;

    /// Replace a pending combination-package request with its component rows
    ///
    /// Returns `None` when the row is no longer pending.
    async fn expand_package(&self, expansion: ExpandPackage) -> DbResult<Option<ApprovalRecord>>;

    /// Move a subscription from `expected` to `next`
    ///
    /// Returns `None` when the stored status is not `expected`.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
        change: StatusChange,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Cancel every pending request submitted before `cutoff`
    async fn cancel_pending_requested_before(
        &self,
        cutoff: DateTime<Utc>,
        change: StatusChange,
    ) -> DbResult<Vec<SubscriptionRow>>;

    /// Find approved subscriptions ending exactly `days` days after `today`
    async fn find_expiring(
        &self,
        today: NaiveDate,
        days: &[i32],
    ) -> DbResult<Vec<ExpiringSubscriptionRow>>;
}

/// Create pending subscription input
#[derive(Debug, Clone)]
pub struct CreatePendingSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: i32,
    pub requested_at: DateTime<Utc>,
    pub requested_start: NaiveDate,
    pub end_date: NaiveDate,
    pub periods: i32,
    pub amount_paid_cents: i64,
    pub discount_type: String,
}

/// Approve subscription input
#[derive(Debug, Clone)]
pub struct ApproveSubscription {
    pub id: Uuid,
    pub service_start: NaiveDate,
    pub end_date: NaiveDate,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

/// One approved row written by a package expansion
#[derive(Debug, Clone)]
pub struct PackageComponent {
    pub id: Uuid,
    pub plan_id: i32,
    pub service_start: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid_cents: i64,
    pub discount_type: String,
}

/// Expand combination package input
#[derive(Debug, Clone)]
pub struct ExpandPackage {
    pub pending_id: Uuid,
    pub user_id: Uuid,
    pub components: Vec<PackageComponent>,
    pub sale_total_cents: i64,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

/// Audit fields written with a status change
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub decided_by: Option<String>,
    pub decided_at: DateTime<Utc>,
    pub reason: Option<String>,
}
