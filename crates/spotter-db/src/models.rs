//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use spotter_types::{
    AccountStatus, Plan, PlanId, Subscription, SubscriptionId, SubscriptionStatus, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::DbError;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub account_status: String,
    pub is_customer: bool,
    pub created_at: DateTime<Utc>,
}

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: i32,
    pub plan_name: String,
    pub price_cents: i64,
    pub duration_months: i32,
    pub duration_days: i32,
    pub is_member_only: bool,
    pub is_combination: bool,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub requested_start: Option<NaiveDate>,
    pub service_start: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub periods: i32,
    pub amount_paid_cents: i64,
    pub discount_type: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Approved subscription nearing its end date, joined with user and plan
#[derive(Debug, Clone, FromRow)]
pub struct ExpiringSubscriptionRow {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub plan_id: i32,
    pub plan_name: String,
    pub price_cents: i64,
    pub end_date: NaiveDate,
    pub days_remaining: i32,
}

/// Rows written by a successful approval
#[derive(Debug, Clone)]
pub struct ApprovalRecord {
    /// Approved subscription rows (three for a combination package)
    pub subscriptions: Vec<SubscriptionRow>,
    /// Sale recorded for the approval
    pub sale_id: Uuid,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Parse the stored account status
    pub fn status(&self) -> Result<AccountStatus, DbError> {
        self.account_status
            .parse()
            .map_err(|e: spotter_types::ParseError| DbError::InvalidData(e.to_string()))
    }
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: PlanId(row.id),
            name: row.plan_name,
            price_cents: row.price_cents,
            duration_months: row.duration_months,
            duration_days: row.duration_days,
            is_member_only: row.is_member_only,
            is_combination: row.is_combination,
        }
    }
}

impl SubscriptionRow {
    /// Parse the stored lifecycle status
    pub fn status(&self) -> Result<SubscriptionStatus, DbError> {
        self.status
            .parse()
            .map_err(|e: spotter_types::ParseError| DbError::InvalidData(e.to_string()))
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DbError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = row.status()?;
        let periods = u32::try_from(row.periods)
            .map_err(|_| DbError::InvalidData(format!("periods {}", row.periods)))?;

        Ok(Self {
            id: SubscriptionId(row.id),
            user_id: UserId(row.user_id),
            plan_id: PlanId(row.plan_id),
            status,
            requested_at: row.requested_at,
            requested_start: row.requested_start,
            service_start: row.service_start,
            end_date: row.end_date,
            periods,
            amount_paid_cents: row.amount_paid_cents,
            discount_type: row.discount_type,
            created_at: row.created_at,
        })
    }
}
