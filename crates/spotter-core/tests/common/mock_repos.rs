//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use spotter_db::{
    ApprovalRecord, ApproveSubscription, CreatePendingSubscription, DbError, DbResult,
    ExpandPackage, ExpiringSubscriptionRow, PlanRepository, PlanRow, StatusChange,
    SubscriptionRepository, SubscriptionRow, UserRepository, UserRow,
};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    /// Insert an approved customer and return its ID
    #[allow(dead_code)]
    pub fn add_member(&self) -> Uuid {
        let user = Self::create_test_user("approved");
        let id = user.id;
        self.insert_user(user);
        id
    }

    /// Create a test user with the given account status
    pub fn create_test_user(account_status: &str) -> UserRow {
        let id = Uuid::new_v4();
        UserRow {
            id,
            email: format!("member-{id}@example.com"),
            full_name: "Test Member".to_string(),
            account_status: account_status.to_string(),
            is_customer: true,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }
}

// ============================================================================
// Plans
// ============================================================================

pub const MEMBERSHIP_FEE: i32 = 1;
pub const MEMBER_MONTHLY: i32 = 2;
pub const NON_MEMBER_MONTHLY: i32 = 3;
pub const COMBINATION_PACKAGE: i32 = 5;
pub const DAY_PASS: i32 = 6;

/// In-memory plan catalog for testing
#[derive(Default, Clone)]
pub struct MockPlanRepository {
    plans: Arc<DashMap<i32, PlanRow>>,
}

impl MockPlanRepository {
    /// Catalog matching the default plan-role table
    pub fn with_standard_catalog() -> Self {
        let repo = Self::default();
        repo.insert(MEMBERSHIP_FEE, "Membership Fee", 50_000, 12, 0, false, false);
        repo.insert(MEMBER_MONTHLY, "Member Monthly Plan", 99_900, 1, 0, true, false);
        repo.insert(NON_MEMBER_MONTHLY, "Non-Member Monthly Plan", 150_000, 1, 0, false, false);
        // Catalog durations deliberately differ from the fixed 365/30 expansion
        repo.insert(COMBINATION_PACKAGE, "Combination Package", 149_900, 2, 0, false, true);
        repo.insert(DAY_PASS, "Day Pass", 15_000, 0, 1, false, false);
        repo
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i32,
        name: &str,
        price_cents: i64,
        duration_months: i32,
        duration_days: i32,
        is_member_only: bool,
        is_combination: bool,
    ) {
        self.plans.insert(
            id,
            PlanRow {
                id,
                plan_name: name.to_string(),
                price_cents,
                duration_months,
                duration_days,
                is_member_only,
                is_combination,
            },
        );
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        let mut plans: Vec<_> = self.plans.iter().map(|r| r.value().clone()).collect();
        plans.sort_by_key(|p| (p.price_cents, p.id));
        Ok(plans)
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// In-memory subscription repository for testing
///
/// `pending_by_user` plays the part of the partial unique index.
#[derive(Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<Uuid, SubscriptionRow>>,
    pending_by_user: Arc<DashMap<Uuid, Uuid>>,
    payments: Arc<DashMap<Uuid, (Uuid, i64)>>,
    sales: Arc<DashMap<Uuid, (i64, Vec<Uuid>)>>,
    users: Arc<MockUserRepository>,
    plans: Arc<MockPlanRepository>,
}

impl MockSubscriptionRepository {
    pub fn new(users: Arc<MockUserRepository>, plans: Arc<MockPlanRepository>) -> Self {
        Self {
            subs: Arc::default(),
            pending_by_user: Arc::default(),
            payments: Arc::default(),
            sales: Arc::default(),
            users,
            plans,
        }
    }

    /// Insert a row directly
    pub fn insert(&self, row: SubscriptionRow) {
        if row.status == "pending_approval" {
            self.pending_by_user.insert(row.user_id, row.id);
        }
        self.subs.insert(row.id, row);
    }

    /// Seed an approved subscription
    #[allow(dead_code)]
    pub fn seed_approved(&self, user_id: Uuid, plan_id: i32, start: NaiveDate, end: NaiveDate) -> Uuid {
        let id = Uuid::new_v4();
        self.insert(SubscriptionRow {
            id,
            user_id,
            plan_id,
            status: "approved".to_string(),
            requested_at: Utc::now(),
            requested_start: Some(start),
            service_start: Some(start),
            end_date: end,
            periods: 1,
            amount_paid_cents: 0,
            discount_type: "none".to_string(),
            decided_by: Some("staff".to_string()),
            decided_at: Some(Utc::now()),
            decline_reason: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Seed a pending request submitted at `requested_at`
    #[allow(dead_code)]
    pub fn seed_pending(
        &self,
        user_id: Uuid,
        plan_id: i32,
        requested_at: DateTime<Utc>,
        end: NaiveDate,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.insert(SubscriptionRow {
            id,
            user_id,
            plan_id,
            status: "pending_approval".to_string(),
            requested_at,
            requested_start: None,
            service_start: None,
            end_date: end,
            periods: 1,
            amount_paid_cents: 0,
            discount_type: "none".to_string(),
            decided_by: None,
            decided_at: None,
            decline_reason: None,
            created_at: requested_at,
        });
        id
    }

    /// Snapshot of one row
    #[allow(dead_code)]
    pub fn get(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subs.get(&id).map(|r| r.value().clone())
    }

    /// Every row of a user
    #[allow(dead_code)]
    pub fn rows_for(&self, user_id: Uuid) -> Vec<SubscriptionRow> {
        self.subs
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Number of rows of a user in `status`
    #[allow(dead_code)]
    pub fn count_with_status(&self, user_id: Uuid, status: &str) -> usize {
        self.subs
            .iter()
            .filter(|r| r.user_id == user_id && r.status == status)
            .count()
    }

    /// Recorded payments as (subscription, amount)
    #[allow(dead_code)]
    pub fn payments(&self) -> Vec<(Uuid, i64)> {
        self.payments.iter().map(|r| *r.value()).collect()
    }

    /// Recorded sales as (total, subscriptions)
    #[allow(dead_code)]
    pub fn sales(&self) -> Vec<(i64, Vec<Uuid>)> {
        self.sales.iter().map(|r| r.value().clone()).collect()
    }

    fn record_sale(&self, rows: &[SubscriptionRow], total: i64) -> Uuid {
        for row in rows.iter().filter(|r| r.amount_paid_cents > 0) {
            self.payments
                .insert(Uuid::new_v4(), (row.id, row.amount_paid_cents));
        }
        let sale_id = Uuid::new_v4();
        self.sales
            .insert(sale_id, (total, rows.iter().map(|r| r.id).collect()));
        sale_id
    }

    fn sorted(mut rows: Vec<SubscriptionRow>, newest_first: bool) -> Vec<SubscriptionRow> {
        rows.sort_by_key(|r| r.created_at);
        if newest_first {
            rows.reverse();
        }
        rows
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.get(id))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        Ok(Self::sorted(self.rows_for(user_id), true))
    }

    async fn find_pending_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let id = self.pending_by_user.get(&user_id).map(|id| *id.value());
        Ok(id.and_then(|id| self.get(id)))
    }

    async fn find_pending(&self) -> DbResult<Vec<SubscriptionRow>> {
        let mut rows: Vec<_> = self
            .subs
            .iter()
            .filter(|r| r.status == "pending_approval")
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.requested_at);
        Ok(rows)
    }

    async fn find_active_by_user_id(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let mut rows: Vec<_> = self
            .rows_for(user_id)
            .into_iter()
            .filter(|r| r.status == "approved" && r.end_date >= today)
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.end_date));
        Ok(rows)
    }

    async fn create_pending(&self, sub: CreatePendingSubscription) -> DbResult<SubscriptionRow> {
        match self.pending_by_user.entry(sub.user_id) {
            Entry::Occupied(_) => Err(DbError::Conflict(
                "subscriptions_one_pending_per_user".to_string(),
            )),
            Entry::Vacant(slot) => {
                let row = SubscriptionRow {
                    id: sub.id,
                    user_id: sub.user_id,
                    plan_id: sub.plan_id,
                    status: "pending_approval".to_string(),
                    requested_at: sub.requested_at,
                    requested_start: Some(sub.requested_start),
                    service_start: None,
                    end_date: sub.end_date,
                    periods: sub.periods,
                    amount_paid_cents: sub.amount_paid_cents,
                    discount_type: sub.discount_type,
                    decided_by: None,
                    decided_at: None,
                    decline_reason: None,
                    created_at: sub.requested_at,
                };
                self.subs.insert(row.id, row.clone());
                slot.insert(row.id);
                Ok(row)
            }
        }
    }

    async fn approve(&self, approval: ApproveSubscription) -> DbResult<Option<ApprovalRecord>> {
        let row = {
            let Some(mut entry) = self.subs.get_mut(&approval.id) else {
                return Ok(None);
            };
            if entry.status != "pending_approval" {
                return Ok(None);
            }
            entry.status = "approved".to_string();
            entry.service_start = Some(approval.service_start);
            entry.end_date = approval.end_date;
            entry.decided_by = Some(approval.decided_by.clone());
            entry.decided_at = Some(approval.decided_at);
            entry.value().clone()
        };
        self.pending_by_user.remove(&row.user_id);

        let sale_id = self.record_sale(std::slice::from_ref(&row), row.amount_paid_cents);
        Ok(Some(ApprovalRecord {
            subscriptions: vec![row],
            sale_id,
        }))
    }

    async fn expand_package(&self, expansion: ExpandPackage) -> DbResult<Option<ApprovalRecord>> {
        let Some((_, pending)) = self
            .subs
            .remove_if(&expansion.pending_id, |_, r| r.status == "pending_approval")
        else {
            return Ok(None);
        };
        self.pending_by_user.remove(&pending.user_id);

        let rows: Vec<_> = expansion
            .components
            .iter()
            .map(|c| SubscriptionRow {
                id: c.id,
                user_id: expansion.user_id,
                plan_id: c.plan_id,
                status: "approved".to_string(),
                requested_at: pending.requested_at,
                requested_start: Some(c.service_start),
                service_start: Some(c.service_start),
                end_date: c.end_date,
                periods: 1,
                amount_paid_cents: c.amount_paid_cents,
                discount_type: c.discount_type.clone(),
                decided_by: Some(expansion.decided_by.clone()),
                decided_at: Some(expansion.decided_at),
                decline_reason: None,
                created_at: expansion.decided_at,
            })
            .collect();
        for row in &rows {
            self.subs.insert(row.id, row.clone());
        }

        let sale_id = self.record_sale(&rows, expansion.sale_total_cents);
        Ok(Some(ApprovalRecord {
            subscriptions: rows,
            sale_id,
        }))
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
        change: StatusChange,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = {
            let Some(mut entry) = self.subs.get_mut(&id) else {
                return Ok(None);
            };
            if entry.status != expected {
                return Ok(None);
            }
            entry.status = next.to_string();
            if change.decided_by.is_some() {
                entry.decided_by = change.decided_by;
            }
            entry.decided_at = Some(change.decided_at);
            if change.reason.is_some() {
                entry.decline_reason = change.reason;
            }
            entry.value().clone()
        };
        if expected == "pending_approval" {
            self.pending_by_user.remove(&row.user_id);
        }
        Ok(Some(row))
    }

    async fn cancel_pending_requested_before(
        &self,
        cutoff: DateTime<Utc>,
        change: StatusChange,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let stale: Vec<Uuid> = self
            .subs
            .iter()
            .filter(|r| r.status == "pending_approval" && r.requested_at < cutoff)
            .map(|r| r.id)
            .collect();

        let mut cancelled = Vec::new();
        for id in stale {
            if let Some(row) = self
                .update_status_if(id, "pending_approval", "cancelled", change.clone())
                .await?
            {
                cancelled.push(row);
            }
        }
        Ok(cancelled)
    }

    async fn find_expiring(
        &self,
        today: NaiveDate,
        days: &[i32],
    ) -> DbResult<Vec<ExpiringSubscriptionRow>> {
        let approved: Vec<SubscriptionRow> = self
            .subs
            .iter()
            .filter(|r| r.status == "approved")
            .map(|r| r.value().clone())
            .collect();

        let mut rows = Vec::new();
        for sub in approved {
            let remaining = (sub.end_date - today).num_days() as i32;
            if !days.contains(&remaining) {
                continue;
            }
            let (Some(user), Some(plan)) = (
                self.users.find_by_id(sub.user_id).await?,
                self.plans.find_by_id(sub.plan_id).await?,
            ) else {
                continue;
            };
            rows.push(ExpiringSubscriptionRow {
                subscription_id: sub.id,
                user_id: sub.user_id,
                email: user.email,
                full_name: user.full_name,
                plan_id: plan.id,
                plan_name: plan.plan_name,
                price_cents: plan.price_cents,
                end_date: sub.end_date,
                days_remaining: remaining,
            });
        }
        rows.sort_by(|a, b| a.end_date.cmp(&b.end_date).then(a.email.cmp(&b.email)));
        Ok(rows)
    }
}
