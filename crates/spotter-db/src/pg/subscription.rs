//! PostgreSQL subscription repository implementation
//!
//! Approvals run in a single transaction: the status-guarded update (or the
//! package expansion), the payment rows and the sale are committed together.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{ApprovalRecord, ExpiringSubscriptionRow, SubscriptionRow};
use crate::repo::{
    ApproveSubscription, CreatePendingSubscription, ExpandPackage, StatusChange,
    SubscriptionRepository,
};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_payment(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    amount_cents: i64,
    paid_at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, subscription_id, amount_cents, paid_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(subscription_id)
    .bind(amount_cents)
    .bind(paid_at)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_sale(
    conn: &mut PgConnection,
    user_id: Uuid,
    total_amount_cents: i64,
    sold_at: DateTime<Utc>,
) -> DbResult<Uuid> {
    let sale_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO sales (id, user_id, total_amount_cents, sale_type, sold_at)
        VALUES ($1, $2, $3, 'subscription', $4)
        "#,
    )
    .bind(sale_id)
    .bind(user_id)
    .bind(total_amount_cents)
    .bind(sold_at)
    .execute(conn)
    .await?;

    Ok(sale_id)
}

async fn insert_sale_detail(
    conn: &mut PgConnection,
    sale_id: Uuid,
    subscription_id: Uuid,
    price_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_details (sale_id, subscription_id, quantity, price_cents)
        VALUES ($1, $2, 1, $3)
        "#,
    )
    .bind(sale_id)
    .bind(subscription_id)
    .bind(price_cents)
    .execute(conn)
    .await?;

    Ok(())
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                   decline_reason, created_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                   decline_reason, created_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn find_pending_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                   decline_reason, created_at
            FROM subscriptions
            WHERE user_id = $1 AND status = 'pending_approval'
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_pending(&self) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                   decline_reason, created_at
            FROM subscriptions
            WHERE status = 'pending_approval'
            ORDER BY requested_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn find_active_by_user_id(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                   decline_reason, created_at
            FROM subscriptions
            WHERE user_id = $1 AND status = 'approved' AND end_date >= $2
            ORDER BY end_date DESC
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn create_pending(&self, sub: CreatePendingSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, user_id, plan_id, status, requested_at, requested_start,
                                       service_start, end_date, periods, amount_paid_cents,
                                       discount_type, created_at)
            VALUES ($1, $2, $3, 'pending_approval', $4, $5, NULL, $6, $7, $8, $9, $4)
            RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                      decline_reason, created_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.plan_id)
        .bind(sub.requested_at)
        .bind(sub.requested_start)
        .bind(sub.end_date)
        .bind(sub.periods)
        .bind(sub.amount_paid_cents)
        .bind(&sub.discount_type)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(row)
    }

    async fn approve(&self, approval: ApproveSubscription) -> DbResult<Option<ApprovalRecord>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET status = 'approved', service_start = $2, end_date = $3,
                decided_by = $4, decided_at = $5
            WHERE id = $1 AND status = 'pending_approval'
            RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                      decline_reason, created_at
            "#,
        )
        .bind(approval.id)
        .bind(approval.service_start)
        .bind(approval.end_date)
        .bind(&approval.decided_by)
        .bind(approval.decided_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        insert_payment(&mut tx, row.id, row.amount_paid_cents, approval.decided_at).await?;
        let sale_id =
            insert_sale(&mut tx, row.user_id, row.amount_paid_cents, approval.decided_at).await?;
        insert_sale_detail(&mut tx, sale_id, row.id, row.amount_paid_cents).await?;

        tx.commit().await?;

        Ok(Some(ApprovalRecord {
            subscriptions: vec![row],
            sale_id,
        }))
    }

    async fn expand_package(&self, expansion: ExpandPackage) -> DbResult<Option<ApprovalRecord>> {
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            DELETE FROM subscriptions
            WHERE id = $1 AND status = 'pending_approval'
            RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                      decline_reason, created_at
            "#,
        )
        .bind(expansion.pending_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(pending) = pending else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut rows = Vec::with_capacity(expansion.components.len());
        for component in &expansion.components {
            let row = sqlx::query_as::<_, SubscriptionRow>(
                r#"
                INSERT INTO subscriptions (id, user_id, plan_id, status, requested_at,
                                           requested_start, service_start, end_date, periods,
                                           amount_paid_cents, discount_type, decided_by,
                                           decided_at, created_at)
                VALUES ($1, $2, $3, 'approved', $4, $5, $5, $6, 1, $7, $8, $9, $10, $10)
                RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                          decline_reason, created_at
                "#,
            )
            .bind(component.id)
            .bind(expansion.user_id)
            .bind(component.plan_id)
            .bind(pending.requested_at)
            .bind(component.service_start)
            .bind(component.end_date)
            .bind(component.amount_paid_cents)
            .bind(&component.discount_type)
            .bind(&expansion.decided_by)
            .bind(expansion.decided_at)
            .fetch_one(&mut *tx)
            .await?;

            if row.amount_paid_cents > 0 {
                insert_payment(&mut tx, row.id, row.amount_paid_cents, expansion.decided_at)
                    .await?;
            }
            rows.push(row);
        }

        let sale_id = insert_sale(
            &mut tx,
            expansion.user_id,
            expansion.sale_total_cents,
            expansion.decided_at,
        )
        .await?;
        for row in &rows {
            insert_sale_detail(&mut tx, sale_id, row.id, row.amount_paid_cents).await?;
        }

        tx.commit().await?;

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
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET status = $3, decided_by = COALESCE($4, decided_by), decided_at = $5,
                decline_reason = COALESCE($6, decline_reason)
            WHERE id = $1 AND status = $2
            RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                      decline_reason, created_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(&change.decided_by)
        .bind(change.decided_at)
        .bind(&change.reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn cancel_pending_requested_before(
        &self,
        cutoff: DateTime<Utc>,
        change: StatusChange,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled', decided_by = $2, decided_at = $3, decline_reason = $4
            WHERE status = 'pending_approval' AND requested_at < $1
            RETURNING id, user_id, plan_id, status, requested_at, requested_start, service_start,
                   end_date, periods, amount_paid_cents, discount_type, decided_by, decided_at,
                      decline_reason, created_at
            "#,
        )
        .bind(cutoff)
        .bind(&change.decided_by)
        .bind(change.decided_at)
        .bind(&change.reason)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_expiring(
        &self,
        today: NaiveDate,
        days: &[i32],
    ) -> DbResult<Vec<ExpiringSubscriptionRow>> {
        let rows = sqlx::query_as::<_, ExpiringSubscriptionRow>(
            r#"
            SELECT s.id AS subscription_id, s.user_id, u.email, u.full_name,
                   p.id AS plan_id, p.plan_name, p.price_cents, s.end_date,
                   (s.end_date - $1::date) AS days_remaining
            FROM subscriptions s
            JOIN users u ON u.id = s.user_id
            JOIN plans p ON p.id = s.plan_id
            WHERE s.status = 'approved'
              AND (s.end_date - $1::date) = ANY($2)
            ORDER BY s.end_date ASC, u.email ASC
            "#,
        )
        .bind(today)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
