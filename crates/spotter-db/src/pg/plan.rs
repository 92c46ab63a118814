//! PostgreSQL plan catalog repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::PlanRow;
use crate::repo::PlanRepository;

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    /// Create a new plan repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        let plans = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, plan_name, price_cents, duration_months, duration_days,
                   is_member_only, is_combination
            FROM plans
            ORDER BY price_cents, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, plan_name, price_cents, duration_months, duration_days,
                   is_member_only, is_combination
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}
