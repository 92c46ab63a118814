//! Plan catalog handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use spotter_core::AvailablePlans;
use spotter_types::Plan;
use std::time::Instant;
use tracing::instrument;

use super::shared::{parse_user_id, record_op_duration};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
}

/// GET /api/v1/plans
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<PlansResponse>> {
    let start = Instant::now();

    let result = state.subscriptions.plans().await;
    record_op_duration("list_plans", start, result.is_ok());

    Ok(Json(PlansResponse { plans: result? }))
}

/// GET /api/v1/users/{user_id}/available-plans
#[instrument(skip(state))]
pub async fn available_plans(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AvailablePlans>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.available_plans(user_id).await;
    record_op_duration("available_plans", start, result.is_ok());

    Ok(Json(result?))
}
