//! Manual triggers for the background jobs

use axum::extract::State;
use axum::Json;
use spotter_core::{NotifyOutcome, ReapOutcome};
use std::time::Instant;

use super::shared::record_op_duration;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/v1/jobs/reap-stale-requests
pub async fn reap_stale_requests(State(state): State<AppState>) -> ApiResult<Json<ReapOutcome>> {
    let start = Instant::now();

    let result = state.reaper.reap().await;
    record_op_duration("reap_stale_requests", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/jobs/expiry-notifications
pub async fn expiry_notifications(
    State(state): State<AppState>,
) -> ApiResult<Json<NotifyOutcome>> {
    let start = Instant::now();

    let result = state.notifier.check_and_notify().await;
    record_op_duration("expiry_notifications", start, result.is_ok());

    Ok(Json(result?))
}
