//! Subscription handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use spotter_core::{
    ApprovalOutcome, PendingRequestStatus, RequestOutcome, SubscriptionRequest, SubscriptionView,
};
use spotter_types::{PlanId, RequestMode, Subscription};
use std::time::Instant;
use tracing::instrument;

use super::shared::{
    parse_subscription_id, parse_user_id, record_op_duration, validate_actor,
    validate_string_length,
};
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub user_id: String,
    pub plan_id: i32,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default = "default_periods")]
    pub periods: u32,
}

fn default_periods() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub decided_by: String,
}

#[derive(Debug, Deserialize)]
pub struct DeclineBody {
    pub decided_by: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionView>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionResponse {
    pub subscription: Option<SubscriptionView>,
}

#[derive(Debug, Serialize)]
pub struct PremiumResponse {
    pub user_id: String,
    pub has_premium_access: bool,
}

#[derive(Debug, Serialize)]
pub struct PendingRequestResponse {
    pub has_pending_request: bool,
    pub pending_request: Option<PendingRequestStatus>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Subscription,
}

// ============================================================================
// Request Pipeline and Approval Workflow
// ============================================================================

/// POST /api/v1/subscriptions/requests
#[instrument(skip(state, body), fields(user_id = %body.user_id, plan_id = body.plan_id))]
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> ApiResult<(StatusCode, Json<RequestOutcome>)> {
    let start = Instant::now();
    let user_id = parse_user_id(&body.user_id)?;

    let result = state
        .subscriptions
        .request(SubscriptionRequest {
            user_id,
            plan_id: PlanId(body.plan_id),
            mode: body.mode,
            periods: body.periods,
        })
        .await;
    record_op_duration("create_request", start, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}

/// GET /api/v1/subscriptions/pending
pub async fn list_pending(
    State(state): State<AppState>,
) -> ApiResult<Json<SubscriptionsResponse>> {
    let start = Instant::now();

    let result = state.subscriptions.pending_subscriptions().await;
    record_op_duration("list_pending", start, result.is_ok());

    Ok(Json(SubscriptionsResponse {
        subscriptions: result?,
    }))
}

/// POST /api/v1/subscriptions/{id}/approve
#[instrument(skip(state, body))]
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<Json<ApprovalOutcome>> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;
    validate_actor(&body.decided_by)?;

    let result = state.subscriptions.approve(id, &body.decided_by).await;
    record_op_duration("approve", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/subscriptions/{id}/decline
#[instrument(skip(state, body))]
pub async fn decline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DeclineBody>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;
    validate_actor(&body.decided_by)?;
    let reason = body.reason.filter(|r| !r.trim().is_empty());
    if let Some(reason) = &reason {
        validate_string_length(reason, "reason")?;
    }

    let result = state
        .subscriptions
        .decline(id, &body.decided_by, reason)
        .await;
    record_op_duration("decline", start, result.is_ok());

    Ok(Json(SubscriptionResponse {
        subscription: result?,
    }))
}

/// POST /api/v1/subscriptions/{id}/cancel
#[instrument(skip(state, body))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;
    validate_actor(&body.decided_by)?;

    let result = state
        .subscriptions
        .cancel_subscription(id, &body.decided_by)
        .await;
    record_op_duration("cancel_subscription", start, result.is_ok());

    Ok(Json(SubscriptionResponse {
        subscription: result?,
    }))
}

// ============================================================================
// Per-user Queries
// ============================================================================

/// GET /api/v1/users/{user_id}/subscriptions
#[instrument(skip(state))]
pub async fn user_subscriptions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<SubscriptionsResponse>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.user_subscriptions(user_id).await;
    record_op_duration("user_subscriptions", start, result.is_ok());

    Ok(Json(SubscriptionsResponse {
        subscriptions: result?,
    }))
}

/// GET /api/v1/users/{user_id}/current-subscription
#[instrument(skip(state))]
pub async fn current_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CurrentSubscriptionResponse>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.current_subscription(user_id).await;
    record_op_duration("current_subscription", start, result.is_ok());

    Ok(Json(CurrentSubscriptionResponse {
        subscription: result?,
    }))
}

/// GET /api/v1/users/{user_id}/premium
#[instrument(skip(state))]
pub async fn premium_access(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PremiumResponse>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.has_premium_access(user_id).await;
    record_op_duration("premium_access", start, result.is_ok());

    Ok(Json(PremiumResponse {
        user_id: user_id.to_string(),
        has_premium_access: result?,
    }))
}

/// GET /api/v1/users/{user_id}/pending-request
#[instrument(skip(state))]
pub async fn pending_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PendingRequestResponse>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.pending_request(user_id).await;
    record_op_duration("pending_request", start, result.is_ok());

    let pending_request = result?;
    Ok(Json(PendingRequestResponse {
        has_pending_request: pending_request.is_some(),
        pending_request,
    }))
}

/// DELETE /api/v1/users/{user_id}/pending-request
#[instrument(skip(state))]
pub async fn cancel_pending_request(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let user_id = parse_user_id(&user_id)?;

    let result = state.subscriptions.cancel_pending_request(user_id).await;
    record_op_duration("cancel_pending_request", start, result.is_ok());

    Ok(Json(SubscriptionResponse {
        subscription: result?,
    }))
}
