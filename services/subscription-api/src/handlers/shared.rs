//! Shared handler utilities
//!
//! Common validation, metrics, and helper functions used across handlers.

use std::time::Instant;

use spotter_types::{SubscriptionId, UserId};

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for staff actor names stored on decisions
pub const MAX_ACTOR_LEN: usize = 64;

/// Maximum length for free-text fields such as decline reasons
pub const MAX_STRING_LEN: usize = 256;

/// Parse a user id path segment
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid user_id".into()))
}

/// Parse a subscription id path segment
pub fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, ApiError> {
    SubscriptionId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid subscription id".into()))
}

/// Validate the name of the staff member recording a decision.
///
/// Allows alphanumerics plus `_ - . @ :` (covers emails and `system:` actors).
pub fn validate_actor(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Actor name cannot be empty".into()));
    }

    if name.len() > MAX_ACTOR_LEN {
        return Err(ApiError::BadRequest(format!(
            "Actor name too long (max {MAX_ACTOR_LEN} chars)"
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | ':'))
    {
        return Err(ApiError::BadRequest(
            "Actor name contains invalid characters (use alphanumeric, _, -, ., @, :)".into(),
        ));
    }

    Ok(())
}

/// Validate a user-provided string is within safe bounds.
pub fn validate_string_length(value: &str, field_name: &str) -> Result<(), ApiError> {
    if value.len() > MAX_STRING_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_STRING_LEN} chars)"
        )));
    }
    Ok(())
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "subscription_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================
