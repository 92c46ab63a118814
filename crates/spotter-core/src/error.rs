//! Subscription engine errors

use spotter_db::DbError;
use spotter_types::{AvailabilityReason, SubscriptionStatus};
use thiserror::Error;

/// Subscription engine errors
///
/// Everything except [`SubscriptionError::Database`] and
/// [`SubscriptionError::Internal`] is a user-facing validation error.
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// User account is not allowed to subscribe
    #[error("user account is {status} and cannot request subscriptions")]
    UserInactive {
        /// Stored account status or `not_a_customer`
        status: String,
    },

    /// Plan not found
    #[error("plan not found")]
    PlanNotFound,

    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// User has no pending request
    #[error("no pending subscription request found")]
    PendingRequestNotFound,

    /// User already has a pending request
    #[error("You already have a pending request for '{plan_name}'. Please wait for approval or cancel it first.")]
    AlreadyPending {
        /// Name of the plan of the pending request
        plan_name: String,
    },

    /// Plan compatibility rules reject the request
    #[error("{message}")]
    PlanIncompatible {
        /// Resolver reason
        reason: AvailabilityReason,
        /// Display message from the resolver
        message: String,
    },

    /// Renewal or advance payment without the subscription it builds on
    #[error("{0}")]
    PrerequisiteMissing(String),

    /// Subscription is not in the status the operation requires
    #[error("subscription is {current}, expected {expected}")]
    StateConflict {
        /// Stored status
        current: SubscriptionStatus,
        /// Status the operation requires
        expected: SubscriptionStatus,
    },

    /// Malformed request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SubscriptionError {
    /// Machine-readable reason code
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserInactive { .. } => "USER_INACTIVE",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::PendingRequestNotFound => "PENDING_REQUEST_NOT_FOUND",
            Self::AlreadyPending { .. } => "ALREADY_PENDING",
            Self::PlanIncompatible { .. } => "PLAN_INCOMPATIBLE",
            Self::PrerequisiteMissing(_) => "PREREQUISITE_MISSING",
            Self::StateConflict { .. } => "STATE_CONFLICT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound
                | Self::PlanNotFound
                | Self::SubscriptionNotFound
                | Self::PendingRequestNotFound
        )
    }

    /// Check if this is a user-facing validation error
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}
