//! Plan availability decoration

use serde::{Deserialize, Serialize};

/// Why a plan is (or is not) available to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    /// Plan can be requested
    Available,
    /// Plan is already active; requesting it renews it
    Renewal,
    /// Member-tier plan without an active membership fee
    RequiresMembershipFee,
    /// Non-member plan while a membership fee is active
    HasMembershipFee,
    /// Monthly plan while the combination package is active
    HasCombinationPackage,
    /// Another monthly plan is still running
    ActiveMonthlyPlan,
    /// Combination package requested by a user with active subscriptions
    HasExistingPlans,
    /// Day pass requested while one is already active
    ActiveDayPass,
}

impl AvailabilityReason {
    /// Machine-readable code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Renewal => "renewal",
            Self::RequiresMembershipFee => "requires_membership_fee",
            Self::HasMembershipFee => "has_membership_fee",
            Self::HasCombinationPackage => "has_combination_package",
            Self::ActiveMonthlyPlan => "active_monthly_plan",
            Self::HasExistingPlans => "has_existing_plans",
            Self::ActiveDayPass => "active_day_pass",
        }
    }

    /// Whether a plan with this reason may be requested
    pub const fn allows_request(&self) -> bool {
        matches!(self, Self::Available | Self::Renewal)
    }
}

impl std::fmt::Display for AvailabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the plan compatibility check
///
/// `available` is always `reason.allows_request()`; construct through
/// [`Availability::new`] to keep the two in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Whether the plan may be requested
    pub available: bool,
    /// Machine-readable reason
    pub reason: AvailabilityReason,
    /// Message suitable for direct display
    pub message: String,
}

impl Availability {
    /// Create an availability result for a reason
    pub fn new(reason: AvailabilityReason, message: impl Into<String>) -> Self {
        Self {
            available: reason.allows_request(),
            reason,
            message: message.into(),
        }
    }

    /// Display icon matching `available`
    pub const fn icon(&self) -> &'static str {
        if self.available {
            "✅"
        } else {
            "🔒"
        }
    }

    /// Inverse of `available`
    pub const fn is_locked(&self) -> bool {
        !self.available
    }
}
