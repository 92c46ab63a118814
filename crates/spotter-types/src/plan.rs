//! Plan catalog types

use serde::{Deserialize, Serialize};

/// Catalog plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub i32);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PlanId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Length of one billing period of a plan
///
/// Day-based plans are always evaluated in days, everything else in whole
/// calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "count", rename_all = "snake_case")]
pub enum PlanDuration {
    /// Whole calendar months
    Months(u32),
    /// Whole days
    Days(u32),
}

impl PlanDuration {
    /// Repeat this duration `periods` times
    pub const fn times(self, periods: u32) -> Self {
        match self {
            Self::Months(m) => Self::Months(m.saturating_mul(periods)),
            Self::Days(d) => Self::Days(d.saturating_mul(periods)),
        }
    }
}

/// A subscription plan from the catalog
///
/// Immutable at runtime; created by administrative tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Display name
    pub name: String,
    /// Price of one period in cents
    pub price_cents: i64,
    /// Duration in months (ignored when `duration_days` is positive)
    pub duration_months: i32,
    /// Duration in days
    pub duration_days: i32,
    /// Whether the plan is restricted to members
    pub is_member_only: bool,
    /// Whether the plan is the combination package
    pub is_combination: bool,
}

impl Plan {
    /// Duration of one period of this plan
    pub fn duration(&self) -> PlanDuration {
        if self.duration_days > 0 {
            PlanDuration::Days(self.duration_days.unsigned_abs())
        } else {
            PlanDuration::Months(self.duration_months.max(0).unsigned_abs())
        }
    }

    /// Total price for a number of periods
    pub fn total_price_cents(&self, periods: u32) -> i64 {
        self.price_cents.saturating_mul(i64::from(periods))
    }
}

/// Functional category of a plan, independent of its catalog id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRole {
    /// Yearly membership fee that unlocks member pricing
    MembershipFee,
    /// Monthly access at member pricing
    MemberMonthly,
    /// Monthly access without membership
    NonMemberMonthly,
    /// Membership fee plus one month of access, sold as one product
    CombinationPackage,
    /// Single-day access
    DayPass,
    /// Anything else in the catalog
    Other,
}

impl PlanRole {
    /// Monthly-tier plans; only one may be active at a time
    pub const fn is_monthly_tier(&self) -> bool {
        matches!(self, Self::MemberMonthly | Self::NonMemberMonthly)
    }

    /// Whether an active subscription of this role grants premium features
    pub const fn grants_premium(&self) -> bool {
        matches!(self, Self::MembershipFee)
    }

    /// Priority when picking a user's current subscription (lower wins)
    pub const fn display_priority(&self) -> u8 {
        match self {
            Self::DayPass => 0,
            Self::MemberMonthly | Self::NonMemberMonthly => 1,
            Self::MembershipFee => 2,
            Self::CombinationPackage | Self::Other => 3,
        }
    }
}

impl std::fmt::Display for PlanRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MembershipFee => "membership_fee",
            Self::MemberMonthly => "member_monthly",
            Self::NonMemberMonthly => "non_member_monthly",
            Self::CombinationPackage => "combination_package",
            Self::DayPass => "day_pass",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}
