//! Plan-role table
//!
//! Business rules are keyed by [`PlanRole`], never by literal catalog ids.
//! The table maps each role to the catalog row that plays it.

use spotter_types::{PlanId, PlanRole};

/// Catalog ids of the plans that carry a business role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRoles {
    /// Yearly membership fee
    pub membership_fee: PlanId,
    /// Monthly plan at member pricing
    pub member_monthly: PlanId,
    /// Monthly plan without membership
    pub non_member_monthly: PlanId,
    /// Membership fee + one month bundle
    pub combination_package: PlanId,
    /// Single-day access
    pub day_pass: PlanId,
}

impl Default for PlanRoles {
    fn default() -> Self {
        Self {
            membership_fee: PlanId(1),
            member_monthly: PlanId(2),
            non_member_monthly: PlanId(3),
            combination_package: PlanId(5),
            day_pass: PlanId(6),
        }
    }
}

impl PlanRoles {
    /// Role played by a catalog plan
    pub fn role_of(&self, plan_id: PlanId) -> PlanRole {
        if plan_id == self.membership_fee {
            PlanRole::MembershipFee
        } else if plan_id == self.member_monthly {
            PlanRole::MemberMonthly
        } else if plan_id == self.non_member_monthly {
            PlanRole::NonMemberMonthly
        } else if plan_id == self.combination_package {
            PlanRole::CombinationPackage
        } else if plan_id == self.day_pass {
            PlanRole::DayPass
        } else {
            PlanRole::Other
        }
    }

    /// Catalog id playing a role, if any
    pub fn plan_for(&self, role: PlanRole) -> Option<PlanId> {
        match role {
            PlanRole::MembershipFee => Some(self.membership_fee),
            PlanRole::MemberMonthly => Some(self.member_monthly),
            PlanRole::NonMemberMonthly => Some(self.non_member_monthly),
            PlanRole::CombinationPackage => Some(self.combination_package),
            PlanRole::DayPass => Some(self.day_pass),
            PlanRole::Other => None,
        }
    }
}
