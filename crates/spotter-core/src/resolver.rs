//! Plan compatibility resolver
//!
//! A pure function of a user's active portfolio and a candidate plan. Both the
//! decorated plan listing and the request pipeline call [`resolve`], so the two
//! can never disagree.

use chrono::NaiveDate;
use spotter_types::{Availability, AvailabilityReason, PlanId, PlanRole};

use crate::roles::PlanRoles;

/// One active subscription as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePlan {
    /// Subscribed plan
    pub plan_id: PlanId,
    /// Plan display name
    pub plan_name: String,
    /// Last day of service
    pub end_date: NaiveDate,
}

/// Approved subscriptions of a user that have not passed their end date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    active: Vec<ActivePlan>,
}

impl Portfolio {
    /// Build a portfolio from active subscriptions
    pub fn new(active: Vec<ActivePlan>) -> Self {
        Self { active }
    }

    /// Active subscriptions
    pub fn active(&self) -> &[ActivePlan] {
        &self.active
    }

    /// Whether the user holds nothing active
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether a plan is currently active
    pub fn contains(&self, plan_id: PlanId) -> bool {
        self.active.iter().any(|a| a.plan_id == plan_id)
    }

    /// Whether any active plan plays `role`
    pub fn has_role(&self, roles: &PlanRoles, role: PlanRole) -> bool {
        self.active.iter().any(|a| roles.role_of(a.plan_id) == role)
    }

    /// Latest-ending active plan matching a role predicate
    pub fn latest_matching(
        &self,
        roles: &PlanRoles,
        pred: impl Fn(PlanRole) -> bool,
    ) -> Option<&ActivePlan> {
        self.active
            .iter()
            .filter(|a| pred(roles.role_of(a.plan_id)))
            .max_by_key(|a| (a.end_date, a.plan_id))
    }

    /// Whether any monthly-tier plan is active
    pub fn has_monthly_plan(&self, roles: &PlanRoles) -> bool {
        self.latest_matching(roles, |r| r.is_monthly_tier()).is_some()
    }
}

/// Display form of an end date used in resolver messages
fn display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

fn blocked_by_monthly(active: &ActivePlan, action: &str) -> Availability {
    Availability::new(
        AvailabilityReason::ActiveMonthlyPlan,
        format!(
            "You currently have an active {} until {}. Please wait for it to expire before {}.",
            active.plan_name,
            display_date(active.end_date),
            action
        ),
    )
}

/// Decide whether `plan_id` may be requested by a user holding `portfolio`
pub fn resolve(plan_id: PlanId, portfolio: &Portfolio, roles: &PlanRoles) -> Availability {
    let already_active = portfolio.contains(plan_id);

    match roles.role_of(plan_id) {
        PlanRole::MembershipFee => {
            if already_active {
                Availability::new(
                    AvailabilityReason::Renewal,
                    "You already have an active Membership Fee. Requesting it again renews it.",
                )
            } else {
                Availability::new(
                    AvailabilityReason::Available,
                    "One-time fee for member benefits and discounts on monthly plans.",
                )
            }
        }
        PlanRole::MemberMonthly => {
            if already_active {
                return Availability::new(
                    AvailabilityReason::Renewal,
                    "You already have an active Member Monthly Plan. Requesting it again renews it.",
                );
            }
            if !portfolio.has_role(roles, PlanRole::MembershipFee) {
                return Availability::new(
                    AvailabilityReason::RequiresMembershipFee,
                    "You need to purchase a Membership Fee first to access member benefits and discounts.",
                );
            }
            if portfolio.has_role(roles, PlanRole::CombinationPackage) {
                return Availability::new(
                    AvailabilityReason::HasCombinationPackage,
                    "Your combination package already includes monthly member access.",
                );
            }
            if let Some(active) = portfolio.latest_matching(roles, |r| r.is_monthly_tier()) {
                return blocked_by_monthly(active, "switching to the Member Monthly Plan");
            }
            Availability::new(
                AvailabilityReason::Available,
                "Monthly plan with member benefits and discounts.",
            )
        }
        PlanRole::NonMemberMonthly => {
            if already_active {
                return Availability::new(
                    AvailabilityReason::Renewal,
                    "You already have an active Non-Member Monthly Plan. Requesting it again renews it.",
                );
            }
            if portfolio.has_role(roles, PlanRole::MembershipFee) {
                return Availability::new(
                    AvailabilityReason::HasMembershipFee,
                    "You have a Membership Fee subscription. Consider the Member Monthly Plan for better value with member discounts.",
                );
            }
            if let Some(active) = portfolio.latest_matching(roles, |r| r.is_monthly_tier()) {
                return blocked_by_monthly(active, "switching plans");
            }
            Availability::new(
                AvailabilityReason::Available,
                "Monthly plan for gym access without member benefits.",
            )
        }
        PlanRole::CombinationPackage => {
            if portfolio.is_empty() {
                Availability::new(
                    AvailabilityReason::Available,
                    "Combination package: 1-year membership fee + 1-month member access. Perfect for new users!",
                )
            } else {
                Availability::new(
                    AvailabilityReason::HasExistingPlans,
                    "You already have active subscriptions. This combination package is only available for new users with no existing plans.",
                )
            }
        }
        PlanRole::DayPass => {
            if let Some(active) = portfolio.latest_matching(roles, |r| {
                r.is_monthly_tier() || r == PlanRole::CombinationPackage
            }) {
                return blocked_by_monthly(active, "purchasing a Day Pass");
            }
            if already_active {
                return Availability::new(
                    AvailabilityReason::ActiveDayPass,
                    "You already have an active Day Pass. Please wait for it to expire before purchasing another one.",
                );
            }
            Availability::new(
                AvailabilityReason::Available,
                "1-day gym access. Perfect for trying out the gym!",
            )
        }
        PlanRole::Other => {
            if already_active {
                Availability::new(
                    AvailabilityReason::Renewal,
                    "You already have an active subscription to this plan. Requesting it again renews it.",
                )
            } else {
                Availability::new(
                    AvailabilityReason::Available,
                    "This plan is available for subscription.",
                )
            }
        }
    }
}
