//! Subscription types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParseError, PlanId, UserId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Stored lifecycle status
///
/// Natural expiry is never written; an approved row whose end date has
/// passed is reported as expired by [`DisplayStatus::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Requested by a member, waiting for staff
    PendingApproval,
    /// Approved by staff
    Approved,
    /// Declined by staff (terminal)
    Rejected,
    /// Cancelled by the member, the stale-request reaper or an admin (terminal)
    Cancelled,
}

impl SubscriptionStatus {
    /// Database label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is an allowed lifecycle transition
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingApproval, Self::Approved)
                | (Self::PendingApproval, Self::Rejected)
                | (Self::PendingApproval, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            // Older catalogs label staff declines "declined"
            "rejected" | "declined" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseError::new("subscription status", other)),
        }
    }
}

/// Read-time status shown to members and staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// Waiting for staff
    PendingApproval,
    /// Approved and not past its end date
    Active,
    /// Approved but past its end date
    Expired,
    /// Declined by staff
    Declined,
    /// Cancelled
    Cancelled,
}

impl DisplayStatus {
    /// Project a stored status onto what the user sees on `today`
    pub fn derive(status: SubscriptionStatus, end_date: NaiveDate, today: NaiveDate) -> Self {
        match status {
            SubscriptionStatus::PendingApproval => Self::PendingApproval,
            SubscriptionStatus::Approved if end_date >= today => Self::Active,
            SubscriptionStatus::Approved => Self::Expired,
            SubscriptionStatus::Rejected => Self::Declined,
            SubscriptionStatus::Cancelled => Self::Cancelled,
        }
    }

    /// Human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PendingApproval => "Pending Approval",
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Declined => "Declined",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// How a subscription request positions its service period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Starts today; guarded by the compatibility resolver
    New,
    /// Extends an active subscription to the same plan, back to back
    Renewal,
    /// Pre-pays any plan to start when the current access lapses
    AdvancePayment,
}

impl RequestMode {
    /// Wire label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Renewal => "renewal",
            Self::AdvancePayment => "advance_payment",
        }
    }
}

impl Default for RequestMode {
    fn default() -> Self {
        Self::New
    }
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "renewal" | "renew" => Ok(Self::Renewal),
            "advance_payment" | "advance-payment" => Ok(Self::AdvancePayment),
            other => Err(ParseError::new("request mode", other)),
        }
    }
}

/// A member subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// Owning user
    pub user_id: UserId,
    /// Subscribed plan
    pub plan_id: PlanId,
    /// Stored lifecycle status
    pub status: SubscriptionStatus,
    /// When the member submitted the request; used only for staleness
    pub requested_at: DateTime<Utc>,
    /// First day of service quoted when the request was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_start: Option<NaiveDate>,
    /// First day of service; `None` until approved
    pub service_start: Option<NaiveDate>,
    /// Last day of service
    pub end_date: NaiveDate,
    /// Number of plan periods paid for
    pub periods: u32,
    /// Amount paid in cents
    pub amount_paid_cents: i64,
    /// Discount applied (`none` when full price)
    pub discount_type: String,
    /// When the row was created
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Read-time status on `today`
    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        DisplayStatus::derive(self.status, self.end_date, today)
    }

    /// Whether the row counts toward the user's active portfolio on `today`
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == SubscriptionStatus::Approved && self.end_date >= today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_roundtrip_labels() {
        for status in [
            SubscriptionStatus::PendingApproval,
            SubscriptionStatus::Approved,
            SubscriptionStatus::Rejected,
            SubscriptionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>().unwrap(), status);
        }
        assert_eq!(
            "declined".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Rejected
        );
        assert!("expired".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_no_transition_leaves_terminal_states() {
        use SubscriptionStatus::*;
        for next in [PendingApproval, Approved, Rejected, Cancelled] {
            assert!(!Rejected.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(PendingApproval.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn test_display_status_is_derived_from_end_date() {
        let today = date(2025, 6, 1);
        assert_eq!(
            DisplayStatus::derive(SubscriptionStatus::Approved, today, today),
            DisplayStatus::Active
        );
        assert_eq!(
            DisplayStatus::derive(SubscriptionStatus::Approved, date(2025, 5, 31), today),
            DisplayStatus::Expired
        );
        assert_eq!(
            DisplayStatus::derive(SubscriptionStatus::Rejected, today, today).label(),
            "Declined"
        );
    }

    #[test]
    fn test_request_mode_serde_labels() {
        let mode: RequestMode = serde_json::from_str("\"advance_payment\"").unwrap();
        assert_eq!(mode, RequestMode::AdvancePayment);
        assert_eq!("renewal".parse::<RequestMode>().unwrap(), RequestMode::Renewal);
    }
}
