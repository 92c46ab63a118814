//! Engine configuration

use std::time::Duration;

use crate::roles::PlanRoles;

/// Subscription engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Plan-role table
    pub roles: PlanRoles,
    /// Age after which a pending request is cancelled by the reaper
    pub pending_ttl: Duration,
    /// Fixed duration of the membership fee created by a package approval
    pub package_fee_days: u32,
    /// Fixed duration of the monthly access created by a package approval
    pub package_access_days: u32,
    /// Exact days-remaining values that trigger an expiry reminder
    pub alert_days: Vec<u32>,
    /// Hours east of UTC used to decide the business "today"
    pub utc_offset_hours: i32,
    /// Sender address for outgoing mail
    pub mail_from: String,
    /// Recipient of the notifier run summary
    pub admin_report_email: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(PlanRoles::default())
    }
}

impl EngineConfig {
    /// Create a config with the given plan-role table and stock defaults
    pub fn new(roles: PlanRoles) -> Self {
        Self {
            roles,
            pending_ttl: Duration::from_secs(24 * 60 * 60), // 24 hours
            package_fee_days: 365,
            package_access_days: 30,
            alert_days: vec![14, 7, 3, 1],
            utc_offset_hours: 8,
            mail_from: "no-reply@localhost".to_string(),
            admin_report_email: None,
        }
    }

    /// Set the pending-request time to live
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Set the fixed package component durations
    pub fn with_package_durations(mut self, fee_days: u32, access_days: u32) -> Self {
        self.package_fee_days = fee_days;
        self.package_access_days = access_days;
        self
    }

    /// Set the reminder schedule
    pub fn with_alert_days(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.alert_days = days.into_iter().collect();
        self
    }

    /// Set the business UTC offset, clamped to a real-world range
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours.clamp(-12, 14);
        self
    }

    /// Set the sender address
    pub fn with_mail_from(mut self, from: impl Into<String>) -> Self {
        self.mail_from = from.into();
        self
    }

    /// Set the admin summary recipient
    pub fn with_admin_report_email(mut self, email: impl Into<String>) -> Self {
        self.admin_report_email = Some(email.into());
        self
    }

    /// Pending TTL as a chrono delta
    pub fn pending_ttl_delta(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::from_std(self.pending_ttl).unwrap_or(chrono::TimeDelta::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pending_ttl, Duration::from_secs(86_400));
        assert_eq!(config.alert_days, vec![14, 7, 3, 1]);
        assert_eq!(
            (config.package_fee_days, config.package_access_days),
            (365, 30)
        );
        assert_eq!(config.pending_ttl_delta(), chrono::TimeDelta::hours(24));
    }

    #[test]
    fn test_offset_is_clamped() {
        assert_eq!(EngineConfig::default().with_utc_offset_hours(99).utc_offset_hours, 14);
        assert_eq!(EngineConfig::default().with_utc_offset_hours(-30).utc_offset_hours, -12);
    }
}
