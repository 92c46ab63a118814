//! Configuration for the Subscription API service.

use spotter_core::{EngineConfig, PlanRoles, SmtpConfig};
use spotter_types::PlanId;
use std::time::Duration;

/// Subscription API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Engine configuration
    pub engine: EngineConfig,
    /// SMTP relay (log-only delivery when absent)
    pub smtp: Option<SmtpConfig>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Period of the stale-request reaper (`None` disables it)
    pub reaper_interval: Option<Duration>,
    /// Period of the expiry notifier (`None` disables it)
    pub notifier_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Database
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // Server
        let http_port = parse_or(&var, "HTTP_PORT", 8082)?;
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let metrics_enabled = var("METRICS_ENABLED")
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        // Scheduler
        let reaper_interval = interval(parse_or(&var, "REAPER_INTERVAL_SECS", 900)?);
        let notifier_interval = interval(parse_or(&var, "NOTIFIER_INTERVAL_SECS", 86_400)?);

        // Plan-role table
        let roles = PlanRoles {
            membership_fee: PlanId(parse_or(&var, "PLAN_ID_MEMBERSHIP_FEE", 1)?),
            member_monthly: PlanId(parse_or(&var, "PLAN_ID_MEMBER_MONTHLY", 2)?),
            non_member_monthly: PlanId(parse_or(&var, "PLAN_ID_NON_MEMBER_MONTHLY", 3)?),
            combination_package: PlanId(parse_or(&var, "PLAN_ID_COMBINATION_PACKAGE", 5)?),
            day_pass: PlanId(parse_or(&var, "PLAN_ID_DAY_PASS", 6)?),
        };

        let ttl_hours: u64 = parse_or(&var, "PENDING_REQUEST_TTL_HOURS", 24)?;
        if ttl_hours == 0 {
            return Err(ConfigError::Invalid("PENDING_REQUEST_TTL_HOURS"));
        }
        let utc_offset_hours: i32 = parse_or(&var, "BUSINESS_UTC_OFFSET_HOURS", 8)?;
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(ConfigError::Invalid("BUSINESS_UTC_OFFSET_HOURS"));
        }

        let mut engine = EngineConfig::new(roles)
            .with_pending_ttl(Duration::from_secs(ttl_hours * 3600))
            .with_utc_offset_hours(utc_offset_hours);
        if let Some(days) = var("EXPIRY_ALERT_DAYS").filter(|v| !v.trim().is_empty()) {
            engine = engine.with_alert_days(parse_alert_days(&days)?);
        }
        if let Some(from) = var("MAIL_FROM") {
            engine = engine.with_mail_from(from);
        }
        if let Some(admin) = var("ADMIN_REPORT_EMAIL").filter(|v| !v.is_empty()) {
            engine = engine.with_admin_report_email(admin);
        }

        // SMTP
        let smtp = match var("SMTP_HOST").filter(|v| !v.is_empty()) {
            Some(host) => {
                let mut smtp = SmtpConfig::new(host).port(parse_or(&var, "SMTP_PORT", 587)?);
                if let (Some(user), Some(pass)) = (var("SMTP_USERNAME"), var("SMTP_PASSWORD")) {
                    smtp = smtp.credentials(user, pass);
                }
                Some(smtp)
            }
            None => None,
        };

        Ok(Self {
            http_port,
            database_url,
            engine,
            smtp,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            reaper_interval,
            notifier_interval,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Comma-separated positive day counts, e.g. `14,7,3,1`
fn parse_alert_days(value: &str) -> Result<Vec<u32>, ConfigError> {
    value
        .split(',')
        .map(|day| match day.trim().parse::<u32>() {
            Ok(day) if day > 0 => Ok(day),
            _ => Err(ConfigError::Invalid("EXPIRY_ALERT_DAYS")),
        })
        .collect()
}

fn interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
