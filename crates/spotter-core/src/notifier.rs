//! Expiry notifier
//!
//! Sends one reminder per approved subscription whose days remaining is
//! exactly one of the configured alert days. A failed send is recorded and
//! the batch continues.

use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;
use serde::Serialize;
use spotter_db::{ExpiringSubscriptionRow, SubscriptionRepository};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::EngineConfig,
    mailer::{Email, Mailer},
    SubscriptionError,
};

/// Urgency tier selected by the exact number of days remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderTier {
    /// 14 days left
    TwoWeeks,
    /// 7 days left
    OneWeek,
    /// 3 days left
    ThreeDays,
    /// 1 day left
    OneDay,
    /// Any other configured alert day
    General,
}

impl ReminderTier {
    /// Tier for a days-remaining value
    pub const fn for_days(days: i32) -> Self {
        match days {
            14 => Self::TwoWeeks,
            7 => Self::OneWeek,
            3 => Self::ThreeDays,
            1 => Self::OneDay,
            _ => Self::General,
        }
    }

    /// Machine-readable label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "two_weeks",
            Self::OneWeek => "one_week",
            Self::ThreeDays => "three_days",
            Self::OneDay => "one_day",
            Self::General => "general",
        }
    }

    /// Subject line
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "Your Membership Expires in 2 Weeks",
            Self::OneWeek => "Your Membership Expires in 1 Week",
            Self::ThreeDays => "Your Membership Expires in 3 Days",
            Self::OneDay => "Your Membership Expires Tomorrow!",
            Self::General => "Membership Expiry Reminder",
        }
    }

    /// Urgency label shown at the top of the message
    pub const fn urgency(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "Gentle Reminder",
            Self::OneWeek => "Important Notice",
            Self::ThreeDays => "Urgent Reminder",
            Self::OneDay => "Final Notice",
            Self::General => "Reminder",
        }
    }

    /// Call to action
    pub const fn call_to_action(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "Plan Your Renewal",
            Self::OneWeek => "Renew This Week",
            Self::ThreeDays => "Renew Now - Time is Running Out!",
            Self::OneDay => "URGENT: Renew Today to Avoid Service Interruption!",
            Self::General => "Renew Your Membership",
        }
    }
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// Plain-text reminder for one expiring subscription
pub fn render_reminder(row: &ExpiringSubscriptionRow, from: &str) -> Email {
    let tier = ReminderTier::for_days(row.days_remaining);
    let day_word = if row.days_remaining == 1 { "Day" } else { "Days" };
    let text = format!(
        "Hello {name}!\n\n\
         {urgency} - your membership is expiring soon.\n\n\
         Plan: {plan}\n\
         Price: {price}\n\
         Expiry date: {expiry}\n\
         Days remaining: {days} {day_word}\n\n\
         {cta}\n\n\
         If you have already renewed, please ignore this message.\n",
        name = row.full_name,
        urgency = tier.urgency(),
        plan = row.plan_name,
        price = format_cents(row.price_cents),
        expiry = row.end_date.format("%B %-d, %Y"),
        days = row.days_remaining,
        cta = tier.call_to_action(),
    );
    Email::new(from, row.email.clone(), tier.subject(), text)
}

/// Delivery status of one reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Sent
    Sent,
    /// Send failed
    Failed,
}

/// Per-row record of a notifier run
#[derive(Debug, Clone, Serialize)]
pub struct NotificationDetail {
    /// Subscription reminded about
    pub subscription_id: Uuid,
    /// Recipient
    pub email: String,
    /// Plan name
    pub plan_name: String,
    /// Last day of service
    pub end_date: NaiveDate,
    /// Days remaining
    pub days_remaining: i32,
    /// Reminder tier
    pub tier: ReminderTier,
    /// Outcome
    pub status: DeliveryStatus,
    /// Send error, if any
    pub error: Option<String>,
}

/// Result of one notifier run
#[derive(Debug, Clone, Serialize)]
pub struct NotifyOutcome {
    /// Business date the run was evaluated on
    pub date: NaiveDate,
    /// Subscriptions matching an alert day
    pub checked: usize,
    /// Reminders sent
    pub sent: usize,
    /// Reminders that failed
    pub failed: usize,
    /// Per-row outcomes
    pub details: Vec<NotificationDetail>,
}

/// Expiry notifier
pub struct ExpiryNotifier<S: SubscriptionRepository, M: Mailer + ?Sized> {
    subscriptions: Arc<S>,
    mailer: Arc<M>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl<S: SubscriptionRepository, M: Mailer + ?Sized> ExpiryNotifier<S, M> {
    /// Create a new notifier
    pub fn new(
        config: EngineConfig,
        subscriptions: Arc<S>,
        mailer: Arc<M>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscriptions,
            mailer,
            config,
            clock,
        }
    }

    /// Send reminders for subscriptions on an alert day
    #[instrument(skip(self))]
    pub async fn check_and_notify(&self) -> Result<NotifyOutcome, SubscriptionError> {
        let today = self.clock.today(self.config.utc_offset_hours);
        let days: Vec<i32> = self
            .config
            .alert_days
            .iter()
            .filter_map(|d| i32::try_from(*d).ok())
            .collect();

        let rows = self.subscriptions.find_expiring(today, &days).await?;
        let mut outcome = NotifyOutcome {
            date: today,
            checked: rows.len(),
            sent: 0,
            failed: 0,
            details: Vec::with_capacity(rows.len()),
        };

        for row in &rows {
            let email = render_reminder(row, &self.config.mail_from);
            let tier = ReminderTier::for_days(row.days_remaining);
            let (status, error) = match self.mailer.send(&email).await {
                Ok(()) => {
                    outcome.sent += 1;
                    (DeliveryStatus::Sent, None)
                }
                Err(e) => {
                    warn!(
                        subscription_id = %row.subscription_id,
                        email = %row.email,
                        error = %e,
                        "Expiry reminder failed"
                    );
                    outcome.failed += 1;
                    (DeliveryStatus::Failed, Some(e.to_string()))
                }
            };
            let label = match status {
                DeliveryStatus::Sent => "sent",
                DeliveryStatus::Failed => "failed",
            };
            counter!("expiry_notifications_total", "status" => label).increment(1);

            outcome.details.push(NotificationDetail {
                subscription_id: row.subscription_id,
                email: row.email.clone(),
                plan_name: row.plan_name.clone(),
                end_date: row.end_date,
                days_remaining: row.days_remaining,
                tier,
                status,
                error,
            });
        }

        info!(
            checked = outcome.checked,
            sent = outcome.sent,
            failed = outcome.failed,
            "Expiry notification run complete"
        );

        if outcome.checked > 0 {
            self.send_admin_summary(&outcome).await;
        }

        Ok(outcome)
    }

    async fn send_admin_summary(&self, outcome: &NotifyOutcome) {
        let Some(admin) = &self.config.admin_report_email else {
            return;
        };

        let mut text = format!(
            "Subscription expiry report for {}\n\nChecked: {}\nSent: {}\nFailed: {}\n\n",
            outcome.date, outcome.checked, outcome.sent, outcome.failed
        );
        for d in &outcome.details {
            text.push_str(&format!(
                "{} | {} | {} | {} days | {}{}\n",
                d.email,
                d.plan_name,
                d.end_date,
                d.days_remaining,
                d.tier.as_str(),
                d.error
                    .as_deref()
                    .map(|e| format!(" | failed: {e}"))
                    .unwrap_or_default()
            ));
        }

        let email = Email::new(
            self.config.mail_from.clone(),
            admin.clone(),
            format!("Daily Subscription Expiry Report - {}", outcome.date),
            text,
        );
        if let Err(e) = self.mailer.send(&email).await {
            warn!(error = %e, "Admin expiry summary could not be sent");
        }
    }
}
