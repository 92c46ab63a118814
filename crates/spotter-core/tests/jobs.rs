//! Integration tests for the stale-request reaper and the expiry notifier

mod common;

use std::sync::Arc;

use chrono::TimeDelta;
use common::mock_repos::{DAY_PASS, MEMBER_MONTHLY, NON_MEMBER_MONTHLY};
use common::{date, harness_at, noon, MockMailer};
use spotter_core::{DeliveryStatus, ExpiryNotifier, ReminderTier, StaleRequestReaper};

#[tokio::test]
async fn test_reaper_cancels_only_requests_past_ttl() {
    let now = noon(2025, 6, 1);
    let h = harness_at(now);
    let stale_user = h.users.add_member();
    let fresh_user = h.users.add_member();
    let stale = h.subscriptions.seed_pending(
        stale_user,
        DAY_PASS,
        now - TimeDelta::hours(25),
        date(2025, 5, 31),
    );
    let fresh = h.subscriptions.seed_pending(
        fresh_user,
        DAY_PASS,
        now - TimeDelta::hours(23),
        date(2025, 6, 1),
    );

    let reaper = StaleRequestReaper::new(h.config.clone(), h.subscriptions.clone(), h.clock.clone());
    let outcome = reaper.reap().await.unwrap();

    assert_eq!(outcome.expired_count, 1);
    assert_eq!(outcome.expired[0].id.0, stale);
    assert_eq!(h.subscriptions.get(stale).unwrap().status, "cancelled");
    assert_eq!(h.subscriptions.get(fresh).unwrap().status, "pending_approval");

    // Idempotent
    assert_eq!(reaper.reap().await.unwrap().expired_count, 0);
}

#[tokio::test]
async fn test_reaped_user_can_request_again() {
    let now = noon(2025, 6, 1);
    let h = harness_at(now);
    let user = h.users.add_member();
    h.subscriptions
        .seed_pending(user, DAY_PASS, now - TimeDelta::hours(30), date(2025, 5, 31));

    let reaper = StaleRequestReaper::new(h.config.clone(), h.subscriptions.clone(), h.clock.clone());
    reaper.reap().await.unwrap();

    assert!(h
        .service
        .pending_request(spotter_types::UserId(user))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_notifier_matches_exact_alert_days() {
    let h = harness_at(noon(2025, 6, 1));
    let mailer = Arc::new(MockMailer::new());
    let week = h.users.add_member();
    let six = h.users.add_member();
    let eight = h.users.add_member();
    h.subscriptions
        .seed_approved(week, MEMBER_MONTHLY, date(2025, 5, 8), date(2025, 6, 8));
    h.subscriptions
        .seed_approved(six, MEMBER_MONTHLY, date(2025, 5, 7), date(2025, 6, 7));
    h.subscriptions
        .seed_approved(eight, MEMBER_MONTHLY, date(2025, 5, 9), date(2025, 6, 9));

    let notifier = ExpiryNotifier::new(
        h.config.clone(),
        h.subscriptions.clone(),
        mailer.clone(),
        h.clock.clone(),
    );
    let outcome = notifier.check_and_notify().await.unwrap();

    assert_eq!((outcome.checked, outcome.sent, outcome.failed), (1, 1, 0));
    assert_eq!(outcome.details[0].tier, ReminderTier::OneWeek);
    assert_eq!(outcome.details[0].days_remaining, 7);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Your Membership Expires in 1 Week");
    assert!(sent[0].to.starts_with(&format!("member-{week}")));
}

#[tokio::test]
async fn test_notifier_continues_after_send_failure() {
    let h = harness_at(noon(2025, 6, 1));
    let mailer = Arc::new(MockMailer::new());
    let failing = h.users.add_member();
    let ok = h.users.add_member();
    h.subscriptions
        .seed_approved(failing, NON_MEMBER_MONTHLY, date(2025, 5, 2), date(2025, 6, 2));
    h.subscriptions
        .seed_approved(ok, NON_MEMBER_MONTHLY, date(2025, 5, 15), date(2025, 6, 15));
    mailer.fail_for(&format!("member-{failing}@example.com"));

    let notifier = ExpiryNotifier::new(
        h.config.clone(),
        h.subscriptions.clone(),
        mailer.clone(),
        h.clock.clone(),
    );
    let outcome = notifier.check_and_notify().await.unwrap();

    assert_eq!((outcome.checked, outcome.sent, outcome.failed), (2, 1, 1));
    let failed = outcome
        .details
        .iter()
        .find(|d| d.status == DeliveryStatus::Failed)
        .unwrap();
    assert_eq!(failed.tier, ReminderTier::OneDay);
    assert!(failed.error.is_some());
    assert_eq!(mailer.sent()[0].subject, "Your Membership Expires in 2 Weeks");
}

#[tokio::test]
async fn test_notifier_sends_admin_summary() {
    let h = harness_at(noon(2025, 6, 1));
    let mailer = Arc::new(MockMailer::new());
    let user = h.users.add_member();
    h.subscriptions
        .seed_approved(user, MEMBER_MONTHLY, date(2025, 5, 4), date(2025, 6, 4));

    let config = h.config.clone().with_admin_report_email("admin@example.com");
    let notifier = ExpiryNotifier::new(config, h.subscriptions.clone(), mailer.clone(), h.clock.clone());
    notifier.check_and_notify().await.unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    let summary = sent.iter().find(|e| e.to == "admin@example.com").unwrap();
    assert_eq!(summary.subject, "Daily Subscription Expiry Report - 2025-06-01");
    assert!(summary.text.contains("Checked: 1"));
    assert!(summary.text.contains("three_days"));
}

#[tokio::test]
async fn test_notifier_skips_summary_when_nothing_matched() {
    let h = harness_at(noon(2025, 6, 1));
    let mailer = Arc::new(MockMailer::new());
    let config = h.config.clone().with_admin_report_email("admin@example.com");
    let notifier = ExpiryNotifier::new(config, h.subscriptions.clone(), mailer.clone(), h.clock.clone());

    let outcome = notifier.check_and_notify().await.unwrap();
    assert_eq!(outcome.checked, 0);
    assert!(mailer.sent().is_empty());
}
