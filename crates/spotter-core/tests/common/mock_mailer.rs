//! Recording mailer for testing

use async_trait::async_trait;
use dashmap::DashSet;
use spotter_core::{Email, MailError, Mailer};
use std::sync::{Arc, Mutex};

/// Mailer that records every message and fails for chosen recipients
#[derive(Default, Clone)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    failing: Arc<DashSet<String>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `address` fail
    #[allow(dead_code)]
    pub fn fail_for(&self, address: &str) {
        self.failing.insert(address.to_string());
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if self.failing.contains(&email.to) {
            return Err(MailError::Transport("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
