//! Outbound mail
//!
//! The notifier only needs "send this message to this address, tell me if it
//! worked". [`SmtpMailer`] delivers over SMTP with lettre; [`LogMailer`] writes
//! messages to the log when no SMTP relay is configured.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

/// Mail delivery errors
#[derive(Error, Debug)]
pub enum MailError {
    /// Address could not be parsed
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// Offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// Message could not be assembled
    #[error("failed to build message: {0}")]
    Build(String),

    /// Transport rejected or failed to deliver the message
    #[error("failed to send message: {0}")]
    Transport(String),
}

/// A plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
}

impl Email {
    /// Create a new message
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
        }
    }
}

/// Mail delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port (default: 587 for STARTTLS)
    pub port: u16,
    /// Username for authentication
    pub username: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Create a new SMTP configuration with the server hostname
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: None,
            password: None,
        }
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// SMTP mailer using lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Create a new SMTP mailer with STARTTLS
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    fn build_message(email: &Email) -> Result<Message, MailError> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|e| MailError::InvalidAddress {
                    address: address.to_string(),
                    reason: e.to_string(),
                })
        };

        Message::builder()
            .from(parse(&email.from)?)
            .to(parse(&email.to)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.text.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = Self::build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

// AsyncSmtpTransport does not implement Debug
impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}

/// Mailer that only logs what it would have sent
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body_len = email.text.len(),
            "Mail delivery disabled, message logged only"
        );
        Ok(())
    }
}
