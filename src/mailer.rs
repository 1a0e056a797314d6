//! # Email Transport
//!
//! SMTP delivery for reminder digests. Without SMTP settings the mailer stays
//! installed but every send is a no-op that reports "not sent".
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

use crate::core::config::SmtpConfig;
use crate::core::error::MailError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, warn};

/// Port that expects TLS from the first byte; every other port upgrades with STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Deliver one message.
    ///
    /// `Ok(false)` means the transport is not configured and nothing was sent.
    async fn send(&self, email: &OutgoingEmail) -> Result<bool, MailError>;
}

pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the mailer. A missing `smtp` section yields a disabled mailer;
    /// an unparseable sender address is a configuration error.
    pub fn new(smtp: Option<&SmtpConfig>, from: &str) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| anyhow!("EMAIL_FROM '{from}' is not a valid mailbox: {e}"))?;

        let transport = match smtp {
            Some(config) => Some(Self::build_transport(config)?),
            None => {
                warn!("SMTP is not configured - email reminders will be skipped.");
                None
            }
        };

        Ok(SmtpMailer { transport, from })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| anyhow!("Invalid SMTP relay '{}': {}", config.host, e))?;

        Ok(builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build())
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, MailError> {
        let to: Mailbox = email.to.parse().map_err(|e: lettre::address::AddressError| {
            MailError::Address {
                address: email.to.clone(),
                reason: e.to_string(),
            }
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<bool, MailError> {
        let Some(transport) = &self.transport else {
            debug!("SMTP disabled, not sending '{}' to {}", email.subject, email.to);
            return Ok(false);
        };

        let message = self.build_message(email)?;
        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_to(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Reminder".to_string(),
            html: "<p>hi</p>".to_string(),
        }
    }

    fn smtp_config(port: u16) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port,
            user: "mailer".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_reports_not_sent() {
        let mailer = SmtpMailer::new(None, "Taskly <no-reply@taskly.app>").unwrap();
        assert!(!mailer.is_configured());
        assert!(!mailer.send(&email_to("alice@example.com")).await.unwrap());
    }

    #[test]
    fn test_invalid_sender_is_a_config_error() {
        assert!(SmtpMailer::new(None, "not a mailbox").is_err());
    }

    #[tokio::test]
    async fn test_configured_mailer_builds_for_both_tls_modes() {
        let implicit = SmtpMailer::new(Some(&smtp_config(465)), "no-reply@taskly.app").unwrap();
        assert!(implicit.is_configured());
        let starttls = SmtpMailer::new(Some(&smtp_config(587)), "no-reply@taskly.app").unwrap();
        assert!(starttls.is_configured());
    }

    #[tokio::test]
    async fn test_malformed_recipient_is_rejected_before_sending() {
        let mailer = SmtpMailer::new(Some(&smtp_config(587)), "no-reply@taskly.app").unwrap();
        let err = mailer.send(&email_to("not-an-address")).await.unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[test]
    fn test_message_is_html() {
        let mailer = SmtpMailer::new(None, "Taskly <no-reply@taskly.app>").unwrap();
        let message = mailer.build_message(&email_to("alice@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Subject: Reminder"));
        assert!(raw.contains("To: alice@example.com"));
    }
}
