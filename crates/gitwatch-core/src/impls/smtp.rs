//! SmtpMailer - lettre の非同期 SMTP transport による Mailer 実装
//!
//! - `secure = true`: 暗黙 TLS（通常 465 番）
//! - `secure = false`: STARTTLS（通常 587 番）
//!
//! From は認証ユーザ、To は設定された宛先全員。1 Run につき 1 通だけ送ります。

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

use crate::config::EmailConfig;
use crate::domain::{ConfigError, GitwatchError};
use crate::ports::Mailer;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let from = parse_mailbox("AUTH_USER", &config.user)?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| parse_mailbox("RECIPIENTS", r))
            .collect::<Result<Vec<_>, _>>()?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| ConfigError::Invalid {
            key: "EMAIL_HOST".into(),
            reason: e.to_string(),
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from,
            recipients,
        })
    }
}

fn parse_mailbox(key: &str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.trim()
        .parse::<Mailbox>()
        .map_err(|e| ConfigError::Invalid {
            key: key.into(),
            reason: format!("{raw:?} is not a mail address: {e}"),
        })
}

/// Digest メールを組み立てる（宛先は全員 To）
fn build_message(
    from: &Mailbox,
    recipients: &[Mailbox],
    subject: &str,
    html: &str,
) -> Result<Message, GitwatchError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(subject)
        .header(ContentType::TEXT_HTML);
    for recipient in recipients {
        builder = builder.to(recipient.clone());
    }
    builder
        .body(html.to_string())
        .map_err(|e| GitwatchError::Delivery(format!("failed to build message: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_digest(&self, subject: &str, html: &str) -> Result<(), GitwatchError> {
        let message = build_message(&self.from, &self.recipients, subject, html)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| GitwatchError::Delivery(e.to_string()))?;
        info!(recipients = self.recipients.len(), "email notification sent");
        Ok(())
    }
}
