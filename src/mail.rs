//! Outbound email for the contact form, over an SMTP relay.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail relay is not configured")]
    NotConfigured,

    #[error("invalid mailbox '{0}'")]
    InvalidMailbox(String),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[cfg(test)]
    #[error("relay rejected the message")]
    Rejected,
}

/// A plain-text message ready to relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipient: String,
}

impl SmtpConfig {
    /// `None` unless `SMTP_USERNAME` and `SMTP_PASSWORD` are both set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty())?;
        let password = std::env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty())?;
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let from = std::env::var("MAIL_FROM").unwrap_or_else(|_| username.clone());
        let recipient = std::env::var("CONTACT_RECIPIENT").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from,
            recipient,
        })
    }
}

#[derive(Clone)]
pub struct SmtpRelay {
    from: Mailbox,
    to: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let from = Mailbox::from_str(&config.from)
            .map_err(|_| MailError::InvalidMailbox(config.from.clone()))?;
        let to = Mailbox::from_str(&config.recipient)
            .map_err(|_| MailError::InvalidMailbox(config.recipient.clone()))?;

        let credentials = Credentials::new(config.username, config.password);
        // 465 is implicit TLS, everything else upgrades with STARTTLS
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let mailer = builder.port(config.port).credentials(credentials).build();

        Ok(Self { from, to, mailer })
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.clone());
        if let Some(reply_to) = email.reply_to.as_deref() {
            if let Ok(mailbox) = Mailbox::from_str(reply_to) {
                builder = builder.reply_to(mailbox);
            }
        }
        let message = builder.body(email.body.clone())?;
        self.mailer.send(message).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpRelay),
    /// No relay configured: every send fails.
    Disabled,
    #[cfg(test)]
    Outbox(test_support::Outbox),
}

impl Mailer {
    pub fn from_env() -> Self {
        match SmtpConfig::from_env() {
            Some(config) => match SmtpRelay::new(config) {
                Ok(relay) => {
                    tracing::info!("contact mail relay enabled");
                    Mailer::Smtp(relay)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "contact mail relay misconfigured, disabling");
                    Mailer::Disabled
                }
            },
            None => {
                tracing::warn!("SMTP_USERNAME/SMTP_PASSWORD not set, contact mail disabled");
                Mailer::Disabled
            }
        }
    }

    pub async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        match self {
            Mailer::Smtp(relay) => relay.send(email).await,
            Mailer::Disabled => Err(MailError::NotConfigured),
            #[cfg(test)]
            Mailer::Outbox(outbox) => outbox.push(email).await,
        }
    }
}
