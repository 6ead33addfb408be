use async_trait::async_trait;
use std::sync::Arc;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Outbound email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them. Used when no SMTP server is configured.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        to.parse::<Mailbox>()?;
        info!(to, subject, body, "Mail delivery disabled, logging message");
        Ok(())
    }
}

/// STARTTLS relay with credential login.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.email_address.clone(),
                config.email_password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.email_address.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.transport.send(message).await?;
        info!("Mail '{}' sent to {}", subject, to);
        Ok(())
    }
}

/// SMTP when a server is configured, the log otherwise.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.smtp_server.as_deref() {
        Some(host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}
