use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::MailConfig;
use crate::types::NotificationError;

/// Trait for email delivery implementations
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Delivers one HTML email to `recipient`.
    async fn send_email(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError>;
}

/// SMTP relay transport
pub struct SmtpEmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailTransport {
    /// Builds an SMTP transport from the mail configuration. Port 465 uses
    /// implicit TLS, any other port uses STARTTLS.
    pub fn new(config: &MailConfig) -> Result<Self, NotificationError> {
        let from = parse_mailbox(&config.from_email)?;

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
        }
        .map_err(|e| NotificationError::Transport(format!("Invalid SMTP relay: {}", e)))?
        .port(config.smtp_port);

        let builder = if config.smtp_username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
        };

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send_email(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| NotificationError::Transport(format!("Failed to build message: {}", e)))?;

        let response = self
            .mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        log::debug!("SMTP response code: {}", response.code());
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| NotificationError::InvalidEmail(address.to_string()))
}

/// Development transport that logs messages instead of delivering them
pub struct LogEmailTransport;

#[async_trait]
impl EmailTransport for LogEmailTransport {
    async fn send_email(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError> {
        log::info!("📧 [LOG EMAIL] To: {}", recipient);
        log::info!("📧 [LOG EMAIL] Subject: {}", subject);
        log::debug!("📧 [LOG EMAIL] Body:\n{}", body);
        Ok(())
    }
}
