//! SMTP notification sender using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use rotaplan_application::{NotificationSender, QueuedNotification};
use rotaplan_core::{AppError, AppResult};

use crate::notification_rendering::render;

/// SMTP sender configuration.
#[derive(Clone)]
pub struct SmtpSenderConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production sender delivering notifications over SMTP.
#[derive(Clone)]
pub struct SmtpNotificationSender {
    config: SmtpSenderConfig,
}

impl SmtpNotificationSender {
    /// Creates a new SMTP sender.
    #[must_use]
    pub fn new(config: SmtpSenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn deliver(&self, notification: &QueuedNotification) -> AppResult<()> {
        let (subject, body) = render(notification);

        // Broadcast rows carry no address; they surface in-app, not by mail.
        if notification.to.is_empty() || !notification.to.contains('@') {
            info!(
                notification_id = %notification.id,
                template = notification.template.as_str(),
                "notification has no mailable recipient, skipping SMTP delivery"
            );
            return Ok(());
        }

        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to_mailbox = notification
            .to
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;

        Ok(())
    }
}
