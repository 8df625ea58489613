//! Console notification sender for development. Logs deliveries to tracing
//! output instead of sending anything.

use async_trait::async_trait;
use tracing::info;

use rotaplan_application::{NotificationSender, QueuedNotification};
use rotaplan_core::AppResult;

use crate::notification_rendering::render;

/// Development sender that logs notifications to the console.
#[derive(Clone)]
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    /// Creates a new console sender.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSender for ConsoleNotificationSender {
    async fn deliver(&self, notification: &QueuedNotification) -> AppResult<()> {
        let (subject, body) = render(notification);

        info!(
            notification_id = %notification.id,
            to = notification.to,
            template = notification.template.as_str(),
            "--- NOTIFICATION (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            notification.to,
            subject,
            body
        );

        Ok(())
    }
}
