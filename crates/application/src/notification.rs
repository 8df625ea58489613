//! Notification queue ports.
//!
//! Mutating services enqueue notification records in the same transaction
//! as their writes; delivery happens asynchronously in the worker binary,
//! which claims pending rows and hands them to a [`NotificationSender`].

use std::str::FromStr;

use async_trait::async_trait;
use uuid::Uuid;

use rotaplan_core::{AppError, AppResult, OrgId};

/// Delivery template of a queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTemplate {
    /// Invitation email carrying the redemption token.
    Invite,
    /// A leave request was submitted; addressed to the org's managers.
    LeaveRequestSubmitted,
    /// A leave request was decided; addressed to the requesting employee.
    LeaveDecision,
}

impl NotificationTemplate {
    /// Returns the storage string for this template.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::LeaveRequestSubmitted => "leave_request_submitted",
            Self::LeaveDecision => "leave_decision",
        }
    }
}

impl FromStr for NotificationTemplate {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "invite" => Ok(Self::Invite),
            "leave_request_submitted" => Ok(Self::LeaveRequestSubmitted),
            "leave_decision" => Ok(Self::LeaveDecision),
            _ => Err(AppError::Validation(format!(
                "unknown notification template '{value}'"
            ))),
        }
    }
}

/// A notification record queued by a mutating service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Organization scope.
    pub org_id: OrgId,
    /// Recipient address. Empty when the worker resolves recipients
    /// itself (manager broadcasts).
    pub to: String,
    /// Delivery template.
    pub template: NotificationTemplate,
    /// Template payload.
    pub payload: serde_json::Value,
}

/// A pending notification claimed for delivery.
#[derive(Debug, Clone)]
pub struct QueuedNotification {
    /// Unique row identifier.
    pub id: Uuid,
    /// Organization scope.
    pub org_id: OrgId,
    /// Recipient address, possibly empty.
    pub to: String,
    /// Delivery template.
    pub template: NotificationTemplate,
    /// Template payload.
    pub payload: serde_json::Value,
}

/// Repository port for the notification queue, used by the delivery worker.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Claims up to `limit` pending notifications for exclusive delivery.
    ///
    /// A claim holds for `lease_seconds`; rows whose worker died before
    /// marking them sent or failed become claimable again once the lease
    /// expires.
    async fn claim_pending(
        &self,
        limit: usize,
        lease_seconds: u64,
    ) -> AppResult<Vec<QueuedNotification>>;

    /// Marks a claimed notification as delivered.
    async fn mark_sent(&self, notification_id: Uuid) -> AppResult<()>;

    /// Marks a claimed notification as failed, with a reason for operators.
    async fn mark_failed(&self, notification_id: Uuid, reason: &str) -> AppResult<()>;
}

/// Outbound delivery port implemented by infrastructure senders.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Delivers a single claimed notification.
    async fn deliver(&self, notification: &QueuedNotification) -> AppResult<()>;
}
