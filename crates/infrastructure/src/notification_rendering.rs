//! Plain-text rendering of queued notifications.

use rotaplan_application::{NotificationTemplate, QueuedNotification};

/// Renders a notification into a subject and text body.
#[must_use]
pub(crate) fn render(notification: &QueuedNotification) -> (String, String) {
    let payload = &notification.payload;

    match notification.template {
        NotificationTemplate::Invite => {
            let token = payload["token"].as_str().unwrap_or_default();
            let expires_at = payload["expires_at"].as_str().unwrap_or_default();
            (
                "You have been invited".to_owned(),
                format!(
                    "You have been invited to join an organization.\n\n\
                     Redeem your invitation with this token: {token}\n\
                     The invitation expires on {expires_at}."
                ),
            )
        }
        NotificationTemplate::LeaveRequestSubmitted => {
            let employee = payload["employee_name"].as_str().unwrap_or("An employee");
            let start = payload["start_date"].as_str().unwrap_or_default();
            let end = payload["end_date"].as_str().unwrap_or_default();
            (
                format!("Leave request from {employee}"),
                format!("{employee} requested leave from {start} to {end}."),
            )
        }
        NotificationTemplate::LeaveDecision => {
            let decision = payload["decision"].as_str().unwrap_or_default();
            let start = payload["start_date"].as_str().unwrap_or_default();
            let end = payload["end_date"].as_str().unwrap_or_default();
            let comment = payload["comment"].as_str();

            let mut body =
                format!("Your leave request ({start} to {end}) was {decision}.");
            if let Some(comment) = comment {
                body.push_str("\n\nComment: ");
                body.push_str(comment);
            }

            (format!("Your leave request was {decision}"), body)
        }
    }
}
