//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_sender;
mod http_identity_verifier;
mod notification_rendering;
mod postgres_audit_log_repository;
mod postgres_invite_repository;
mod postgres_leave_repository;
mod postgres_notification_repository;
mod postgres_org_repository;
mod postgres_schedule_repository;
mod smtp_notification_sender;
mod static_identity_verifier;

pub use console_notification_sender::ConsoleNotificationSender;
pub use http_identity_verifier::HttpIdentityVerifier;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_invite_repository::PostgresInviteRepository;
pub use postgres_leave_repository::PostgresLeaveRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_org_repository::PostgresOrgRepository;
pub use postgres_schedule_repository::PostgresScheduleRepository;
pub use smtp_notification_sender::{SmtpNotificationSender, SmtpSenderConfig};
pub use static_identity_verifier::StaticIdentityVerifier;
