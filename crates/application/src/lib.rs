//! Application services and ports.
//!
//! Services hold `Arc<dyn Repository>` ports and enforce authorization,
//! validation, and workflow rules; persistence adapters implement the ports
//! and make each mutating method atomic, audit entry included.

#![forbid(unsafe_code)]

mod access;
pub mod audit;
pub mod identity;
pub mod invite_service;
pub mod leave_service;
pub mod notification;
pub mod org_service;
pub mod schedule_service;

pub use audit::{AuditEntry, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditLogService};
pub use identity::IdentityVerifier;
pub use invite_service::{
    InviteRepository, InviteService, InviteUserInput, IssuedInvite, RedeemedInvite,
};
pub use leave_service::{LeaveRepository, LeaveService, SubmitLeaveInput};
pub use notification::{
    NewNotification, NotificationQueue, NotificationSender, NotificationTemplate,
    QueuedNotification,
};
pub use org_service::{
    CreateOrgInput, CreatedOrg, EmployeeInput, OpenDayInput, OrgBundle, OrgRepository, OrgService,
    TimeSegmentInput,
};
pub use schedule_service::{
    AssignShiftInput, CreateScheduleInput, CreatedSchedule, ScheduleBundle, ScheduleRepository,
    ScheduleService,
};
