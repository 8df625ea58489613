use std::sync::Arc;

use rotaplan_application::{
    AuditLogService, IdentityVerifier, InviteService, LeaveService, OrgService, ScheduleService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub org_service: OrgService,
    pub invite_service: InviteService,
    pub leave_service: LeaveService,
    pub schedule_service: ScheduleService,
    pub audit_log_service: AuditLogService,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
}
