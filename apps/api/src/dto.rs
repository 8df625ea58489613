//! Request and response payloads for the HTTP API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rotaplan_application::{
    AssignShiftInput, AuditLogEntry, CreateOrgInput, CreateScheduleInput, EmployeeInput,
    InviteUserInput, OpenDayInput, SubmitLeaveInput, TimeSegmentInput,
};
use rotaplan_domain::{
    ContractType, EmployeeId, Industry, LeaveDecision, LeaveType, MemberRole, RoleId, Season,
    StaffRoleSpec, TemplateId, TemplateMatrixSpec, TemplateSpec,
};

// ---------------------------------------------------------------------------
// Organization creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TimeSegmentRequest {
    pub name: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenDayRequest {
    pub day: u8,
    pub is_open: bool,
    #[serde(default)]
    pub segments: Vec<TimeSegmentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StaffRoleRequest {
    pub name: String,
    pub color: String,
    pub level: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub contract_type: ContractType,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub season: Option<Season>,
    #[serde(default)]
    pub matrix: TemplateMatrixSpec,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrgRequest {
    pub name: String,
    pub slug: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub industry: Option<Industry>,
    pub open_days: Option<Vec<OpenDayRequest>>,
    pub roles: Option<Vec<StaffRoleRequest>>,
    pub employees: Option<Vec<EmployeeRequest>>,
    pub templates: Option<Vec<TemplateRequest>>,
}

impl From<CreateOrgRequest> for CreateOrgInput {
    fn from(request: CreateOrgRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            timezone: request.timezone,
            locale: request.locale,
            industry: request.industry,
            open_days: request.open_days.map(|days| {
                days.into_iter()
                    .map(|day| OpenDayInput {
                        day: day.day,
                        is_open: day.is_open,
                        segments: day
                            .segments
                            .into_iter()
                            .map(|segment| TimeSegmentInput {
                                name: segment.name,
                                start: segment.start,
                                end: segment.end,
                            })
                            .collect(),
                    })
                    .collect()
            }),
            roles: request.roles.map(|roles| {
                roles
                    .into_iter()
                    .map(|role| StaffRoleSpec::new(role.name, role.color, role.level))
                    .collect()
            }),
            employees: request.employees.map(|employees| {
                employees
                    .into_iter()
                    .map(|employee| EmployeeInput {
                        first_name: employee.first_name,
                        last_name: employee.last_name,
                        roles: employee.roles,
                        contract_type: employee.contract_type,
                    })
                    .collect()
            }),
            templates: request.templates.map(|templates| {
                templates
                    .into_iter()
                    .map(|template| TemplateSpec {
                        name: template.name,
                        season: template.season,
                        matrix: template.matrix,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateOrgResponse {
    pub success: bool,
    pub org_id: Uuid,
    pub slug: String,
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub role: Option<MemberRole>,
    pub employee_id: Option<Uuid>,
}

impl From<InviteUserRequest> for InviteUserInput {
    fn from(request: InviteUserRequest) -> Self {
        Self {
            email: request.email,
            target_role: request.role,
            employee_id: request.employee_id.map(EmployeeId::from_uuid),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteUserResponse {
    pub success: bool,
    pub invite_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemInviteRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemInviteResponse {
    pub success: bool,
    pub org_id: Uuid,
    pub role: MemberRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Leave requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitLeaveRequest {
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub segments: Vec<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl From<SubmitLeaveRequest> for SubmitLeaveInput {
    fn from(request: SubmitLeaveRequest) -> Self {
        Self {
            employee_id: EmployeeId::from_uuid(request.employee_id),
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            segments: request.segments,
            reason: request.reason,
            attachments: request.attachments,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitLeaveResponse {
    pub success: bool,
    pub request_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DecideLeaveRequest {
    pub decision: LeaveDecision,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecideLeaveResponse {
    pub success: bool,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub template_id: Option<Uuid>,
}

impl From<CreateScheduleRequest> for CreateScheduleInput {
    fn from(request: CreateScheduleRequest) -> Self {
        Self {
            start_date: request.start_date,
            end_date: request.end_date,
            template_id: request.template_id.map(TemplateId::from_uuid),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateScheduleResponse {
    pub success: bool,
    pub schedule_id: Uuid,
    pub days_created: usize,
}

#[derive(Debug, Deserialize)]
pub struct AssignShiftRequest {
    pub segment_name: String,
    pub employee_id: Uuid,
    pub role_id: Uuid,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl From<AssignShiftRequest> for AssignShiftInput {
    fn from(request: AssignShiftRequest) -> Self {
        Self {
            segment_name: request.segment_name,
            employee_id: EmployeeId::from_uuid(request.employee_id),
            role: RoleId::from_uuid(request.role_id),
            start: request.start,
            end: request.end,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub action: Option<String>,
    pub actor: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub entry_id: String,
    pub actor_user_id: String,
    pub action: String,
    pub entity_ref: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            actor_user_id: entry.actor_user_id,
            action: entry.action,
            entity_ref: entry.entity_ref,
            metadata: entry.metadata,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub success: bool,
    pub entries: Vec<AuditLogEntryResponse>,
}
