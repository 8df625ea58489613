//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod employee;
mod invite;
mod leave;
mod membership;
mod org;
mod schedule;
mod staff_role;
mod template;

pub use employee::{ContractType, Employee, EmployeeId, Unavailability};
pub use invite::{INVITE_TTL_DAYS, Invite, InviteId, InviteStatus, normalize_email};
pub use leave::{
    AccrualFrequency, LeaveDecision, LeavePolicy, LeaveRequest, LeaveRequestId, LeaveStatus,
    LeaveType, validate_leave_range,
};
pub use membership::{MemberRole, Membership, MembershipStatus};
pub use org::{
    Industry, ORG_NAME_MAX_LENGTH, OpenDay, OrgSettings, Organization, TimeSegment,
    default_open_days, default_segments, default_staff_roles, slugify, validate_org_name,
    validate_time_of_day,
};
pub use schedule::{
    Assignment, MAX_SCHEDULE_SPAN_DAYS, Schedule, ScheduleDay, ScheduleDayId, ScheduleId,
    ScheduleSegment, ScheduleStatus, expand_schedule_days, validate_schedule_range, weekday_index,
};
pub use staff_role::{RoleId, StaffRole, StaffRoleSpec, resolve_role_positions};
pub use template::{
    NeedSlot, NeedSlotSpec, Season, ShiftTemplate, TemplateId, TemplateMatrix, TemplateMatrixSpec,
    TemplateSpec, resolve_template_matrix,
};
