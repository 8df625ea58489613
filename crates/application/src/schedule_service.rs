//! Schedule generation and shift assignment.
//!
//! Generation expands a date range against the organization's operating
//! calendar into a schedule plus its days, persisted as one atomic bundle.
//! A missing template never fails generation; days are simply produced
//! without seeded needs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    Assignment, EmployeeId, RoleId, Schedule, ScheduleDay, ScheduleDayId, ScheduleId,
    ScheduleStatus, TemplateId, expand_schedule_days, validate_schedule_range,
    validate_time_of_day,
};

use crate::access::require_manager_or_owner;
use crate::audit::AuditEntry;
use crate::org_service::OrgRepository;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// A schedule and its expanded days, persisted atomically with the audit
/// entry for the generation.
#[derive(Debug, Clone)]
pub struct ScheduleBundle {
    /// The schedule record.
    pub schedule: Schedule,
    /// One record per open day in the range.
    pub days: Vec<ScheduleDay>,
    /// Audit entry for the generation.
    pub audit: AuditEntry,
}

/// Repository port for schedules and their days.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Persists a schedule bundle atomically.
    async fn create_schedule(&self, bundle: ScheduleBundle) -> AppResult<()>;

    /// Finds a schedule within an organization.
    async fn find_schedule(
        &self,
        org_id: OrgId,
        schedule_id: ScheduleId,
    ) -> AppResult<Option<Schedule>>;

    /// Applies an assignment to one segment of a day, together with its
    /// audit entry, atomically.
    ///
    /// The read-modify-write runs under the day's row lock so concurrent
    /// assignments serialize instead of overwriting each other. Fails with
    /// `NotFound` for an unknown day or segment and `Conflict` when the
    /// employee is already assigned to the segment.
    async fn add_assignment(
        &self,
        schedule_id: ScheduleId,
        day_id: ScheduleDayId,
        segment_name: &str,
        assignment: Assignment,
        audit: AuditEntry,
    ) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Parameters for schedule generation.
#[derive(Debug, Clone)]
pub struct CreateScheduleInput {
    /// First date of the range, inclusive.
    pub start_date: NaiveDate,
    /// Last date of the range, inclusive.
    pub end_date: NaiveDate,
    /// Template to seed staffing needs from, if any.
    pub template_id: Option<TemplateId>,
}

/// Result of schedule generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSchedule {
    /// The new schedule's identifier.
    pub schedule_id: ScheduleId,
    /// How many open days the range produced.
    pub days_created: usize,
}

/// Parameters for staffing one employee into a segment.
#[derive(Debug, Clone)]
pub struct AssignShiftInput {
    /// Segment name within the day.
    pub segment_name: String,
    /// Employee to staff.
    pub employee_id: EmployeeId,
    /// Role the employee fills.
    pub role: RoleId,
    /// Optional `HH:mm` override of the segment start.
    pub start: Option<String>,
    /// Optional `HH:mm` override of the segment end.
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for schedules.
#[derive(Clone)]
pub struct ScheduleService {
    schedule_repository: Arc<dyn ScheduleRepository>,
    org_repository: Arc<dyn OrgRepository>,
}

impl ScheduleService {
    /// Creates a new schedule service.
    #[must_use]
    pub fn new(
        schedule_repository: Arc<dyn ScheduleRepository>,
        org_repository: Arc<dyn OrgRepository>,
    ) -> Self {
        Self {
            schedule_repository,
            org_repository,
        }
    }

    /// Generates a draft schedule over a date range. Requires a manager or
    /// owner membership.
    ///
    /// A `template_id` that matches nothing is not an error; the schedule
    /// is generated without seeded needs.
    pub async fn create_schedule(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        input: CreateScheduleInput,
    ) -> AppResult<CreatedSchedule> {
        require_manager_or_owner(self.org_repository.as_ref(), actor, org_id).await?;
        validate_schedule_range(input.start_date, input.end_date)?;

        let organization = self
            .org_repository
            .find_org(org_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("organization '{org_id}' not found")))?;

        let template = match input.template_id {
            Some(template_id) => {
                let found = self.org_repository.find_template(org_id, template_id).await?;
                if found.is_none() {
                    warn!(%org_id, %template_id, "template not found, generating without needs");
                }
                found
            }
            None => None,
        };

        let schedule = Schedule {
            id: ScheduleId::new(),
            org_id,
            start_date: input.start_date,
            end_date: input.end_date,
            status: ScheduleStatus::Draft,
            created_by: actor.subject().to_owned(),
        };

        let days = expand_schedule_days(
            schedule.id,
            &organization.settings,
            template.as_ref(),
            input.start_date,
            input.end_date,
        );

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "schedule.create".to_owned(),
            entity_ref: format!("schedules/{}", schedule.id),
            metadata: serde_json::json!({
                "start_date": input.start_date.to_string(),
                "end_date": input.end_date.to_string(),
                "days_created": days.len(),
                "template_id": template.as_ref().map(|template| template.id.to_string()),
            }),
        };

        let schedule_id = schedule.id;
        let days_created = days.len();
        self.schedule_repository
            .create_schedule(ScheduleBundle {
                schedule,
                days,
                audit,
            })
            .await?;

        Ok(CreatedSchedule {
            schedule_id,
            days_created,
        })
    }

    /// Staffs an employee into a segment of a schedule day. Requires a
    /// manager or owner membership.
    pub async fn assign_shift(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        schedule_id: ScheduleId,
        day_id: ScheduleDayId,
        input: AssignShiftInput,
    ) -> AppResult<()> {
        require_manager_or_owner(self.org_repository.as_ref(), actor, org_id).await?;

        if let Some(start) = input.start.as_deref() {
            validate_time_of_day(start)?;
        }
        if let Some(end) = input.end.as_deref() {
            validate_time_of_day(end)?;
        }

        self.schedule_repository
            .find_schedule(org_id, schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("schedule '{schedule_id}' not found")))?;

        self.org_repository
            .find_employee(org_id, input.employee_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("employee '{}' not found", input.employee_id))
            })?;

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "schedule.assign".to_owned(),
            entity_ref: format!("schedules/{schedule_id}/days/{day_id}"),
            metadata: serde_json::json!({
                "segment": input.segment_name,
                "employee_id": input.employee_id.to_string(),
                "role": input.role.to_string(),
            }),
        };

        self.schedule_repository
            .add_assignment(
                schedule_id,
                day_id,
                &input.segment_name,
                Assignment {
                    employee_id: input.employee_id,
                    role: input.role,
                    start: input.start,
                    end: input.end,
                },
                audit,
            )
            .await
    }
}

#[cfg(test)]
mod tests;
