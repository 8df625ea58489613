//! Leave requests: submission by linked employees, decisions by managers,
//! cancellation by the submitter.
//!
//! Every transition runs as one atomic write carrying the status change,
//! the audit entry, and the queued notification. Only `pending` requests
//! transition; terminal states reject further changes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    EmployeeId, LeaveDecision, LeaveRequest, LeaveRequestId, LeaveStatus, LeaveType,
    validate_leave_range,
};

use crate::access::{require_manager_or_owner, require_member};
use crate::audit::AuditEntry;
use crate::notification::{NewNotification, NotificationTemplate};
use crate::org_service::OrgRepository;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for leave requests.
#[async_trait]
pub trait LeaveRepository: Send + Sync {
    /// Persists a new leave request with its audit entry and queued
    /// notification, atomically.
    async fn create_request(
        &self,
        request: LeaveRequest,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()>;

    /// Finds a leave request within an organization.
    async fn find_request(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
    ) -> AppResult<Option<LeaveRequest>>;

    /// Transitions a request to a new status with its audit entry and an
    /// optional queued notification, atomically.
    ///
    /// The update is conditional on the stored status still being
    /// `pending`; a concurrent transition fails with `FailedPrecondition`.
    async fn transition(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
        status: LeaveStatus,
        audit: AuditEntry,
        notification: Option<NewNotification>,
    ) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Parameters for submitting a leave request.
#[derive(Debug, Clone)]
pub struct SubmitLeaveInput {
    /// Employee the leave is for.
    pub employee_id: EmployeeId,
    /// Leave category.
    pub leave_type: LeaveType,
    /// First day of leave, inclusive.
    pub start_date: NaiveDate,
    /// Last day of leave, inclusive.
    pub end_date: NaiveDate,
    /// Segment names when the leave covers only part of each day.
    pub segments: Vec<String>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Attachment references.
    pub attachments: Vec<String>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for the leave request lifecycle.
#[derive(Clone)]
pub struct LeaveService {
    leave_repository: Arc<dyn LeaveRepository>,
    org_repository: Arc<dyn OrgRepository>,
}

impl LeaveService {
    /// Creates a new leave service.
    #[must_use]
    pub fn new(
        leave_repository: Arc<dyn LeaveRepository>,
        org_repository: Arc<dyn OrgRepository>,
    ) -> Self {
        Self {
            leave_repository,
            org_repository,
        }
    }

    /// Submits a leave request for an employee profile.
    ///
    /// The acting user must be an org member and must be the user account
    /// linked to the employee profile; managers submit on behalf of nobody.
    pub async fn submit_leave(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        input: SubmitLeaveInput,
    ) -> AppResult<LeaveRequestId> {
        require_member(self.org_repository.as_ref(), actor, org_id).await?;
        validate_leave_range(input.start_date, input.end_date)?;

        let employee = self
            .org_repository
            .find_employee(org_id, input.employee_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("employee '{}' not found", input.employee_id))
            })?;

        if employee.linked_user_id.as_deref() != Some(actor.subject()) {
            return Err(AppError::Forbidden(
                "you can only submit leave for your own employee profile".to_owned(),
            ));
        }

        let request = LeaveRequest {
            id: LeaveRequestId::new(),
            org_id,
            employee_id: employee.id,
            created_by_user_id: actor.subject().to_owned(),
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            segments: input.segments,
            reason: input.reason,
            attachments: input.attachments,
            status: LeaveStatus::Pending,
        };

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "leave.submit".to_owned(),
            entity_ref: format!("leave_requests/{}", request.id),
            metadata: serde_json::json!({
                "employee_id": employee.id.to_string(),
                "leave_type": input.leave_type.as_str(),
                "start_date": input.start_date.to_string(),
                "end_date": input.end_date.to_string(),
            }),
        };

        // Manager broadcast: the worker resolves recipients at delivery.
        let notification = NewNotification {
            org_id,
            to: String::new(),
            template: NotificationTemplate::LeaveRequestSubmitted,
            payload: serde_json::json!({
                "request_id": request.id.to_string(),
                "employee_name": employee.full_name(),
                "leave_type": input.leave_type.as_str(),
                "start_date": input.start_date.to_string(),
                "end_date": input.end_date.to_string(),
            }),
        };

        let request_id = request.id;
        self.leave_repository
            .create_request(request, audit, notification)
            .await?;

        Ok(request_id)
    }

    /// Decides a pending leave request. Requires a manager or owner
    /// membership.
    pub async fn decide_leave(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        request_id: LeaveRequestId,
        decision: LeaveDecision,
        comment: Option<String>,
    ) -> AppResult<LeaveStatus> {
        require_manager_or_owner(self.org_repository.as_ref(), actor, org_id).await?;

        let request = self.find_pending(org_id, request_id).await?;
        let status = decision.as_status();

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "leave.decide".to_owned(),
            entity_ref: format!("leave_requests/{request_id}"),
            metadata: serde_json::json!({
                "decision": decision.as_str(),
                "comment": comment.as_deref(),
            }),
        };

        // Notify the employee only when a user account is linked.
        let employee = self
            .org_repository
            .find_employee(org_id, request.employee_id)
            .await?;
        let notification = employee.and_then(|employee| {
            employee.linked_user_id.clone().map(|user_id| NewNotification {
                org_id,
                to: user_id,
                template: NotificationTemplate::LeaveDecision,
                payload: serde_json::json!({
                    "request_id": request_id.to_string(),
                    "decision": decision.as_str(),
                    "comment": comment.as_deref(),
                    "start_date": request.start_date.to_string(),
                    "end_date": request.end_date.to_string(),
                }),
            })
        });

        self.leave_repository
            .transition(org_id, request_id, status, audit, notification)
            .await?;

        Ok(status)
    }

    /// Cancels a pending leave request. Only the submitting user may
    /// cancel.
    pub async fn cancel_leave(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        request_id: LeaveRequestId,
    ) -> AppResult<()> {
        require_member(self.org_repository.as_ref(), actor, org_id).await?;

        let request = self.find_pending(org_id, request_id).await?;
        if request.created_by_user_id != actor.subject() {
            return Err(AppError::Forbidden(
                "only the submitter can cancel a leave request".to_owned(),
            ));
        }

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "leave.cancel".to_owned(),
            entity_ref: format!("leave_requests/{request_id}"),
            metadata: serde_json::json!({}),
        };

        self.leave_repository
            .transition(org_id, request_id, LeaveStatus::Canceled, audit, None)
            .await
    }

    async fn find_pending(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
    ) -> AppResult<LeaveRequest> {
        let request = self
            .leave_repository
            .find_request(org_id, request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("leave request '{request_id}' not found"))
            })?;

        if request.status.is_terminal() {
            return Err(AppError::FailedPrecondition(format!(
                "leave request is already {}",
                request.status.as_str()
            )));
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests;
