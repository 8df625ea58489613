#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    ContractType, Employee, EmployeeId, LeaveDecision, LeaveRequest, LeaveRequestId, LeaveStatus,
    LeaveType, MemberRole, Membership, MembershipStatus, Organization, ShiftTemplate, TemplateId,
};

use super::{LeaveRepository, LeaveService, SubmitLeaveInput};
use crate::audit::AuditEntry;
use crate::notification::{NewNotification, NotificationTemplate};
use crate::org_service::{OrgBundle, OrgRepository};

#[derive(Default)]
struct FakeState {
    memberships: Vec<Membership>,
    employees: Vec<Employee>,
    requests: Vec<LeaveRequest>,
    audits: Vec<AuditEntry>,
    notifications: Vec<NewNotification>,
}

#[derive(Default)]
struct FakeStore {
    state: Mutex<FakeState>,
}

#[async_trait]
impl OrgRepository for FakeStore {
    async fn slug_in_use(&self, _slug: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn create_org(&self, _bundle: OrgBundle) -> AppResult<()> {
        Ok(())
    }

    async fn find_org(&self, _org_id: OrgId) -> AppResult<Option<Organization>> {
        Ok(None)
    }

    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|membership| membership.org_id == org_id && membership.user_id == subject)
            .cloned())
    }

    async fn find_employee(
        &self,
        org_id: OrgId,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>> {
        let state = self.state.lock().await;
        Ok(state
            .employees
            .iter()
            .find(|employee| employee.org_id == org_id && employee.id == employee_id)
            .cloned())
    }

    async fn find_template(
        &self,
        _org_id: OrgId,
        _template_id: TemplateId,
    ) -> AppResult<Option<ShiftTemplate>> {
        Ok(None)
    }
}

#[async_trait]
impl LeaveRepository for FakeStore {
    async fn create_request(
        &self,
        request: LeaveRequest,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.requests.push(request);
        state.audits.push(audit);
        state.notifications.push(notification);
        Ok(())
    }

    async fn find_request(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
    ) -> AppResult<Option<LeaveRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .find(|request| request.org_id == org_id && request.id == request_id)
            .cloned())
    }

    async fn transition(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
        status: LeaveStatus,
        audit: AuditEntry,
        notification: Option<NewNotification>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .iter_mut()
            .find(|request| request.org_id == org_id && request.id == request_id)
            .ok_or_else(|| AppError::NotFound("leave request not found".to_owned()))?;

        if request.status != LeaveStatus::Pending {
            return Err(AppError::FailedPrecondition(
                "leave request is no longer pending".to_owned(),
            ));
        }

        request.status = status;
        state.audits.push(audit);
        if let Some(notification) = notification {
            state.notifications.push(notification);
        }
        Ok(())
    }
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn service() -> (LeaveService, Arc<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    (LeaveService::new(store.clone(), store.clone()), store)
}

struct Org {
    org_id: OrgId,
    employee_id: EmployeeId,
}

async fn seed(store: &FakeStore, link_employee: bool) -> Org {
    let org_id = OrgId::new();
    let employee_id = EmployeeId::new();
    let mut state = store.state.lock().await;

    state.memberships.push(Membership {
        user_id: "user-manager".to_owned(),
        org_id,
        role: MemberRole::Manager,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    });
    state.memberships.push(Membership {
        user_id: "user-staff".to_owned(),
        org_id,
        role: MemberRole::Employee,
        status: MembershipStatus::Active,
        linked_employee_id: Some(employee_id),
    });
    state.employees.push(Employee {
        id: employee_id,
        org_id,
        first_name: "Alice".to_owned(),
        last_name: "Martin".to_owned(),
        roles: Vec::new(),
        contract_type: ContractType::Cdi,
        unavailabilities: Vec::new(),
        linked_user_id: link_employee.then(|| "user-staff".to_owned()),
    });

    Org {
        org_id,
        employee_id,
    }
}

fn staff() -> ActorIdentity {
    ActorIdentity::new("user-staff", Some("staff@example.com".to_owned()))
}

fn manager() -> ActorIdentity {
    ActorIdentity::new("user-manager", Some("manager@example.com".to_owned()))
}

fn submit_input(employee_id: EmployeeId) -> SubmitLeaveInput {
    SubmitLeaveInput {
        employee_id,
        leave_type: LeaveType::Paid,
        start_date: date("2024-07-01"),
        end_date: date("2024-07-05"),
        segments: Vec::new(),
        reason: Some("summer holiday".to_owned()),
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn submits_leave_and_notifies_managers() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    let state = store.state.lock().await;
    let request = &state.requests[0];
    assert_eq!(request.id, request_id);
    assert_eq!(request.status, LeaveStatus::Pending);
    assert_eq!(request.created_by_user_id, "user-staff");

    assert_eq!(state.audits[0].action, "leave.submit");

    let notification = &state.notifications[0];
    assert_eq!(notification.template, NotificationTemplate::LeaveRequestSubmitted);
    assert!(notification.to.is_empty());
    assert_eq!(
        notification.payload["employee_name"].as_str(),
        Some("Alice Martin")
    );
}

#[tokio::test]
async fn cannot_submit_for_an_unlinked_profile() {
    let (service, store) = service();
    let org = seed(&store, false).await;

    let error = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn cannot_submit_for_someone_elses_profile() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let error = service
        .submit_leave(&manager(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn rejects_reversed_date_range() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let mut input = submit_input(org.employee_id);
    input.start_date = date("2024-07-10");
    input.end_date = date("2024-07-05");

    let error = service
        .submit_leave(&staff(), org.org_id, input)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Validation(_)));
}

#[tokio::test]
async fn manager_approves_pending_request_and_employee_is_notified() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    let status = service
        .decide_leave(
            &manager(),
            org.org_id,
            request_id,
            LeaveDecision::Approved,
            Some("enjoy".to_owned()),
        )
        .await
        .unwrap();
    assert_eq!(status, LeaveStatus::Approved);

    let state = store.state.lock().await;
    assert_eq!(state.requests[0].status, LeaveStatus::Approved);
    assert_eq!(state.audits[1].action, "leave.decide");

    let decision_note = &state.notifications[1];
    assert_eq!(decision_note.template, NotificationTemplate::LeaveDecision);
    assert_eq!(decision_note.to, "user-staff");
    assert_eq!(decision_note.payload["decision"].as_str(), Some("approved"));
}

#[tokio::test]
async fn employees_cannot_decide() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    let error = service
        .decide_leave(&staff(), org.org_id, request_id, LeaveDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn decided_request_cannot_be_decided_again() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();
    service
        .decide_leave(&manager(), org.org_id, request_id, LeaveDecision::Rejected, None)
        .await
        .unwrap();

    let error = service
        .decide_leave(&manager(), org.org_id, request_id, LeaveDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::FailedPrecondition(_)));

    let state = store.state.lock().await;
    assert_eq!(state.requests[0].status, LeaveStatus::Rejected);
}

#[tokio::test]
async fn submitter_cancels_pending_request() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    service
        .cancel_leave(&staff(), org.org_id, request_id)
        .await
        .unwrap();

    let state = store.state.lock().await;
    assert_eq!(state.requests[0].status, LeaveStatus::Canceled);
    assert_eq!(state.audits[1].action, "leave.cancel");
}

#[tokio::test]
async fn only_the_submitter_can_cancel() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    let error = service
        .cancel_leave(&manager(), org.org_id, request_id)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn deciding_unknown_request_is_not_found() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let error = service
        .decide_leave(
            &manager(),
            org.org_id,
            LeaveRequestId::new(),
            LeaveDecision::Approved,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

#[tokio::test]
async fn decision_without_linked_user_queues_no_notification() {
    let (service, store) = service();
    let org = seed(&store, true).await;

    let request_id = service
        .submit_leave(&staff(), org.org_id, submit_input(org.employee_id))
        .await
        .unwrap();

    // Unlink the profile after submission.
    {
        let mut state = store.state.lock().await;
        state.employees[0].linked_user_id = None;
    }

    service
        .decide_leave(&manager(), org.org_id, request_id, LeaveDecision::Approved, None)
        .await
        .unwrap();

    let state = store.state.lock().await;
    // Only the manager broadcast from submission.
    assert_eq!(state.notifications.len(), 1);
}
