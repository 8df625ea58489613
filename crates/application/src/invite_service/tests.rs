#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    ContractType, Employee, EmployeeId, Invite, InviteId, InviteStatus, MemberRole, Membership,
    MembershipStatus, Organization, ShiftTemplate, TemplateId,
};

use super::{InviteRepository, InviteService, InviteUserInput, hash_token};
use crate::audit::AuditEntry;
use crate::notification::NewNotification;
use crate::org_service::{OrgBundle, OrgRepository};

#[derive(Default)]
struct FakeState {
    invites: Vec<Invite>,
    memberships: Vec<Membership>,
    employees: Vec<Employee>,
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
impl InviteRepository for FakeStore {
    async fn create_invite(
        &self,
        invite: Invite,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.invites.push(invite);
        state.audits.push(audit);
        state.notifications.push(notification);
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invite>> {
        let state = self.state.lock().await;
        Ok(state
            .invites
            .iter()
            .find(|invite| invite.token_hash == token_hash)
            .cloned())
    }

    async fn mark_expired(&self, invite_id: InviteId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(invite) = state.invites.iter_mut().find(|invite| invite.id == invite_id) {
            invite.status = InviteStatus::Expired;
        }
        Ok(())
    }

    async fn redeem(
        &self,
        invite_id: InviteId,
        membership: Membership,
        audit: AuditEntry,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.memberships.iter().any(|existing| {
            existing.org_id == membership.org_id && existing.user_id == membership.user_id
        }) {
            return Err(AppError::Conflict(
                "user is already a member of this organization".to_owned(),
            ));
        }

        if let Some(invite) = state.invites.iter_mut().find(|invite| invite.id == invite_id) {
            invite.status = InviteStatus::Used;
        }
        state.memberships.push(membership);
        state.audits.push(audit);
        Ok(())
    }
}

fn service() -> (InviteService, Arc<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    (InviteService::new(store.clone(), store.clone()), store)
}

fn manager() -> ActorIdentity {
    ActorIdentity::new("user-manager", Some("manager@example.com".to_owned()))
}

fn manager_membership(org_id: OrgId) -> Membership {
    Membership {
        user_id: "user-manager".to_owned(),
        org_id,
        role: MemberRole::Manager,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    }
}

fn input(email: &str) -> InviteUserInput {
    InviteUserInput {
        email: email.to_owned(),
        target_role: None,
        employee_id: None,
    }
}

#[tokio::test]
async fn issues_invite_with_hashed_token_and_queued_email() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let issued = service
        .invite_user(&manager(), org_id, input(" Staff@Example.COM "))
        .await
        .unwrap();

    let state = store.state.lock().await;
    let invite = &state.invites[0];

    assert_eq!(invite.email, "staff@example.com");
    assert_eq!(invite.target_role, MemberRole::Employee);
    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(invite.token_hash, hash_token(&issued.token));
    assert_ne!(invite.token_hash, issued.token);

    assert_eq!(state.audits[0].action, "invite.create");
    assert_eq!(state.notifications[0].to, "staff@example.com");
    assert_eq!(
        state.notifications[0].payload["token"].as_str(),
        Some(issued.token.as_str())
    );
}

#[tokio::test]
async fn employees_cannot_issue_invites() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store.state.lock().await.memberships.push(Membership {
        user_id: "user-manager".to_owned(),
        org_id,
        role: MemberRole::Employee,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    });

    let error = service
        .invite_user(&manager(), org_id, input("staff@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn invite_referencing_unknown_employee_is_rejected() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let mut invite_input = input("staff@example.com");
    invite_input.employee_id = Some(EmployeeId::new());

    let error = service
        .invite_user(&manager(), org_id, invite_input)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

#[tokio::test]
async fn redeems_invite_into_membership() {
    let (service, store) = service();
    let org_id = OrgId::new();
    let employee_id = EmployeeId::new();
    {
        let mut state = store.state.lock().await;
        state.memberships.push(manager_membership(org_id));
        state.employees.push(Employee {
            id: employee_id,
            org_id,
            first_name: "Alice".to_owned(),
            last_name: "Martin".to_owned(),
            roles: Vec::new(),
            contract_type: ContractType::Cdi,
            unavailabilities: Vec::new(),
            linked_user_id: None,
        });
    }

    let mut invite_input = input("staff@example.com");
    invite_input.employee_id = Some(employee_id);
    let issued = service
        .invite_user(&manager(), org_id, invite_input)
        .await
        .unwrap();

    let staff = ActorIdentity::new("user-staff", Some("staff@example.com".to_owned()));
    let redeemed = service.redeem_invite(&staff, &issued.token).await.unwrap();

    assert_eq!(redeemed.org_id, org_id);
    assert_eq!(redeemed.role, MemberRole::Employee);
    assert_eq!(redeemed.employee_id, Some(employee_id));

    let state = store.state.lock().await;
    assert_eq!(state.invites[0].status, InviteStatus::Used);
    let membership = state
        .memberships
        .iter()
        .find(|membership| membership.user_id == "user-staff")
        .unwrap();
    assert_eq!(membership.linked_employee_id, Some(employee_id));
}

#[tokio::test]
async fn redeeming_with_mismatched_email_is_forbidden() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let issued = service
        .invite_user(&manager(), org_id, input("staff@example.com"))
        .await
        .unwrap();

    let impostor = ActorIdentity::new("user-other", Some("other@example.com".to_owned()));
    let error = service
        .redeem_invite(&impostor, &issued.token)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));

    let state = store.state.lock().await;
    assert_eq!(state.invites[0].status, InviteStatus::Pending);
}

#[tokio::test]
async fn identity_without_email_redeems_on_token_alone() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let issued = service
        .invite_user(&manager(), org_id, input("staff@example.com"))
        .await
        .unwrap();

    let phone_only = ActorIdentity::new("user-staff", None);
    let redeemed = service
        .redeem_invite(&phone_only, &issued.token)
        .await
        .unwrap();
    assert_eq!(redeemed.org_id, org_id);

    let state = store.state.lock().await;
    assert_eq!(state.invites[0].status, InviteStatus::Used);
    assert!(
        state
            .memberships
            .iter()
            .any(|membership| membership.user_id == "user-staff")
    );
}

#[tokio::test]
async fn expired_invite_is_lazily_marked_and_rejected() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let issued = service
        .invite_user(&manager(), org_id, input("staff@example.com"))
        .await
        .unwrap();
    {
        let mut state = store.state.lock().await;
        state.invites[0].expires_at = Utc::now() - Duration::hours(1);
    }

    let staff = ActorIdentity::new("user-staff", Some("staff@example.com".to_owned()));
    let error = service.redeem_invite(&staff, &issued.token).await.unwrap_err();
    assert!(matches!(error, AppError::FailedPrecondition(_)));

    let state = store.state.lock().await;
    assert_eq!(state.invites[0].status, InviteStatus::Expired);
}

#[tokio::test]
async fn used_invite_cannot_be_redeemed_twice() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let issued = service
        .invite_user(&manager(), org_id, input("staff@example.com"))
        .await
        .unwrap();

    let staff = ActorIdentity::new("user-staff", Some("staff@example.com".to_owned()));
    service.redeem_invite(&staff, &issued.token).await.unwrap();

    let again = ActorIdentity::new("user-staff-2", Some("staff@example.com".to_owned()));
    let error = service.redeem_invite(&again, &issued.token).await.unwrap_err();
    assert!(matches!(error, AppError::FailedPrecondition(_)));
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let (service, _) = service();
    let staff = ActorIdentity::new("user-staff", Some("staff@example.com".to_owned()));
    let error = service.redeem_invite(&staff, "bogus").await.unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

#[tokio::test]
async fn distinct_invites_get_distinct_tokens() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store
        .state
        .lock()
        .await
        .memberships
        .push(manager_membership(org_id));

    let first = service
        .invite_user(&manager(), org_id, input("a@example.com"))
        .await
        .unwrap();
    let second = service
        .invite_user(&manager(), org_id, input("b@example.com"))
        .await
        .unwrap();

    assert_ne!(first.token, second.token);
    assert_eq!(first.token.len(), 64);
}
