#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    Assignment, ContractType, Employee, EmployeeId, Industry, MemberRole, Membership,
    MembershipStatus, NeedSlot, OrgSettings, Organization, RoleId, Schedule, ScheduleDay,
    ScheduleDayId, ScheduleId, ScheduleStatus, Season, ShiftTemplate, TemplateId, TemplateMatrix,
    default_open_days,
};

use super::{
    AssignShiftInput, CreateScheduleInput, ScheduleBundle, ScheduleRepository, ScheduleService,
};
use crate::audit::AuditEntry;
use crate::org_service::{OrgBundle, OrgRepository};

#[derive(Default)]
struct FakeState {
    organizations: Vec<Organization>,
    memberships: Vec<Membership>,
    employees: Vec<Employee>,
    templates: Vec<ShiftTemplate>,
    schedules: Vec<Schedule>,
    days: Vec<ScheduleDay>,
    audits: Vec<AuditEntry>,
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

    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<Organization>> {
        let state = self.state.lock().await;
        Ok(state
            .organizations
            .iter()
            .find(|organization| organization.id == org_id)
            .cloned())
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
        org_id: OrgId,
        template_id: TemplateId,
    ) -> AppResult<Option<ShiftTemplate>> {
        let state = self.state.lock().await;
        Ok(state
            .templates
            .iter()
            .find(|template| template.org_id == org_id && template.id == template_id)
            .cloned())
    }

}

#[async_trait]
impl ScheduleRepository for FakeStore {
    async fn create_schedule(&self, bundle: ScheduleBundle) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.schedules.push(bundle.schedule);
        state.days.extend(bundle.days);
        state.audits.push(bundle.audit);
        Ok(())
    }

    async fn find_schedule(
        &self,
        org_id: OrgId,
        schedule_id: ScheduleId,
    ) -> AppResult<Option<Schedule>> {
        let state = self.state.lock().await;
        Ok(state
            .schedules
            .iter()
            .find(|schedule| schedule.org_id == org_id && schedule.id == schedule_id)
            .cloned())
    }

    async fn add_assignment(
        &self,
        schedule_id: ScheduleId,
        day_id: ScheduleDayId,
        segment_name: &str,
        assignment: Assignment,
        audit: AuditEntry,
    ) -> AppResult<()> {
        // Read and mutate under one lock, as the adapter does under its
        // row lock.
        let mut state = self.state.lock().await;
        let day = state
            .days
            .iter_mut()
            .find(|day| day.schedule_id == schedule_id && day.id == day_id)
            .ok_or_else(|| AppError::NotFound("schedule day not found".to_owned()))?;
        day.assign(segment_name, assignment)?;
        state.audits.push(audit);
        Ok(())
    }
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn service() -> (ScheduleService, Arc<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    (ScheduleService::new(store.clone(), store.clone()), store)
}

fn manager() -> ActorIdentity {
    ActorIdentity::new("user-manager", Some("manager@example.com".to_owned()))
}

async fn seed_restaurant(store: &FakeStore) -> OrgId {
    let org_id = OrgId::new();
    let mut state = store.state.lock().await;

    state.organizations.push(Organization {
        id: org_id,
        name: "Demo Bistro".to_owned(),
        slug: "demo-bistro".to_owned(),
        timezone: "Europe/Paris".to_owned(),
        locale: "fr-FR".to_owned(),
        industry: Industry::Restaurant,
        owner_user_id: "user-manager".to_owned(),
        settings: OrgSettings {
            week_starts_on: 1,
            open_days: default_open_days(Industry::Restaurant),
            holidays_region: Some("FR".to_owned()),
        },
    });
    state.memberships.push(Membership {
        user_id: "user-manager".to_owned(),
        org_id,
        role: MemberRole::Manager,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    });

    org_id
}

fn week_input() -> CreateScheduleInput {
    CreateScheduleInput {
        start_date: date("2024-02-05"),
        end_date: date("2024-02-11"),
        template_id: None,
    }
}

#[tokio::test]
async fn generates_restaurant_week_without_sunday() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    assert_eq!(created.days_created, 6);

    let state = store.state.lock().await;
    assert_eq!(state.schedules[0].status, ScheduleStatus::Draft);
    assert_eq!(state.days.len(), 6);
    assert!(state.days.iter().all(|day| day.date != date("2024-02-11")));

    for day in &state.days {
        assert_eq!(day.segments.len(), 2);
        assert_eq!(day.segments[0].name, "Midi");
        assert_eq!(day.segments[1].name, "Soir");
        assert!(day.segments.iter().all(|s| s.assignments.is_empty()));
    }

    let audit = &state.audits[0];
    assert_eq!(audit.action, "schedule.create");
    assert_eq!(audit.metadata["days_created"].as_u64(), Some(6));
}

#[tokio::test]
async fn seeds_needs_from_template() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let role = RoleId::new();
    let template_id = TemplateId::new();
    {
        let mut segments = BTreeMap::new();
        segments.insert("Midi".to_owned(), vec![NeedSlot { role, count: 2 }]);
        let mut matrix: TemplateMatrix = BTreeMap::new();
        matrix.insert("1".to_owned(), segments);

        store.state.lock().await.templates.push(ShiftTemplate {
            id: template_id,
            org_id,
            name: "Semaine type".to_owned(),
            season: Season::Normal,
            matrix,
        });
    }

    let mut input = week_input();
    input.template_id = Some(template_id);
    service.create_schedule(&manager(), org_id, input).await.unwrap();

    let state = store.state.lock().await;
    let monday = state
        .days
        .iter()
        .find(|day| day.date == date("2024-02-05"))
        .unwrap();
    assert_eq!(
        monday.segments[0].needs.as_deref(),
        Some(&[NeedSlot { role, count: 2 }][..])
    );
    assert!(monday.segments[1].needs.is_none());
}

#[tokio::test]
async fn missing_template_falls_back_to_plain_generation() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let mut input = week_input();
    input.template_id = Some(TemplateId::new());

    let created = service
        .create_schedule(&manager(), org_id, input)
        .await
        .unwrap();
    assert_eq!(created.days_created, 6);

    let state = store.state.lock().await;
    assert!(
        state
            .days
            .iter()
            .all(|day| day.segments.iter().all(|s| s.needs.is_none()))
    );
}

#[tokio::test]
async fn rejects_span_over_28_days() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let input = CreateScheduleInput {
        start_date: date("2024-02-01"),
        end_date: date("2024-03-01"),
        template_id: None,
    };
    let error = service
        .create_schedule(&manager(), org_id, input)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Validation(_)));
}

#[tokio::test]
async fn non_managers_cannot_generate() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;
    store.state.lock().await.memberships.push(Membership {
        user_id: "user-staff".to_owned(),
        org_id,
        role: MemberRole::Employee,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    });

    let staff = ActorIdentity::new("user-staff", None);
    let error = service
        .create_schedule(&staff, org_id, week_input())
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Forbidden(_)));
}

#[tokio::test]
async fn unknown_org_is_not_found() {
    let (service, store) = service();
    let org_id = OrgId::new();
    store.state.lock().await.memberships.push(Membership {
        user_id: "user-manager".to_owned(),
        org_id,
        role: MemberRole::Owner,
        status: MembershipStatus::Active,
        linked_employee_id: None,
    });

    let error = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

#[tokio::test]
async fn assigns_employee_into_segment() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let employee_id = EmployeeId::new();
    let role = RoleId::new();
    store.state.lock().await.employees.push(Employee {
        id: employee_id,
        org_id,
        first_name: "Alice".to_owned(),
        last_name: "Martin".to_owned(),
        roles: vec![role],
        contract_type: ContractType::Cdi,
        unavailabilities: Vec::new(),
        linked_user_id: None,
    });

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    service
        .assign_shift(
            &manager(),
            org_id,
            created.schedule_id,
            day_id,
            AssignShiftInput {
                segment_name: "Soir".to_owned(),
                employee_id,
                role,
                start: Some("19:00".to_owned()),
                end: None,
            },
        )
        .await
        .unwrap();

    let state = store.state.lock().await;
    let day = state.days.iter().find(|day| day.id == day_id).unwrap();
    let soir = &day.segments[1];
    assert_eq!(soir.assignments.len(), 1);
    assert_eq!(soir.assignments[0].employee_id, employee_id);
    assert_eq!(soir.assignments[0].start.as_deref(), Some("19:00"));

    assert_eq!(state.audits[1].action, "schedule.assign");
}

#[tokio::test]
async fn assignment_to_unknown_segment_is_not_found() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let employee_id = EmployeeId::new();
    store.state.lock().await.employees.push(Employee {
        id: employee_id,
        org_id,
        first_name: "Alice".to_owned(),
        last_name: "Martin".to_owned(),
        roles: Vec::new(),
        contract_type: ContractType::Extra,
        unavailabilities: Vec::new(),
        linked_user_id: None,
    });

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    let error = service
        .assign_shift(
            &manager(),
            org_id,
            created.schedule_id,
            day_id,
            AssignShiftInput {
                segment_name: "Nuit".to_owned(),
                employee_id,
                role: RoleId::new(),
                start: None,
                end: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

#[tokio::test]
async fn assignment_of_unknown_employee_is_not_found() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    let error = service
        .assign_shift(
            &manager(),
            org_id,
            created.schedule_id,
            day_id,
            AssignShiftInput {
                segment_name: "Midi".to_owned(),
                employee_id: EmployeeId::new(),
                role: RoleId::new(),
                start: None,
                end: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
}

fn seed_employee(state: &mut FakeState, org_id: OrgId, first_name: &str) -> EmployeeId {
    let employee_id = EmployeeId::new();
    state.employees.push(Employee {
        id: employee_id,
        org_id,
        first_name: first_name.to_owned(),
        last_name: "Martin".to_owned(),
        roles: Vec::new(),
        contract_type: ContractType::Cdi,
        unavailabilities: Vec::new(),
        linked_user_id: None,
    });
    employee_id
}

#[tokio::test]
async fn simultaneous_assignments_to_one_segment_both_survive() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let (alice, bruno) = {
        let mut state = store.state.lock().await;
        (
            seed_employee(&mut state, org_id, "Alice"),
            seed_employee(&mut state, org_id, "Bruno"),
        )
    };

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    let input = |employee_id| AssignShiftInput {
        segment_name: "Midi".to_owned(),
        employee_id,
        role: RoleId::new(),
        start: None,
        end: None,
    };

    let actor = manager();
    let (first, second) = tokio::join!(
        service.assign_shift(&actor, org_id, created.schedule_id, day_id, input(alice)),
        service.assign_shift(&actor, org_id, created.schedule_id, day_id, input(bruno)),
    );
    first.unwrap();
    second.unwrap();

    let state = store.state.lock().await;
    let day = state.days.iter().find(|day| day.id == day_id).unwrap();
    assert_eq!(day.segments[0].assignments.len(), 2);
}

#[tokio::test]
async fn repeated_assignment_of_one_employee_conflicts() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let employee_id = {
        let mut state = store.state.lock().await;
        seed_employee(&mut state, org_id, "Alice")
    };

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    let input = || AssignShiftInput {
        segment_name: "Midi".to_owned(),
        employee_id,
        role: RoleId::new(),
        start: None,
        end: None,
    };

    service
        .assign_shift(&manager(), org_id, created.schedule_id, day_id, input())
        .await
        .unwrap();
    let error = service
        .assign_shift(&manager(), org_id, created.schedule_id, day_id, input())
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Conflict(_)));

    let state = store.state.lock().await;
    let day = state.days.iter().find(|day| day.id == day_id).unwrap();
    assert_eq!(day.segments[0].assignments.len(), 1);
}

#[tokio::test]
async fn malformed_time_override_is_rejected() {
    let (service, store) = service();
    let org_id = seed_restaurant(&store).await;

    let employee_id = {
        let mut state = store.state.lock().await;
        seed_employee(&mut state, org_id, "Alice")
    };

    let created = service
        .create_schedule(&manager(), org_id, week_input())
        .await
        .unwrap();
    let day_id = store.state.lock().await.days[0].id;

    for bad_start in ["25:00", "9:00", "noon"] {
        let error = service
            .assign_shift(
                &manager(),
                org_id,
                created.schedule_id,
                day_id,
                AssignShiftInput {
                    segment_name: "Midi".to_owned(),
                    employee_id,
                    role: RoleId::new(),
                    start: Some(bad_start.to_owned()),
                    end: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    let state = store.state.lock().await;
    let day = state.days.iter().find(|day| day.id == day_id).unwrap();
    assert!(day.segments[0].assignments.is_empty());
}
