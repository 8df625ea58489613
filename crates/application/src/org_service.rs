//! Organization bootstrap: ports and application service.
//!
//! Creating an organization materializes the org record, the owner's
//! membership, staff roles, initial employees, the default leave policy,
//! and shift templates as one atomic bundle. Role references supplied by
//! position are resolved in two phases: roles first, then every dependent
//! entity against the captured position-to-ID mapping.

use std::sync::Arc;

use async_trait::async_trait;

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    ContractType, Employee, EmployeeId, Industry, LeavePolicy, MemberRole, Membership,
    MembershipStatus, OpenDay, OrgSettings, Organization, RoleId, Season, ShiftTemplate,
    StaffRole, StaffRoleSpec, TemplateId, TemplateSpec, TimeSegment, Unavailability,
    default_open_days, default_staff_roles, resolve_role_positions, resolve_template_matrix,
    slugify, validate_org_name,
};

use crate::audit::AuditEntry;

/// Bounded number of slug candidates tried before giving up.
const SLUG_MAX_ATTEMPTS: usize = 50;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Everything persisted when an organization is created. The repository
/// commits the whole bundle, audit entry included, or nothing.
#[derive(Debug, Clone)]
pub struct OrgBundle {
    /// The organization record.
    pub organization: Organization,
    /// The creator's owner membership.
    pub owner_membership: Membership,
    /// Staff roles, in creation order.
    pub staff_roles: Vec<StaffRole>,
    /// Initial employees with resolved role references.
    pub employees: Vec<Employee>,
    /// The default leave policy.
    pub leave_policy: LeavePolicy,
    /// Shift templates with resolved matrices.
    pub templates: Vec<ShiftTemplate>,
    /// Audit entry for the creation.
    pub audit: AuditEntry,
}

/// Repository port for organizations and their directly-owned records.
#[async_trait]
pub trait OrgRepository: Send + Sync {
    /// Whether any organization already uses this slug. This pre-check is
    /// advisory only; [`OrgRepository::create_org`] re-verifies inside its
    /// transaction.
    async fn slug_in_use(&self, slug: &str) -> AppResult<bool>;

    /// Persists a whole organization bundle atomically.
    ///
    /// Fails with `Conflict` when the bundle's slug was claimed by a
    /// concurrent creation since the pre-check.
    async fn create_org(&self, bundle: OrgBundle) -> AppResult<()>;

    /// Finds an organization by ID.
    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<Organization>>;

    /// Finds a user's membership in an organization.
    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<Membership>>;

    /// Finds an employee profile.
    async fn find_employee(
        &self,
        org_id: OrgId,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>>;

    /// Finds a shift template.
    async fn find_template(
        &self,
        org_id: OrgId,
        template_id: TemplateId,
    ) -> AppResult<Option<ShiftTemplate>>;
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One open-day entry as supplied at creation.
#[derive(Debug, Clone)]
pub struct OpenDayInput {
    /// Weekday index, 0-6.
    pub day: u8,
    /// Whether the org operates on this weekday.
    pub is_open: bool,
    /// Time segments for this weekday.
    pub segments: Vec<TimeSegmentInput>,
}

/// One time segment as supplied at creation.
#[derive(Debug, Clone)]
pub struct TimeSegmentInput {
    /// Segment name.
    pub name: String,
    /// Start time, `HH:mm`.
    pub start: String,
    /// End time, `HH:mm`.
    pub end: String,
}

/// One employee as supplied at creation. Role references are decimal-string
/// positions into the same payload's role list.
#[derive(Debug, Clone)]
pub struct EmployeeInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Positional role references.
    pub roles: Vec<String>,
    /// Contract category.
    pub contract_type: ContractType,
}

/// Parameters for organization creation.
#[derive(Debug, Clone)]
pub struct CreateOrgInput {
    /// Display name, 1-100 characters.
    pub name: String,
    /// Preferred slug; derived from `name` when absent.
    pub slug: Option<String>,
    /// IANA timezone; defaults to `Europe/Paris`.
    pub timezone: Option<String>,
    /// BCP 47 locale; defaults to `fr-FR`.
    pub locale: Option<String>,
    /// Business sector; defaults to `restaurant`.
    pub industry: Option<Industry>,
    /// Operating calendar; industry default when absent or empty.
    pub open_days: Option<Vec<OpenDayInput>>,
    /// Staff roles; industry default when absent or empty.
    pub roles: Option<Vec<StaffRoleSpec>>,
    /// Initial employees.
    pub employees: Option<Vec<EmployeeInput>>,
    /// Shift templates with positional role references.
    pub templates: Option<Vec<TemplateSpec>>,
}

/// Result of organization creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrg {
    /// The new organization's identifier.
    pub org_id: OrgId,
    /// The slug that was allocated.
    pub slug: String,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for organization bootstrap.
#[derive(Clone)]
pub struct OrgService {
    org_repository: Arc<dyn OrgRepository>,
}

impl OrgService {
    /// Creates a new organization service.
    #[must_use]
    pub fn new(org_repository: Arc<dyn OrgRepository>) -> Self {
        Self { org_repository }
    }

    /// Creates an organization and its dependent records atomically.
    ///
    /// Slug allocation is optimistic: each candidate is pre-checked with a
    /// read, then re-verified inside the creation transaction; a `Conflict`
    /// from a concurrent creation moves on to the next suffixed candidate.
    pub async fn create_org(
        &self,
        actor: &ActorIdentity,
        input: CreateOrgInput,
    ) -> AppResult<CreatedOrg> {
        validate_org_name(&input.name)?;

        let industry = input.industry.unwrap_or(Industry::Restaurant);
        let open_days = build_open_days(industry, input.open_days)?;

        let role_specs = match input.roles {
            Some(specs) if !specs.is_empty() => {
                for spec in &specs {
                    spec.validate()?;
                }
                specs
            }
            _ => default_staff_roles(industry),
        };

        let employee_inputs = input.employees.unwrap_or_default();
        for employee in &employee_inputs {
            Employee::validate_names(&employee.first_name, &employee.last_name)?;
        }

        let template_specs = input.templates.unwrap_or_default();
        for template in &template_specs {
            template.validate()?;
        }

        let base_slug = match &input.slug {
            Some(slug) => slugify(slug),
            None => slugify(&input.name),
        };
        if base_slug.is_empty() {
            return Err(AppError::Validation(
                "slug source must contain at least one alphanumeric character".to_owned(),
            ));
        }

        let org_id = OrgId::new();

        // Phase one: materialize roles and capture the position-to-ID map.
        let staff_roles: Vec<StaffRole> = role_specs
            .into_iter()
            .map(|spec| StaffRole::from_spec(org_id, spec))
            .collect();
        let role_ids: Vec<RoleId> = staff_roles.iter().map(|role| role.id).collect();

        // Phase two: resolve dependent entities against the captured map.
        let employees: Vec<Employee> = employee_inputs
            .into_iter()
            .map(|employee| Employee {
                id: EmployeeId::new(),
                org_id,
                first_name: employee.first_name,
                last_name: employee.last_name,
                roles: resolve_role_positions(&employee.roles, &role_ids),
                contract_type: employee.contract_type,
                unavailabilities: Vec::<Unavailability>::new(),
                linked_user_id: None,
            })
            .collect();

        let templates: Vec<ShiftTemplate> = template_specs
            .into_iter()
            .map(|template| ShiftTemplate {
                id: TemplateId::new(),
                org_id,
                name: template.name.clone(),
                season: template.season.unwrap_or(Season::Normal),
                matrix: resolve_template_matrix(&template.matrix, &role_ids),
            })
            .collect();

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "org.create".to_owned(),
            entity_ref: format!("orgs/{org_id}"),
            metadata: serde_json::json!({
                "industry": industry.as_str(),
                "roles_count": staff_roles.len(),
                "employees_count": employees.len(),
                "templates_count": templates.len(),
            }),
        };

        let bundle = OrgBundle {
            organization: Organization {
                id: org_id,
                name: input.name,
                slug: base_slug.clone(),
                timezone: input.timezone.unwrap_or_else(|| "Europe/Paris".to_owned()),
                locale: input.locale.unwrap_or_else(|| "fr-FR".to_owned()),
                industry,
                owner_user_id: actor.subject().to_owned(),
                settings: OrgSettings {
                    week_starts_on: 1,
                    open_days,
                    holidays_region: Some("FR".to_owned()),
                },
            },
            owner_membership: Membership {
                user_id: actor.subject().to_owned(),
                org_id,
                role: MemberRole::Owner,
                status: MembershipStatus::Active,
                linked_employee_id: None,
            },
            staff_roles,
            employees,
            leave_policy: LeavePolicy::default_paid(org_id),
            templates,
            audit,
        };

        let slug = self.allocate_and_create(&base_slug, bundle).await?;
        Ok(CreatedOrg { org_id, slug })
    }

    /// Tries suffixed slug candidates until the bundle commits.
    async fn allocate_and_create(
        &self,
        base_slug: &str,
        mut bundle: OrgBundle,
    ) -> AppResult<String> {
        for attempt in 0..SLUG_MAX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base_slug.to_owned()
            } else {
                format!("{base_slug}-{attempt}")
            };

            if self.org_repository.slug_in_use(&candidate).await? {
                continue;
            }

            bundle.organization.slug = candidate.clone();
            match self.org_repository.create_org(bundle.clone()).await {
                Ok(()) => return Ok(candidate),
                // Lost the race to a concurrent creation; try the next suffix.
                Err(AppError::Conflict(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(AppError::Internal(format!(
            "could not allocate a unique slug for '{base_slug}'"
        )))
    }

    /// Returns the organization repository for use by other services.
    #[must_use]
    pub fn org_repository(&self) -> &Arc<dyn OrgRepository> {
        &self.org_repository
    }
}

/// Validates caller-supplied open days, or falls back to the industry
/// default when none (or an empty list) was supplied.
fn build_open_days(
    industry: Industry,
    open_days: Option<Vec<OpenDayInput>>,
) -> AppResult<Vec<OpenDay>> {
    match open_days {
        Some(entries) if !entries.is_empty() => entries
            .into_iter()
            .map(|entry| {
                let segments = entry
                    .segments
                    .into_iter()
                    .map(|segment| TimeSegment::new(segment.name, segment.start, segment.end))
                    .collect::<AppResult<Vec<_>>>()?;
                OpenDay::new(entry.day, entry.is_open, segments)
            })
            .collect(),
        _ => Ok(default_open_days(industry)),
    }
}
