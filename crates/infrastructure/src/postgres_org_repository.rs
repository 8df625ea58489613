//! PostgreSQL adapter for the organization repository port.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rotaplan_application::{OrgBundle, OrgRepository};
use rotaplan_core::{AppError, AppResult, OrgId};
use rotaplan_domain::{
    Employee, EmployeeId, Membership, OrgSettings, Organization, RoleId, ShiftTemplate,
    TemplateId, TemplateMatrix, Unavailability,
};

use crate::postgres_audit_log_repository::insert_audit_entry;

/// PostgreSQL-backed organization repository.
#[derive(Clone)]
pub struct PostgresOrgRepository {
    pool: PgPool,
}

impl PostgresOrgRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    slug: String,
    timezone: String,
    locale: String,
    industry: String,
    owner_user_id: String,
    settings: serde_json::Value,
}

impl OrganizationRow {
    fn into_organization(self) -> AppResult<Organization> {
        let settings: OrgSettings = serde_json::from_value(self.settings).map_err(|error| {
            AppError::Internal(format!("stored organization settings are invalid: {error}"))
        })?;

        Ok(Organization {
            id: OrgId::from_uuid(self.id),
            name: self.name,
            slug: self.slug,
            timezone: self.timezone,
            locale: self.locale,
            industry: self.industry.parse()?,
            owner_user_id: self.owner_user_id,
            settings,
        })
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    org_id: Uuid,
    user_id: String,
    role: String,
    status: String,
    linked_employee_id: Option<Uuid>,
}

impl MembershipRow {
    fn into_membership(self) -> AppResult<Membership> {
        Ok(Membership {
            user_id: self.user_id,
            org_id: OrgId::from_uuid(self.org_id),
            role: self.role.parse()?,
            status: self.status.parse()?,
            linked_employee_id: self.linked_employee_id.map(EmployeeId::from_uuid),
        })
    }
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    org_id: Uuid,
    first_name: String,
    last_name: String,
    roles: serde_json::Value,
    contract_type: String,
    unavailabilities: serde_json::Value,
    linked_user_id: Option<String>,
}

impl EmployeeRow {
    fn into_employee(self) -> AppResult<Employee> {
        let role_ids: Vec<Uuid> = serde_json::from_value(self.roles).map_err(|error| {
            AppError::Internal(format!("stored employee roles are invalid: {error}"))
        })?;
        let unavailabilities: Vec<Unavailability> =
            serde_json::from_value(self.unavailabilities).map_err(|error| {
                AppError::Internal(format!(
                    "stored employee unavailabilities are invalid: {error}"
                ))
            })?;

        Ok(Employee {
            id: EmployeeId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            first_name: self.first_name,
            last_name: self.last_name,
            roles: role_ids.into_iter().map(RoleId::from_uuid).collect(),
            contract_type: self.contract_type.parse()?,
            unavailabilities,
            linked_user_id: self.linked_user_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    season: String,
    matrix: serde_json::Value,
}

impl TemplateRow {
    fn into_template(self) -> AppResult<ShiftTemplate> {
        let matrix: TemplateMatrix = serde_json::from_value(self.matrix).map_err(|error| {
            AppError::Internal(format!("stored template matrix is invalid: {error}"))
        })?;

        Ok(ShiftTemplate {
            id: TemplateId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            name: self.name,
            season: self.season.parse()?,
            matrix,
        })
    }
}

/// Inserts a membership row inside an open transaction.
///
/// Fails with `Conflict` when the (org, user) pair already exists.
pub(crate) async fn insert_membership(
    transaction: &mut Transaction<'_, Postgres>,
    membership: &Membership,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO memberships (org_id, user_id, role, status, linked_employee_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(membership.org_id.as_uuid())
    .bind(&membership.user_id)
    .bind(membership.role.as_str())
    .bind(membership.status.as_str())
    .bind(membership.linked_employee_id.map(|id| id.as_uuid()))
    .execute(&mut **transaction)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(
            "user is already a member of this organization".to_owned(),
        )),
        Err(error) => Err(AppError::Internal(format!(
            "failed to create membership: {error}"
        ))),
    }
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn roles_to_json(roles: &[RoleId]) -> serde_json::Value {
    serde_json::Value::Array(
        roles
            .iter()
            .map(|role| serde_json::Value::String(role.as_uuid().to_string()))
            .collect(),
    )
}

#[async_trait]
impl OrgRepository for PostgresOrgRepository {
    async fn slug_in_use(&self, slug: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM organizations WHERE slug = $1)
            "#,
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check slug: {error}")))
    }

    async fn create_org(&self, bundle: OrgBundle) -> AppResult<()> {
        let organization = &bundle.organization;
        let settings = serde_json::to_value(&organization.settings).map_err(|error| {
            AppError::Internal(format!("failed to encode organization settings: {error}"))
        })?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let insert = sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, timezone, locale, industry, owner_user_id, settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(organization.id.as_uuid())
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(&organization.timezone)
        .bind(&organization.locale)
        .bind(organization.industry.as_str())
        .bind(&organization.owner_user_id)
        .bind(settings)
        .execute(&mut *transaction)
        .await;

        match insert {
            Ok(_) => {}
            Err(error) if is_unique_violation(&error) => {
                return Err(AppError::Conflict(format!(
                    "slug '{}' is already in use",
                    organization.slug
                )));
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to create organization: {error}"
                )));
            }
        }

        insert_membership(&mut transaction, &bundle.owner_membership).await?;

        for (position, role) in bundle.staff_roles.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO staff_roles (id, org_id, name, color, level, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(role.id.as_uuid())
            .bind(role.org_id.as_uuid())
            .bind(&role.name)
            .bind(&role.color)
            .bind(role.level)
            .bind(position as i32)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to create staff role: {error}"))
            })?;
        }

        for employee in &bundle.employees {
            let unavailabilities =
                serde_json::to_value(&employee.unavailabilities).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to encode employee unavailabilities: {error}"
                    ))
                })?;

            sqlx::query(
                r#"
                INSERT INTO employees
                    (id, org_id, first_name, last_name, roles, contract_type, unavailabilities, linked_user_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(employee.id.as_uuid())
            .bind(employee.org_id.as_uuid())
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(roles_to_json(&employee.roles))
            .bind(employee.contract_type.as_str())
            .bind(unavailabilities)
            .bind(&employee.linked_user_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create employee: {error}")))?;
        }

        let policy = &bundle.leave_policy;
        sqlx::query(
            r#"
            INSERT INTO leave_policies
                (org_id, leave_type, days_per_year, accrual_frequency, carry_over_days,
                 min_notice_days, requires_approval)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(policy.org_id.as_uuid())
        .bind(policy.leave_type.as_str())
        .bind(i16::try_from(policy.days_per_year).unwrap_or(i16::MAX))
        .bind(policy.accrual_frequency.as_str())
        .bind(i16::try_from(policy.carry_over_days).unwrap_or(i16::MAX))
        .bind(i16::try_from(policy.min_notice_days).unwrap_or(i16::MAX))
        .bind(policy.requires_approval)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create leave policy: {error}")))?;

        for template in &bundle.templates {
            let matrix = serde_json::to_value(&template.matrix).map_err(|error| {
                AppError::Internal(format!("failed to encode template matrix: {error}"))
            })?;

            sqlx::query(
                r#"
                INSERT INTO shift_templates (id, org_id, name, season, matrix)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(template.id.as_uuid())
            .bind(template.org_id.as_uuid())
            .bind(&template.name)
            .bind(template.season.as_str())
            .bind(matrix)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create template: {error}")))?;
        }

        insert_audit_entry(&mut transaction, &bundle.audit).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, slug, timezone, locale, industry, owner_user_id, settings
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load organization: {error}")))?;

        row.map(OrganizationRow::into_organization).transpose()
    }

    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT org_id, user_id, role, status, linked_employee_id
            FROM memberships
            WHERE org_id = $1 AND user_id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn find_employee(
        &self,
        org_id: OrgId,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, org_id, first_name, last_name, roles, contract_type,
                   unavailabilities, linked_user_id
            FROM employees
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(employee_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load employee: {error}")))?;

        row.map(EmployeeRow::into_employee).transpose()
    }

    async fn find_template(
        &self,
        org_id: OrgId,
        template_id: TemplateId,
    ) -> AppResult<Option<ShiftTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, org_id, name, season, matrix
            FROM shift_templates
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(template_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load template: {error}")))?;

        row.map(TemplateRow::into_template).transpose()
    }
}
