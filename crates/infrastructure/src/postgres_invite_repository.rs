//! PostgreSQL adapter for the invite repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rotaplan_application::{AuditEntry, InviteRepository, NewNotification};
use rotaplan_core::{AppError, AppResult, OrgId};
use rotaplan_domain::{EmployeeId, Invite, InviteId, Membership};

use crate::postgres_audit_log_repository::insert_audit_entry;
use crate::postgres_notification_repository::enqueue_notification;
use crate::postgres_org_repository::insert_membership;

/// PostgreSQL-backed invite repository.
#[derive(Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InviteRow {
    id: Uuid,
    org_id: Uuid,
    email: String,
    target_role: String,
    employee_id: Option<Uuid>,
    created_by: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    status: String,
}

impl InviteRow {
    fn into_invite(self) -> AppResult<Invite> {
        Ok(Invite {
            id: InviteId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            email: self.email,
            target_role: self.target_role.parse()?,
            employee_id: self.employee_id.map(EmployeeId::from_uuid),
            created_by: self.created_by,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            status: self.status.parse()?,
        })
    }
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn create_invite(
        &self,
        invite: Invite,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO invites
                (id, org_id, email, target_role, employee_id, created_by, token_hash,
                 expires_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(invite.id.as_uuid())
        .bind(invite.org_id.as_uuid())
        .bind(&invite.email)
        .bind(invite.target_role.as_str())
        .bind(invite.employee_id.map(|id| id.as_uuid()))
        .bind(&invite.created_by)
        .bind(&invite.token_hash)
        .bind(invite.expires_at)
        .bind(invite.status.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create invite: {error}")))?;

        insert_audit_entry(&mut transaction, &audit).await?;
        enqueue_notification(&mut transaction, &notification).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invite>> {
        let row = sqlx::query_as::<_, InviteRow>(
            r#"
            SELECT id, org_id, email, target_role, employee_id, created_by, token_hash,
                   expires_at, status
            FROM invites
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load invite: {error}")))?;

        row.map(InviteRow::into_invite).transpose()
    }

    async fn mark_expired(&self, invite_id: InviteId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE invites
            SET status = 'expired'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expire invite: {error}")))?;

        Ok(())
    }

    async fn redeem(
        &self,
        invite_id: InviteId,
        membership: Membership,
        audit: AuditEntry,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // Guard against concurrent redemption of the same invite.
        let updated = sqlx::query(
            r#"
            UPDATE invites
            SET status = 'used'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to redeem invite: {error}")))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::FailedPrecondition(
                "invite is no longer pending".to_owned(),
            ));
        }

        insert_membership(&mut transaction, &membership).await?;

        if let Some(employee_id) = membership.linked_employee_id {
            sqlx::query(
                r#"
                UPDATE employees
                SET linked_user_id = $3
                WHERE org_id = $1 AND id = $2
                "#,
            )
            .bind(membership.org_id.as_uuid())
            .bind(employee_id.as_uuid())
            .bind(&membership.user_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to link employee: {error}")))?;
        }

        insert_audit_entry(&mut transaction, &audit).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
