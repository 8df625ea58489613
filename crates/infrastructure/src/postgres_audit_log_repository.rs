//! PostgreSQL adapter for the audit log.
//!
//! `insert_audit_entry` is shared by every mutating repository so the audit
//! record commits or rolls back with the write it describes.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use rotaplan_application::{AuditEntry, AuditLogEntry, AuditLogQuery, AuditLogRepository};
use rotaplan_core::{AppError, AppResult, OrgId};

/// Inserts an audit entry inside an open transaction.
pub(crate) async fn insert_audit_entry(
    transaction: &mut Transaction<'_, Postgres>,
    entry: &AuditEntry,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log_entries (org_id, actor_user_id, action, entity_ref, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry.org_id.as_uuid())
    .bind(&entry.actor_user_id)
    .bind(&entry.action)
    .bind(&entry.entity_ref)
    .bind(&entry.metadata)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to write audit entry: {error}")))?;

    Ok(())
}

/// PostgreSQL-backed repository for the audit log read model.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    entry_id: uuid::Uuid,
    actor_user_id: String,
    action: String,
    entity_ref: String,
    metadata: serde_json::Value,
    created_at: String,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(
        &self,
        org_id: OrgId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS entry_id,
                actor_user_id,
                action,
                entity_ref,
                metadata,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM audit_log_entries
            WHERE org_id = $1
                AND ($2::TEXT IS NULL OR action = $2)
                AND ($3::TEXT IS NULL OR actor_user_id = $3)
            ORDER BY created_at DESC
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(query.action)
        .bind(query.actor_user_id)
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogEntry {
                entry_id: row.entry_id.to_string(),
                actor_user_id: row.actor_user_id,
                action: row.action,
                entity_ref: row.entity_ref,
                metadata: row.metadata,
                created_at: row.created_at,
            })
            .collect())
    }
}
