//! PostgreSQL adapter for the notification queue.
//!
//! `enqueue_notification` is shared by the mutating repositories so the
//! queued record commits with the write that caused it. The worker claims
//! rows with `FOR UPDATE SKIP LOCKED` so multiple workers never deliver
//! the same notification; a claim stamps `claimed_at` and holds only for
//! the lease, so rows stranded by a crashed worker are reclaimed.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rotaplan_application::{NewNotification, NotificationQueue, QueuedNotification};
use rotaplan_core::{AppError, AppResult, OrgId};

/// Enqueues a notification inside an open transaction.
pub(crate) async fn enqueue_notification(
    transaction: &mut Transaction<'_, Postgres>,
    notification: &NewNotification,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (org_id, recipient, template, payload)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(notification.org_id.as_uuid())
    .bind(&notification.to)
    .bind(notification.template.as_str())
    .bind(&notification.payload)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to enqueue notification: {error}")))?;

    Ok(())
}

/// PostgreSQL-backed notification queue.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    org_id: Uuid,
    recipient: String,
    template: String,
    payload: serde_json::Value,
}

#[async_trait]
impl NotificationQueue for PostgresNotificationRepository {
    async fn claim_pending(
        &self,
        limit: usize,
        lease_seconds: u64,
    ) -> AppResult<Vec<QueuedNotification>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, org_id, recipient, template, payload
            FROM notifications
            WHERE status = 'pending'
              AND (claimed_at IS NULL OR claimed_at < now() - make_interval(secs => $2))
            ORDER BY created_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit.min(100) as i64)
        .bind(lease_seconds as f64)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to claim notifications: {error}"))
        })?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        if !ids.is_empty() {
            sqlx::query(
                r#"
                UPDATE notifications
                SET claimed_at = now(), attempts = attempts + 1
                WHERE id = ANY($1)
                "#,
            )
            .bind(&ids)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to mark notifications claimed: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(QueuedNotification {
                    id: row.id,
                    org_id: OrgId::from_uuid(row.org_id),
                    to: row.recipient,
                    template: row.template.parse()?,
                    payload: row.payload,
                })
            })
            .collect()
    }

    async fn mark_sent(&self, notification_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'sent', sent_at = now(), last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark notification sent: {error}"))
        })?;

        Ok(())
    }

    async fn mark_failed(&self, notification_id: Uuid, reason: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'failed', last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark notification failed: {error}"))
        })?;

        Ok(())
    }
}
