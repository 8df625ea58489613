//! PostgreSQL adapter for the leave request repository port.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rotaplan_application::{AuditEntry, LeaveRepository, NewNotification};
use rotaplan_core::{AppError, AppResult, OrgId};
use rotaplan_domain::{EmployeeId, LeaveRequest, LeaveRequestId, LeaveStatus};

use crate::postgres_audit_log_repository::insert_audit_entry;
use crate::postgres_notification_repository::enqueue_notification;

/// PostgreSQL-backed leave request repository.
#[derive(Clone)]
pub struct PostgresLeaveRepository {
    pool: PgPool,
}

impl PostgresLeaveRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LeaveRequestRow {
    id: Uuid,
    org_id: Uuid,
    employee_id: Uuid,
    created_by_user_id: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    segments: serde_json::Value,
    reason: Option<String>,
    attachments: serde_json::Value,
    status: String,
}

impl LeaveRequestRow {
    fn into_request(self) -> AppResult<LeaveRequest> {
        let segments: Vec<String> = serde_json::from_value(self.segments).map_err(|error| {
            AppError::Internal(format!("stored leave segments are invalid: {error}"))
        })?;
        let attachments: Vec<String> =
            serde_json::from_value(self.attachments).map_err(|error| {
                AppError::Internal(format!("stored leave attachments are invalid: {error}"))
            })?;

        Ok(LeaveRequest {
            id: LeaveRequestId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            employee_id: EmployeeId::from_uuid(self.employee_id),
            created_by_user_id: self.created_by_user_id,
            leave_type: self.leave_type.parse()?,
            start_date: self.start_date,
            end_date: self.end_date,
            segments,
            reason: self.reason,
            attachments,
            status: self.status.parse()?,
        })
    }
}

#[async_trait]
impl LeaveRepository for PostgresLeaveRepository {
    async fn create_request(
        &self,
        request: LeaveRequest,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()> {
        let segments = serde_json::to_value(&request.segments).map_err(|error| {
            AppError::Internal(format!("failed to encode leave segments: {error}"))
        })?;
        let attachments = serde_json::to_value(&request.attachments).map_err(|error| {
            AppError::Internal(format!("failed to encode leave attachments: {error}"))
        })?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, org_id, employee_id, created_by_user_id, leave_type, start_date,
                 end_date, segments, reason, attachments, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.org_id.as_uuid())
        .bind(request.employee_id.as_uuid())
        .bind(&request.created_by_user_id)
        .bind(request.leave_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(segments)
        .bind(&request.reason)
        .bind(attachments)
        .bind(request.status.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create leave request: {error}"))
        })?;

        insert_audit_entry(&mut transaction, &audit).await?;
        enqueue_notification(&mut transaction, &notification).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_request(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
    ) -> AppResult<Option<LeaveRequest>> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            SELECT id, org_id, employee_id, created_by_user_id, leave_type, start_date,
                   end_date, segments, reason, attachments, status
            FROM leave_requests
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load leave request: {error}")))?;

        row.map(LeaveRequestRow::into_request).transpose()
    }

    async fn transition(
        &self,
        org_id: OrgId,
        request_id: LeaveRequestId,
        status: LeaveStatus,
        audit: AuditEntry,
        notification: Option<NewNotification>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // Conditional on the stored status: a concurrent decision loses here.
        let updated = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = $3
            WHERE org_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(request_id.as_uuid())
        .bind(status.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update leave request: {error}"))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::FailedPrecondition(
                "leave request is no longer pending".to_owned(),
            ));
        }

        insert_audit_entry(&mut transaction, &audit).await?;
        if let Some(notification) = &notification {
            enqueue_notification(&mut transaction, notification).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
