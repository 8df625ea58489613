//! PostgreSQL adapter for the schedule repository port.
//!
//! Day segments (assignments and needs included) are stored as one JSONB
//! document per day. Assignment writes lock the day row for the whole
//! read-modify-write, so concurrent assignments to the same day serialize.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rotaplan_application::{AuditEntry, ScheduleBundle, ScheduleRepository};
use rotaplan_core::{AppError, AppResult, OrgId};
use rotaplan_domain::{
    Assignment, Schedule, ScheduleDay, ScheduleDayId, ScheduleId, ScheduleSegment,
};

use crate::postgres_audit_log_repository::insert_audit_entry;

/// PostgreSQL-backed schedule repository.
#[derive(Clone)]
pub struct PostgresScheduleRepository {
    pool: PgPool,
}

impl PostgresScheduleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRow {
    id: Uuid,
    org_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_by: String,
}

impl ScheduleRow {
    fn into_schedule(self) -> AppResult<Schedule> {
        Ok(Schedule {
            id: ScheduleId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.parse()?,
            created_by: self.created_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct ScheduleDayRow {
    id: Uuid,
    schedule_id: Uuid,
    date: NaiveDate,
    segments: serde_json::Value,
}

impl ScheduleDayRow {
    fn into_day(self) -> AppResult<ScheduleDay> {
        let segments: Vec<ScheduleSegment> =
            serde_json::from_value(self.segments).map_err(|error| {
                AppError::Internal(format!("stored day segments are invalid: {error}"))
            })?;

        Ok(ScheduleDay {
            id: ScheduleDayId::from_uuid(self.id),
            schedule_id: ScheduleId::from_uuid(self.schedule_id),
            date: self.date,
            segments,
        })
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepository {
    async fn create_schedule(&self, bundle: ScheduleBundle) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let schedule = &bundle.schedule;
        sqlx::query(
            r#"
            INSERT INTO schedules (id, org_id, start_date, end_date, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(schedule.id.as_uuid())
        .bind(schedule.org_id.as_uuid())
        .bind(schedule.start_date)
        .bind(schedule.end_date)
        .bind(schedule.status.as_str())
        .bind(&schedule.created_by)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create schedule: {error}")))?;

        for day in &bundle.days {
            let segments = serde_json::to_value(&day.segments).map_err(|error| {
                AppError::Internal(format!("failed to encode day segments: {error}"))
            })?;

            sqlx::query(
                r#"
                INSERT INTO schedule_days (id, schedule_id, date, segments)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(day.id.as_uuid())
            .bind(day.schedule_id.as_uuid())
            .bind(day.date)
            .bind(segments)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to create schedule day: {error}"))
            })?;
        }

        insert_audit_entry(&mut transaction, &bundle.audit).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_schedule(
        &self,
        org_id: OrgId,
        schedule_id: ScheduleId,
    ) -> AppResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, org_id, start_date, end_date, status, created_by
            FROM schedules
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(schedule_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load schedule: {error}")))?;

        row.map(ScheduleRow::into_schedule).transpose()
    }

    async fn add_assignment(
        &self,
        schedule_id: ScheduleId,
        day_id: ScheduleDayId,
        segment_name: &str,
        assignment: Assignment,
        audit: AuditEntry,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, ScheduleDayRow>(
            r#"
            SELECT id, schedule_id, date, segments
            FROM schedule_days
            WHERE schedule_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(schedule_id.as_uuid())
        .bind(day_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load schedule day: {error}")))?;

        let mut day = row
            .ok_or_else(|| AppError::NotFound(format!("schedule day '{day_id}' not found")))?
            .into_day()?;
        day.assign(segment_name, assignment)?;

        let encoded = serde_json::to_value(&day.segments).map_err(|error| {
            AppError::Internal(format!("failed to encode day segments: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE schedule_days
            SET segments = $2
            WHERE id = $1
            "#,
        )
        .bind(day_id.as_uuid())
        .bind(encoded)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save day segments: {error}")))?;

        insert_audit_entry(&mut transaction, &audit).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
