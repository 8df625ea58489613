//! Schedules and their day-by-day expansion from the operating calendar.
//!
//! `expand_schedule_days` is the core of schedule generation: it walks the
//! requested date range, skips weekdays the organization marks closed, and
//! seeds each open day's segments with staffing needs from an optional
//! template. It never creates assignments.

use chrono::{Datelike, NaiveDate};
use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::employee::EmployeeId;
use crate::org::OrgSettings;
use crate::staff_role::RoleId;
use crate::template::{NeedSlot, ShiftTemplate};

/// Maximum number of days between schedule start and end dates.
pub const MAX_SCHEDULE_SPAN_DAYS: i64 = 28;

/// Unique identifier for a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(Uuid);

impl ScheduleId {
    /// Creates a new random schedule identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a schedule identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScheduleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a schedule day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleDayId(Uuid);

impl ScheduleDayId {
    /// Creates a new random schedule-day identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a schedule-day identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ScheduleDayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScheduleDayId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Being edited, not visible to staff.
    Draft,
    /// Visible to staff.
    Published,
    /// Kept for history.
    Archived,
}

impl ScheduleStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(AppError::Validation(format!(
                "unknown schedule status '{value}'"
            ))),
        }
    }
}

/// One employee staffed into a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Staffed employee.
    pub employee_id: EmployeeId,
    /// Role the employee fills for this shift.
    pub role: RoleId,
    /// Optional `HH:mm` override of the segment start.
    pub start: Option<String>,
    /// Optional `HH:mm` override of the segment end.
    pub end: Option<String>,
}

/// A segment of a concrete schedule day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    /// Segment name, copied from the operating calendar.
    pub name: String,
    /// Segment start, `HH:mm`.
    pub start: String,
    /// Segment end, `HH:mm`.
    pub end: String,
    /// Staffed employees. Empty at generation time.
    pub assignments: Vec<Assignment>,
    /// Staffing needs seeded from a template; unset when the template has
    /// no entry for this weekday and segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<Vec<NeedSlot>>,
}

/// One open calendar day of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    /// Unique day identifier.
    pub id: ScheduleDayId,
    /// Owning schedule.
    pub schedule_id: ScheduleId,
    /// Calendar date.
    pub date: NaiveDate,
    /// Segments for this day.
    pub segments: Vec<ScheduleSegment>,
}

impl ScheduleDay {
    /// Appends an assignment to the named segment.
    ///
    /// Fails with `NotFound` when the day has no segment with that name,
    /// and with `Conflict` when the employee is already assigned to it.
    pub fn assign(&mut self, segment_name: &str, assignment: Assignment) -> AppResult<()> {
        let segment = self
            .segments
            .iter_mut()
            .find(|segment| segment.name == segment_name)
            .ok_or_else(|| {
                AppError::NotFound(format!("segment '{segment_name}' not found on this day"))
            })?;

        if segment
            .assignments
            .iter()
            .any(|existing| existing.employee_id == assignment.employee_id)
        {
            return Err(AppError::Conflict(format!(
                "employee '{}' is already assigned to segment '{segment_name}'",
                assignment.employee_id
            )));
        }

        segment.assignments.push(assignment);
        Ok(())
    }
}

/// A concrete date-range schedule owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique schedule identifier.
    pub id: ScheduleId,
    /// Owning organization.
    pub org_id: OrgId,
    /// First date of the range, inclusive.
    pub start_date: NaiveDate,
    /// Last date of the range, inclusive.
    pub end_date: NaiveDate,
    /// Lifecycle state.
    pub status: ScheduleStatus,
    /// Subject of the user who generated the schedule.
    pub created_by: String,
}

/// Validates a schedule date range: ordered, and spanning at most
/// [`MAX_SCHEDULE_SPAN_DAYS`] days between start and end.
pub fn validate_schedule_range(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<()> {
    if start_date > end_date {
        return Err(AppError::Validation(
            "start date must not be after end date".to_owned(),
        ));
    }

    let span = (end_date - start_date).num_days();
    if span > MAX_SCHEDULE_SPAN_DAYS {
        return Err(AppError::Validation(format!(
            "schedule span must not exceed {MAX_SCHEDULE_SPAN_DAYS} days"
        )));
    }

    Ok(())
}

/// Returns the 0 (Sunday) - 6 (Saturday) weekday index of a date.
#[must_use]
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday is 0-6 by construction.
    date.weekday().num_days_from_sunday() as u8
}

/// Expands a validated date range into schedule days.
///
/// Closed weekdays (absent from the calendar or `is_open == false`) produce
/// no day at all. Each produced day carries one segment per configured time
/// segment with empty assignments; when a template is given, segment needs
/// are drawn from `matrix[weekday][segment name]`.
#[must_use]
pub fn expand_schedule_days(
    schedule_id: ScheduleId,
    settings: &OrgSettings,
    template: Option<&ShiftTemplate>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<ScheduleDay> {
    let mut days = Vec::new();
    let mut current = start_date;

    while current <= end_date {
        let weekday = weekday_index(current);
        let open_day = settings
            .open_day(weekday)
            .filter(|open_day| open_day.is_open);

        if let Some(open_day) = open_day {
            let segments = open_day
                .segments
                .iter()
                .map(|segment| ScheduleSegment {
                    name: segment.name.clone(),
                    start: segment.start.clone(),
                    end: segment.end.clone(),
                    assignments: Vec::new(),
                    needs: template
                        .and_then(|template| template.needs_for(weekday, &segment.name))
                        .map(<[NeedSlot]>::to_vec),
                })
                .collect();

            days.push(ScheduleDay {
                id: ScheduleDayId::new(),
                schedule_id,
                date: current,
                segments,
            });
        }

        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    days
}
