//! Leave requests, their decision state machine, and leave policies.

use std::str::FromStr;

use chrono::NaiveDate;
use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::employee::EmployeeId;

/// Unique identifier for a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(Uuid);

impl LeaveRequestId {
    /// Creates a new random leave-request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a leave-request identifier from an existing UUID value.
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

impl Default for LeaveRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LeaveRequestId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Category of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Paid vacation.
    Paid,
    /// Unpaid leave.
    Unpaid,
    /// French working-time-reduction day.
    Rtt,
    /// Sick leave.
    Sick,
    /// Anything else.
    Other,
}

impl LeaveType {
    /// Returns the storage string for this leave type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::Rtt => "rtt",
            Self::Sick => "sick",
            Self::Other => "other",
        }
    }
}

impl FromStr for LeaveType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            "rtt" => Ok(Self::Rtt),
            "sick" => Ok(Self::Sick),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!("unknown leave type '{value}'"))),
        }
    }
}

/// State of a leave request. Only `pending` requests may transition;
/// every other state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a manager decision.
    Pending,
    /// Approved by a manager or owner.
    Approved,
    /// Rejected by a manager or owner.
    Rejected,
    /// Withdrawn by the submitter before a decision.
    Canceled,
}

impl LeaveStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }

    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for LeaveStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "canceled" => Ok(Self::Canceled),
            _ => Err(AppError::Validation(format!(
                "unknown leave status '{value}'"
            ))),
        }
    }
}

/// A manager's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveDecision {
    /// Grant the leave.
    Approved,
    /// Refuse the leave.
    Rejected,
}

impl LeaveDecision {
    /// Returns the storage string for this decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns the terminal status this decision produces.
    #[must_use]
    pub fn as_status(&self) -> LeaveStatus {
        match self {
            Self::Approved => LeaveStatus::Approved,
            Self::Rejected => LeaveStatus::Rejected,
        }
    }
}

impl FromStr for LeaveDecision {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "leave decision must be 'approved' or 'rejected', got '{value}'"
            ))),
        }
    }
}

/// An employee's leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique request identifier.
    pub id: LeaveRequestId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Employee the leave is for.
    pub employee_id: EmployeeId,
    /// Subject of the submitting user.
    pub created_by_user_id: String,
    /// Leave category.
    pub leave_type: LeaveType,
    /// First day of leave, inclusive.
    pub start_date: NaiveDate,
    /// Last day of leave, inclusive.
    pub end_date: NaiveDate,
    /// Segment names when the leave covers only part of each day.
    pub segments: Vec<String>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Attachment references (e.g. sick notes).
    pub attachments: Vec<String>,
    /// Current state.
    pub status: LeaveStatus,
}

/// Validates a leave date range.
pub fn validate_leave_range(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<()> {
    if start_date > end_date {
        return Err(AppError::Validation(
            "leave start date must not be after end date".to_owned(),
        ));
    }

    Ok(())
}

/// How leave days accrue over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualFrequency {
    /// Full allowance granted each year.
    Yearly,
    /// Allowance accrues month by month.
    Monthly,
}

impl AccrualFrequency {
    /// Returns the storage string for this frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for AccrualFrequency {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "yearly" => Ok(Self::Yearly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(AppError::Validation(format!(
                "unknown accrual frequency '{value}'"
            ))),
        }
    }
}

/// An organization's leave policy for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePolicy {
    /// Owning organization.
    pub org_id: OrgId,
    /// Leave type the policy governs.
    pub leave_type: LeaveType,
    /// Days accrued per year.
    pub days_per_year: u16,
    /// Accrual cadence.
    pub accrual_frequency: AccrualFrequency,
    /// Unused days carried into the next year.
    pub carry_over_days: u16,
    /// Minimum notice before the leave starts, in days.
    pub min_notice_days: u16,
    /// Whether requests need a manager decision.
    pub requires_approval: bool,
}

impl LeavePolicy {
    /// The policy every new organization starts with: paid leave,
    /// 25 days per year accrued yearly, 5 carry-over days, 7 days notice,
    /// approval required.
    #[must_use]
    pub fn default_paid(org_id: OrgId) -> Self {
        Self {
            org_id,
            leave_type: LeaveType::Paid,
            days_per_year: 25,
            accrual_frequency: AccrualFrequency::Yearly,
            carry_over_days: 5,
            min_notice_days: 7,
            requires_approval: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Canceled.is_terminal());
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(LeaveDecision::Approved.as_status(), LeaveStatus::Approved);
        assert_eq!(LeaveDecision::Rejected.as_status(), LeaveStatus::Rejected);
    }

    #[allow(clippy::unwrap_used)]
    fn date(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    #[test]
    fn leave_range_must_be_ordered() {
        let early = date("2024-03-01");
        let late = date("2024-03-05");

        assert!(validate_leave_range(early, late).is_ok());
        assert!(validate_leave_range(early, early).is_ok());
        assert!(validate_leave_range(late, early).is_err());
    }

    #[test]
    fn default_policy_matches_onboarding_terms() {
        let policy = LeavePolicy::default_paid(OrgId::new());
        assert_eq!(policy.leave_type, LeaveType::Paid);
        assert_eq!(policy.days_per_year, 25);
        assert_eq!(policy.carry_over_days, 5);
        assert_eq!(policy.min_notice_days, 7);
        assert!(policy.requires_approval);
        assert_eq!(policy.accrual_frequency, AccrualFrequency::Yearly);
    }
}
