//! Membership: the (user, org, role, status) relation granting access.

use std::str::FromStr;

use rotaplan_core::{AppError, OrgId};
use serde::{Deserialize, Serialize};

use crate::employee::EmployeeId;

/// Access role of a member within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Created the organization; full control.
    Owner,
    /// Manages schedules, invites, and leave decisions.
    Manager,
    /// Regular staff member.
    Employee,
}

impl MemberRole {
    /// Returns the storage string for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Whether this role may perform management operations
    /// (schedule creation, invitations, leave decisions).
    #[must_use]
    pub fn can_manage(&self) -> bool {
        matches!(self, Self::Owner | Self::Manager)
    }
}

impl FromStr for MemberRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            _ => Err(AppError::Validation(format!(
                "unknown member role '{value}'"
            ))),
        }
    }
}

/// Lifecycle state of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Member has full access.
    Active,
    /// Invitation sent, not yet redeemed.
    Invited,
    /// Access revoked without deleting history.
    Disabled,
}

impl MembershipStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Invited => "invited",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "invited" => Ok(Self::Invited),
            "disabled" => Ok(Self::Disabled),
            _ => Err(AppError::Validation(format!(
                "unknown membership status '{value}'"
            ))),
        }
    }
}

/// A user's membership in an organization. At most one per (org, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Subject of the member.
    pub user_id: String,
    /// Organization the membership belongs to.
    pub org_id: OrgId,
    /// Access role.
    pub role: MemberRole,
    /// Lifecycle state.
    pub status: MembershipStatus,
    /// Employee profile linked to this member, if any.
    pub linked_employee_id: Option<EmployeeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_and_managers_can_manage() {
        assert!(MemberRole::Owner.can_manage());
        assert!(MemberRole::Manager.can_manage());
        assert!(!MemberRole::Employee.can_manage());
    }

    #[test]
    fn role_round_trips_through_storage_string() {
        for role in [MemberRole::Owner, MemberRole::Manager, MemberRole::Employee] {
            assert_eq!(role.as_str().parse::<MemberRole>().ok(), Some(role));
        }
    }
}
