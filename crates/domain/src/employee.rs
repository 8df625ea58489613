//! Employee profiles: contract, role links, and recurring unavailability.

use std::str::FromStr;

use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::staff_role::RoleId;

/// Unique identifier for an employee profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    /// Creates a new random employee identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an employee identifier from an existing UUID value.
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

impl Default for EmployeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Employment contract category (French labor-law vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Permanent contract.
    Cdi,
    /// Fixed-term contract.
    Cdd,
    /// On-call extra.
    Extra,
    /// Temp agency contract.
    Interim,
    /// Internship.
    Stage,
}

impl ContractType {
    /// Returns the storage string for this contract type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdi => "cdi",
            Self::Cdd => "cdd",
            Self::Extra => "extra",
            Self::Interim => "interim",
            Self::Stage => "stage",
        }
    }
}

impl FromStr for ContractType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cdi" => Ok(Self::Cdi),
            "cdd" => Ok(Self::Cdd),
            "extra" => Ok(Self::Extra),
            "interim" => Ok(Self::Interim),
            "stage" => Ok(Self::Stage),
            _ => Err(AppError::Validation(format!(
                "unknown contract type '{value}'"
            ))),
        }
    }
}

/// A recurring weekday (or weekday segment) an employee cannot work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailability {
    /// Weekday index, 0 (Sunday) through 6 (Saturday).
    pub day: u8,
    /// Segment name; `None` blocks the whole day.
    pub segment_name: Option<String>,
    /// Optional free-text reason.
    pub reason: Option<String>,
}

/// An employee profile within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: EmployeeId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Staff roles this employee can fill.
    pub roles: Vec<RoleId>,
    /// Contract category.
    pub contract_type: ContractType,
    /// Recurring unavailabilities.
    pub unavailabilities: Vec<Unavailability>,
    /// Identity-provider subject of the linked user account, if any.
    /// Leave submission requires the acting user to match this link.
    pub linked_user_id: Option<String>,
}

impl Employee {
    /// Validates the name fields of an employee payload.
    pub fn validate_names(first_name: &str, last_name: &str) -> AppResult<()> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(AppError::Validation(
                "employee first and last name must not be empty".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns the display name used in notifications.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert!(Employee::validate_names("", "Martin").is_err());
        assert!(Employee::validate_names("Jules", " ").is_err());
        assert!(Employee::validate_names("Jules", "Martin").is_ok());
    }

    #[test]
    fn contract_type_round_trips() {
        for contract in [
            ContractType::Cdi,
            ContractType::Cdd,
            ContractType::Extra,
            ContractType::Interim,
            ContractType::Stage,
        ] {
            assert_eq!(contract.as_str().parse::<ContractType>().ok(), Some(contract));
        }
    }
}
