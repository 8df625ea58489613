//! Staff roles and positional role-index resolution.
//!
//! Org-creation payloads reference roles by array position before role IDs
//! exist. Resolution is two-phase: all roles are materialized first, then
//! dependent entities are rewritten against the position-to-ID mapping.
//! Out-of-range positions are dropped, never an error.

use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role attributes before an identifier is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRoleSpec {
    /// Role name, e.g. "Serveur".
    pub name: String,
    /// Display color as a hex string.
    pub color: String,
    /// Optional hierarchy level.
    pub level: Option<i32>,
}

impl StaffRoleSpec {
    /// Creates a role spec.
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>, level: Option<i32>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            level,
        }
    }

    /// Validates the spec fields.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// A staffing role within an organization, referenced by employees,
/// templates, and shift assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRole {
    /// Unique role identifier.
    pub id: RoleId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Role name.
    pub name: String,
    /// Display color as a hex string.
    pub color: String,
    /// Optional hierarchy level.
    pub level: Option<i32>,
}

impl StaffRole {
    /// Materializes a spec into a role with a fresh identifier.
    #[must_use]
    pub fn from_spec(org_id: OrgId, spec: StaffRoleSpec) -> Self {
        Self {
            id: RoleId::new(),
            org_id,
            name: spec.name,
            color: spec.color,
            level: spec.level,
        }
    }
}

/// Resolves decimal-string positions into role IDs by positional lookup.
///
/// Positions that do not parse or fall outside the created-role list are
/// dropped; surviving IDs keep their original order.
#[must_use]
pub fn resolve_role_positions(positions: &[String], role_ids: &[RoleId]) -> Vec<RoleId> {
    positions
        .iter()
        .filter_map(|position| position.parse::<usize>().ok())
        .filter_map(|index| role_ids.get(index).copied())
        .collect()
}
