//! Reusable staffing-need templates.
//!
//! A template matrix is keyed by weekday (`"0"`-`"6"`, Sunday first) then by
//! segment name, and lists the roles and headcounts a segment should be
//! staffed with. Caller-supplied matrices reference roles by array position;
//! they are resolved against the created-role list before persistence.

use std::collections::BTreeMap;
use std::str::FromStr;

use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::staff_role::RoleId;

/// Unique identifier for a shift template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(Uuid);

impl TemplateId {
    /// Creates a new random template identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a template identifier from an existing UUID value.
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

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Seasonal variant of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// Low season staffing.
    Low,
    /// High season staffing.
    High,
    /// Baseline staffing.
    #[default]
    Normal,
}

impl Season {
    /// Returns the storage string for this season.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::Normal => "normal",
        }
    }
}

impl FromStr for Season {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            _ => Err(AppError::Validation(format!("unknown season '{value}'"))),
        }
    }
}

/// One staffing need: a role and how many people should fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedSlot {
    /// Role to staff.
    pub role: RoleId,
    /// Headcount, at least 1.
    pub count: u32,
}

/// Resolved template matrix: weekday key -> segment name -> needs.
pub type TemplateMatrix = BTreeMap<String, BTreeMap<String, Vec<NeedSlot>>>;

/// A staffing-needs template attached to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    /// Unique template identifier.
    pub id: TemplateId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Template name.
    pub name: String,
    /// Seasonal variant.
    pub season: Season,
    /// Staffing needs per weekday and segment.
    pub matrix: TemplateMatrix,
}

impl ShiftTemplate {
    /// Returns the needs configured for a weekday and segment name, if any.
    #[must_use]
    pub fn needs_for(&self, weekday: u8, segment_name: &str) -> Option<&[NeedSlot]> {
        self.matrix
            .get(&weekday.to_string())
            .and_then(|segments| segments.get(segment_name))
            .map(Vec::as_slice)
    }
}

/// A staffing need referencing a role by its position in the creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedSlotSpec {
    /// Position of the role in the roles array of the same payload.
    pub role_index: usize,
    /// Headcount, at least 1.
    pub count: u32,
}

/// Unresolved matrix as supplied at org creation.
pub type TemplateMatrixSpec = BTreeMap<String, BTreeMap<String, Vec<NeedSlotSpec>>>;

/// Template attributes before role resolution and identifier assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Template name.
    pub name: String,
    /// Seasonal variant; defaults to `normal`.
    pub season: Option<Season>,
    /// Staffing needs keyed by weekday (`"0"`-`"6"`) then segment name.
    pub matrix: TemplateMatrixSpec,
}

impl TemplateSpec {
    /// Validates the structural invariants of the spec: non-empty name,
    /// weekday keys `"0"`-`"6"`, every headcount at least 1.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "template name must not be empty".to_owned(),
            ));
        }

        for (day_key, segments) in &self.matrix {
            let valid_day = day_key.parse::<u8>().is_ok_and(|day| day <= 6);
            if !valid_day {
                return Err(AppError::Validation(format!(
                    "template matrix day key must be \"0\"-\"6\", got \"{day_key}\""
                )));
            }

            for slots in segments.values() {
                for slot in slots {
                    if slot.count == 0 {
                        return Err(AppError::Validation(
                            "template need count must be at least 1".to_owned(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Rewrites a spec matrix against the created-role list.
///
/// Slots whose position falls outside the list are dropped; surviving slots
/// keep their order within each segment.
#[must_use]
pub fn resolve_template_matrix(spec: &TemplateMatrixSpec, role_ids: &[RoleId]) -> TemplateMatrix {
    spec.iter()
        .map(|(day_key, segments)| {
            let resolved_segments = segments
                .iter()
                .map(|(segment_name, slots)| {
                    let resolved_slots = slots
                        .iter()
                        .filter_map(|slot| {
                            role_ids.get(slot.role_index).map(|role| NeedSlot {
                                role: *role,
                                count: slot.count,
                            })
                        })
                        .collect();
                    (segment_name.clone(), resolved_slots)
                })
                .collect();
            (day_key.clone(), resolved_segments)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(day_key: &str, count: u32, role_index: usize) -> TemplateSpec {
        let mut segments = BTreeMap::new();
        segments.insert("Midi".to_owned(), vec![NeedSlotSpec { role_index, count }]);

        let mut matrix = BTreeMap::new();
        matrix.insert(day_key.to_owned(), segments);

        TemplateSpec {
            name: "Semaine type".to_owned(),
            season: None,
            matrix,
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(spec_with("1", 2, 0).validate().is_ok());
    }

    #[test]
    fn day_key_out_of_range_is_rejected() {
        assert!(spec_with("7", 1, 0).validate().is_err());
        assert!(spec_with("monday", 1, 0).validate().is_err());
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(spec_with("1", 0, 0).validate().is_err());
    }

    #[test]
    fn resolution_drops_out_of_range_slots() {
        let role_ids = vec![RoleId::new(), RoleId::new()];
        let spec = spec_with("1", 2, 5);

        let matrix = resolve_template_matrix(&spec.matrix, &role_ids);
        let slots = &matrix["1"]["Midi"];
        assert!(slots.is_empty());
    }

    #[test]
    fn resolution_maps_positions_to_ids() {
        let role_ids = vec![RoleId::new(), RoleId::new()];
        let spec = spec_with("1", 3, 1);

        let matrix = resolve_template_matrix(&spec.matrix, &role_ids);
        let slots = &matrix["1"]["Midi"];
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].role, role_ids[1]);
        assert_eq!(slots[0].count, 3);
    }

    #[test]
    fn needs_lookup_uses_weekday_and_segment_name() {
        let role_ids = vec![RoleId::new()];
        let spec = spec_with("2", 1, 0);
        let template = ShiftTemplate {
            id: TemplateId::new(),
            org_id: rotaplan_core::OrgId::new(),
            name: spec.name.clone(),
            season: Season::Normal,
            matrix: resolve_template_matrix(&spec.matrix, &role_ids),
        };

        assert!(template.needs_for(2, "Midi").is_some());
        assert!(template.needs_for(2, "Soir").is_none());
        assert!(template.needs_for(3, "Midi").is_none());
    }
}
