//! Organization aggregate: industry, operating calendar, and slug rules.
//!
//! The operating calendar (`OpenDay` / `TimeSegment`) drives schedule
//! expansion: a `ScheduleDay` is only ever produced for weekdays marked open.

use std::str::FromStr;

use rotaplan_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};

use crate::staff_role::StaffRoleSpec;

/// Maximum organization name length accepted at creation.
pub const ORG_NAME_MAX_LENGTH: usize = 100;

/// Business sector of an organization. Drives the default operating
/// calendar and staff role list when a new org supplies neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    /// Restaurants and food service.
    Restaurant,
    /// Retail stores.
    Retail,
    /// Care facilities with continuous coverage.
    Healthcare,
    /// Agencies with office hours.
    Agency,
    /// Event staffing.
    Events,
    /// Anything else.
    Other,
}

impl Industry {
    /// Returns the storage string for this industry.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Retail => "retail",
            Self::Healthcare => "healthcare",
            Self::Agency => "agency",
            Self::Events => "events",
            Self::Other => "other",
        }
    }
}

impl FromStr for Industry {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "restaurant" => Ok(Self::Restaurant),
            "retail" => Ok(Self::Retail),
            "healthcare" => Ok(Self::Healthcare),
            "agency" => Ok(Self::Agency),
            "events" => Ok(Self::Events),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!("unknown industry '{value}'"))),
        }
    }
}

/// Validates an `HH:mm` time-of-day string.
pub fn validate_time_of_day(value: &str) -> AppResult<()> {
    let parts: Vec<&str> = value.split(':').collect();
    let valid = parts.len() == 2
        && parts[0].len() == 2
        && parts[1].len() == 2
        && parts[0].parse::<u8>().is_ok_and(|hours| hours < 24)
        && parts[1].parse::<u8>().is_ok_and(|minutes| minutes < 60);

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'{value}' is not a valid HH:mm time"
        )))
    }
}

/// A named time window within an operating day, e.g. "Midi" 11:30-15:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSegment {
    /// Segment name, unique within a day.
    pub name: String,
    /// Opening time, `HH:mm`.
    pub start: String,
    /// Closing time, `HH:mm`. May be earlier than `start` for overnight
    /// segments (healthcare night shifts).
    pub end: String,
}

impl TimeSegment {
    /// Creates a validated time segment.
    pub fn new(
        name: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "segment name must not be empty".to_owned(),
            ));
        }

        let start = start.into();
        let end = end.into();
        validate_time_of_day(&start)?;
        validate_time_of_day(&end)?;

        Ok(Self { name, start, end })
    }
}

/// Operating configuration for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDay {
    /// Weekday index, 0 (Sunday) through 6 (Saturday).
    pub day: u8,
    /// Whether the organization operates on this weekday.
    pub is_open: bool,
    /// Time segments staffed on this weekday.
    pub segments: Vec<TimeSegment>,
}

impl OpenDay {
    /// Creates a validated open-day entry.
    pub fn new(day: u8, is_open: bool, segments: Vec<TimeSegment>) -> AppResult<Self> {
        if day > 6 {
            return Err(AppError::Validation(format!(
                "weekday index must be 0-6, got {day}"
            )));
        }

        Ok(Self {
            day,
            is_open,
            segments,
        })
    }
}

/// Org-wide scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSettings {
    /// First weekday of the planning week, 0 (Sunday) or 1 (Monday).
    pub week_starts_on: u8,
    /// Operating configuration per weekday.
    pub open_days: Vec<OpenDay>,
    /// Public-holiday region code, e.g. `FR`.
    pub holidays_region: Option<String>,
}

impl OrgSettings {
    /// Returns the open-day entry for a weekday index, if configured.
    #[must_use]
    pub fn open_day(&self, weekday: u8) -> Option<&OpenDay> {
        self.open_days.iter().find(|entry| entry.day == weekday)
    }
}

/// A tenant: the top-level scope for all other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: OrgId,
    /// Display name.
    pub name: String,
    /// Globally unique URL-safe identifier.
    pub slug: String,
    /// IANA timezone name, e.g. `Europe/Paris`.
    pub timezone: String,
    /// BCP 47 locale, e.g. `fr-FR`.
    pub locale: String,
    /// Business sector.
    pub industry: Industry,
    /// Subject of the user who created the organization.
    pub owner_user_id: String,
    /// Scheduling settings.
    pub settings: OrgSettings,
}

/// Validates an organization display name (1-100 characters).
pub fn validate_org_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "organization name must not be empty".to_owned(),
        ));
    }

    if name.chars().count() > ORG_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "organization name must not exceed {ORG_NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Normalizes free text into a URL-safe slug.
///
/// Lowercases, strips diacritics from Latin-1 letters, collapses every
/// non-alphanumeric run into a single hyphen, and trims hyphens at both ends.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut previous_was_hyphen = true;

    for character in text.chars() {
        let folded = fold_diacritic(character);
        for lowered in folded.to_lowercase() {
            if lowered.is_ascii_alphanumeric() {
                slug.push(lowered);
                previous_was_hyphen = false;
            } else if !previous_was_hyphen {
                slug.push('-');
                previous_was_hyphen = true;
            }
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Maps accented Latin letters onto their ASCII base letter.
fn fold_diacritic(character: char) -> char {
    match character {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        'ý' | 'ÿ' | 'Ý' => 'y',
        other => other,
    }
}

/// Default staff roles for a new organization in the given industry.
#[must_use]
pub fn default_staff_roles(industry: Industry) -> Vec<StaffRoleSpec> {
    match industry {
        Industry::Restaurant => vec![
            StaffRoleSpec::new("Serveur", "#3b82f6", Some(1)),
            StaffRoleSpec::new("Chef", "#ef4444", Some(3)),
            StaffRoleSpec::new("Commis", "#8b5cf6", Some(1)),
            StaffRoleSpec::new("Manager", "#10b981", Some(4)),
        ],
        Industry::Retail => vec![
            StaffRoleSpec::new("Vendeur", "#3b82f6", Some(1)),
            StaffRoleSpec::new("Caissier", "#8b5cf6", Some(1)),
            StaffRoleSpec::new("Manager", "#10b981", Some(3)),
        ],
        Industry::Healthcare => vec![
            StaffRoleSpec::new("Infirmier", "#3b82f6", Some(2)),
            StaffRoleSpec::new("Aide-soignant", "#8b5cf6", Some(1)),
            StaffRoleSpec::new("Médecin", "#ef4444", Some(4)),
        ],
        Industry::Agency | Industry::Events | Industry::Other => vec![
            StaffRoleSpec::new("Employé", "#3b82f6", Some(1)),
            StaffRoleSpec::new("Manager", "#10b981", Some(2)),
        ],
    }
}

/// Default time segments for the given industry.
#[must_use]
pub fn default_segments(industry: Industry) -> Vec<TimeSegment> {
    let windows: &[(&str, &str, &str)] = match industry {
        Industry::Restaurant => &[("Midi", "11:30", "15:00"), ("Soir", "18:30", "23:00")],
        Industry::Retail => &[("Matin", "09:00", "13:00"), ("Après-midi", "13:00", "18:00")],
        Industry::Healthcare => &[
            ("Matin", "06:00", "14:00"),
            ("Après-midi", "14:00", "22:00"),
            ("Nuit", "22:00", "06:00"),
        ],
        Industry::Agency | Industry::Events | Industry::Other => {
            &[("Journée", "09:00", "17:00")]
        }
    };

    windows
        .iter()
        .map(|(name, start, end)| TimeSegment {
            name: (*name).to_owned(),
            start: (*start).to_owned(),
            end: (*end).to_owned(),
        })
        .collect()
}

/// Default weekly operating calendar: Monday through Saturday open,
/// Sunday closed, every open day staffed with the industry segments.
#[must_use]
pub fn default_open_days(industry: Industry) -> Vec<OpenDay> {
    let segments = default_segments(industry);

    let mut open_days: Vec<OpenDay> = (1..=6)
        .map(|day| OpenDay {
            day,
            is_open: true,
            segments: segments.clone(),
        })
        .collect();

    open_days.push(OpenDay {
        day: 0,
        is_open: false,
        segments,
    });

    open_days
}
