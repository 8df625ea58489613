//! Org invitations: hashed single-use tokens with a fixed expiry window.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rotaplan_core::{AppError, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::employee::EmployeeId;
use crate::membership::MemberRole;

/// Days before a pending invite expires.
pub const INVITE_TTL_DAYS: i64 = 7;

/// Unique identifier for an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InviteId(Uuid);

impl InviteId {
    /// Creates a new random invite identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an invite identifier from an existing UUID value.
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

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of an invite. `pending -> used` on redemption;
/// `pending -> expired` is applied lazily on the first read past the
/// expiry timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Waiting to be redeemed.
    Pending,
    /// Redeemed into a membership.
    Used,
    /// Passed its expiry timestamp unredeemed.
    Expired,
    /// Withdrawn by a manager.
    Canceled,
}

impl InviteStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for InviteStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            "canceled" => Ok(Self::Canceled),
            _ => Err(AppError::Validation(format!(
                "unknown invite status '{value}'"
            ))),
        }
    }
}

/// An invitation into an organization, redeemed into a membership.
///
/// The raw token is returned to the caller exactly once at creation;
/// only its SHA-256 hash is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Unique invite identifier.
    pub id: InviteId,
    /// Target organization.
    pub org_id: OrgId,
    /// Invited address, lowercased.
    pub email: String,
    /// Membership role granted on redemption.
    pub target_role: MemberRole,
    /// Employee profile to link on redemption, if any.
    pub employee_id: Option<EmployeeId>,
    /// Subject of the inviting user.
    pub created_by: String,
    /// SHA-256 hash of the single-use token.
    pub token_hash: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: InviteStatus,
}

impl Invite {
    /// Whether the invite has passed its expiry timestamp.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Normalizes and structurally validates an email address.
///
/// Lowercases and trims, then checks for exactly one `@` with a non-empty
/// local part and a dotted domain.
pub fn normalize_email(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim().to_lowercase();

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(AppError::Validation(
            "email address must contain exactly one '@'".to_owned(),
        ));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(AppError::Validation(format!(
            "'{value}' is not a valid email address"
        )));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn invite(expires_at: DateTime<Utc>) -> Invite {
        Invite {
            id: InviteId::new(),
            org_id: OrgId::new(),
            email: "staff@example.com".to_owned(),
            target_role: MemberRole::Employee,
            employee_id: None,
            created_by: "user-1".to_owned(),
            token_hash: "deadbeef".to_owned(),
            expires_at,
            status: InviteStatus::Pending,
        }
    }

    #[test]
    fn expiry_is_a_strict_cutoff() {
        let now = Utc::now();
        assert!(invite(now - Duration::seconds(1)).is_expired(now));
        assert!(!invite(now + Duration::days(INVITE_TTL_DAYS)).is_expired(now));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email(" Staff@Example.COM ").ok().as_deref(),
            Some("staff@example.com")
        );
        assert!(normalize_email("noatsign").is_err());
        assert!(normalize_email("user@nodot").is_err());
        assert!(normalize_email("a@b@c.com").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn status_round_trips() {
        for status in [
            InviteStatus::Pending,
            InviteStatus::Used,
            InviteStatus::Expired,
            InviteStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<InviteStatus>().ok(), Some(status));
        }
    }
}
