//! Invitations: issuing hashed single-use tokens and redeeming them into
//! memberships.
//!
//! The raw token leaves the system exactly once, in the creation response
//! and the queued invitation email. Redemption looks the invite up by the
//! SHA-256 hash of the presented token, so a leaked database never yields
//! redeemable tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{
    INVITE_TTL_DAYS, Invite, InviteId, InviteStatus, MemberRole, Membership, MembershipStatus,
    normalize_email,
};

use crate::access::require_manager_or_owner;
use crate::audit::AuditEntry;
use crate::notification::{NewNotification, NotificationTemplate};
use crate::org_service::OrgRepository;

/// Random bytes drawn per invite token.
const TOKEN_BYTES: usize = 32;

/// Generates a raw invite token: 32 random bytes, hex-encoded.
fn generate_token() -> AppResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("random generator failed: {error}")))?;

    Ok(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
}

/// Hashes a raw token for storage and lookup.
#[must_use]
fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for invites.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Persists a new invite together with its audit entry and the queued
    /// invitation email, atomically.
    async fn create_invite(
        &self,
        invite: Invite,
        audit: AuditEntry,
        notification: NewNotification,
    ) -> AppResult<()>;

    /// Finds an invite by the hash of its token.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invite>>;

    /// Marks an invite as expired. Applied lazily on the first read past
    /// the expiry timestamp.
    async fn mark_expired(&self, invite_id: InviteId) -> AppResult<()>;

    /// Redeems an invite: marks it used, creates the membership, links the
    /// employee profile when one is referenced, and writes the audit entry,
    /// all atomically.
    ///
    /// Fails with `Conflict` when the user already holds a membership in
    /// the organization.
    async fn redeem(
        &self,
        invite_id: InviteId,
        membership: Membership,
        audit: AuditEntry,
    ) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Parameters for issuing an invite.
#[derive(Debug, Clone)]
pub struct InviteUserInput {
    /// Address to invite.
    pub email: String,
    /// Membership role granted on redemption; defaults to employee.
    pub target_role: Option<MemberRole>,
    /// Employee profile to link on redemption.
    pub employee_id: Option<rotaplan_domain::EmployeeId>,
}

/// Result of issuing an invite. `token` is the only copy of the raw token
/// the caller will ever see.
#[derive(Debug, Clone)]
pub struct IssuedInvite {
    /// The new invite's identifier.
    pub invite_id: InviteId,
    /// The raw single-use token.
    pub token: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Result of redeeming an invite.
#[derive(Debug, Clone)]
pub struct RedeemedInvite {
    /// Organization joined.
    pub org_id: OrgId,
    /// Membership role granted.
    pub role: MemberRole,
    /// Employee profile linked, if any.
    pub employee_id: Option<rotaplan_domain::EmployeeId>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for issuing and redeeming invites.
#[derive(Clone)]
pub struct InviteService {
    invite_repository: Arc<dyn InviteRepository>,
    org_repository: Arc<dyn OrgRepository>,
}

impl InviteService {
    /// Creates a new invite service.
    #[must_use]
    pub fn new(
        invite_repository: Arc<dyn InviteRepository>,
        org_repository: Arc<dyn OrgRepository>,
    ) -> Self {
        Self {
            invite_repository,
            org_repository,
        }
    }

    /// Issues an invite into an organization. Requires a manager or owner
    /// membership.
    pub async fn invite_user(
        &self,
        actor: &ActorIdentity,
        org_id: OrgId,
        input: InviteUserInput,
    ) -> AppResult<IssuedInvite> {
        require_manager_or_owner(self.org_repository.as_ref(), actor, org_id).await?;

        let email = normalize_email(&input.email)?;
        let target_role = input.target_role.unwrap_or(MemberRole::Employee);

        if let Some(employee_id) = input.employee_id {
            self.org_repository
                .find_employee(org_id, employee_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("employee '{employee_id}' not found"))
                })?;
        }

        let token = generate_token()?;
        let invite = Invite {
            id: InviteId::new(),
            org_id,
            email: email.clone(),
            target_role,
            employee_id: input.employee_id,
            created_by: actor.subject().to_owned(),
            token_hash: hash_token(&token),
            expires_at: Utc::now() + Duration::days(INVITE_TTL_DAYS),
            status: InviteStatus::Pending,
        };

        let audit = AuditEntry {
            org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "invite.create".to_owned(),
            entity_ref: format!("invites/{}", invite.id),
            metadata: serde_json::json!({
                "email": email,
                "target_role": target_role.as_str(),
            }),
        };

        let notification = NewNotification {
            org_id,
            to: email,
            template: NotificationTemplate::Invite,
            payload: serde_json::json!({
                "token": token,
                "expires_at": invite.expires_at.to_rfc3339(),
            }),
        };

        let invite_id = invite.id;
        let expires_at = invite.expires_at;
        self.invite_repository
            .create_invite(invite, audit, notification)
            .await?;

        Ok(IssuedInvite {
            invite_id,
            token,
            expires_at,
        })
    }

    /// Redeems an invite token into a membership for the acting user.
    ///
    /// When the acting user carries a verified email it must match the
    /// invited address; identities without an email (phone-only sign-ins)
    /// redeem on token possession alone. An invite past its expiry is
    /// marked expired on this read and the redemption fails with
    /// `FailedPrecondition`.
    pub async fn redeem_invite(
        &self,
        actor: &ActorIdentity,
        token: &str,
    ) -> AppResult<RedeemedInvite> {
        let invite = self
            .invite_repository
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::NotFound("invite not found".to_owned()))?;

        if invite.status != InviteStatus::Pending {
            return Err(AppError::FailedPrecondition(format!(
                "invite is {}",
                invite.status.as_str()
            )));
        }

        if invite.is_expired(Utc::now()) {
            self.invite_repository.mark_expired(invite.id).await?;
            return Err(AppError::FailedPrecondition(
                "invite has expired".to_owned(),
            ));
        }

        if let Some(email) = actor.email() {
            if normalize_email(email)? != invite.email {
                return Err(AppError::Forbidden(
                    "this invite was issued to a different email address".to_owned(),
                ));
            }
        }

        let membership = Membership {
            user_id: actor.subject().to_owned(),
            org_id: invite.org_id,
            role: invite.target_role,
            status: MembershipStatus::Active,
            linked_employee_id: invite.employee_id,
        };

        let audit = AuditEntry {
            org_id: invite.org_id,
            actor_user_id: actor.subject().to_owned(),
            action: "invite.redeem".to_owned(),
            entity_ref: format!("invites/{}", invite.id),
            metadata: serde_json::json!({
                "role": invite.target_role.as_str(),
            }),
        };

        self.invite_repository
            .redeem(invite.id, membership, audit)
            .await?;

        Ok(RedeemedInvite {
            org_id: invite.org_id,
            role: invite.target_role,
            employee_id: invite.employee_id,
        })
    }
}

#[cfg(test)]
mod tests;
