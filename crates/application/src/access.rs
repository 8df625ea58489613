//! Membership-based authorization gates shared by the services.

use rotaplan_core::{ActorIdentity, AppError, AppResult, OrgId};
use rotaplan_domain::{Membership, MembershipStatus};

use crate::org_service::OrgRepository;

/// Requires an active membership in the organization, any role.
pub(crate) async fn require_member(
    org_repository: &dyn OrgRepository,
    actor: &ActorIdentity,
    org_id: OrgId,
) -> AppResult<Membership> {
    let membership = org_repository
        .find_membership(org_id, actor.subject())
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("you are not a member of this organization".to_owned())
        })?;

    if membership.status != MembershipStatus::Active {
        return Err(AppError::Forbidden(
            "your membership in this organization is not active".to_owned(),
        ));
    }

    Ok(membership)
}

/// Requires an active manager or owner membership in the organization.
pub(crate) async fn require_manager_or_owner(
    org_repository: &dyn OrgRepository,
    actor: &ActorIdentity,
    org_id: OrgId,
) -> AppResult<Membership> {
    let membership = require_member(org_repository, actor, org_id).await?;

    if !membership.role.can_manage() {
        return Err(AppError::Forbidden(
            "this operation requires a manager or owner role".to_owned(),
        ));
    }

    Ok(membership)
}
