use axum::Json;
use axum::extract::{Extension, Path, State};
use rotaplan_core::{ActorIdentity, OrgId};
use uuid::Uuid;

use crate::dto::{
    InviteUserRequest, InviteUserResponse, RedeemInviteRequest, RedeemInviteResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn invite_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<InviteUserRequest>,
) -> ApiResult<Json<InviteUserResponse>> {
    let issued = state
        .invite_service
        .invite_user(&actor, OrgId::from_uuid(org_id), request.into())
        .await?;

    Ok(Json(InviteUserResponse {
        success: true,
        invite_id: issued.invite_id.as_uuid(),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

pub async fn redeem_invite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(request): Json<RedeemInviteRequest>,
) -> ApiResult<Json<RedeemInviteResponse>> {
    let redeemed = state
        .invite_service
        .redeem_invite(&actor, &request.token)
        .await?;

    Ok(Json(RedeemInviteResponse {
        success: true,
        org_id: redeemed.org_id.as_uuid(),
        role: redeemed.role,
        employee_id: redeemed.employee_id.map(|id| id.as_uuid()),
    }))
}
