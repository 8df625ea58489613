use axum::Json;
use axum::extract::{Extension, Path, State};
use rotaplan_core::{ActorIdentity, OrgId};
use rotaplan_domain::LeaveRequestId;
use uuid::Uuid;

use crate::dto::{
    AckResponse, DecideLeaveRequest, DecideLeaveResponse, SubmitLeaveRequest, SubmitLeaveResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn submit_leave(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<SubmitLeaveRequest>,
) -> ApiResult<Json<SubmitLeaveResponse>> {
    let request_id = state
        .leave_service
        .submit_leave(&actor, OrgId::from_uuid(org_id), request.into())
        .await?;

    Ok(Json(SubmitLeaveResponse {
        success: true,
        request_id: request_id.as_uuid(),
    }))
}

pub async fn decide_leave(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path((org_id, request_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<DecideLeaveRequest>,
) -> ApiResult<Json<DecideLeaveResponse>> {
    let status = state
        .leave_service
        .decide_leave(
            &actor,
            OrgId::from_uuid(org_id),
            LeaveRequestId::from_uuid(request_id),
            request.decision,
            request.comment,
        )
        .await?;

    Ok(Json(DecideLeaveResponse {
        success: true,
        status: status.as_str(),
    }))
}

pub async fn cancel_leave(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path((org_id, request_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<AckResponse>> {
    state
        .leave_service
        .cancel_leave(
            &actor,
            OrgId::from_uuid(org_id),
            LeaveRequestId::from_uuid(request_id),
        )
        .await?;

    Ok(Json(AckResponse { success: true }))
}
