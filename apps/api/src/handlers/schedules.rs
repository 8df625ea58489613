use axum::Json;
use axum::extract::{Extension, Path, State};
use rotaplan_core::{ActorIdentity, OrgId};
use rotaplan_domain::{ScheduleDayId, ScheduleId};
use uuid::Uuid;

use crate::dto::{
    AckResponse, AssignShiftRequest, CreateScheduleRequest, CreateScheduleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<CreateScheduleRequest>,
) -> ApiResult<Json<CreateScheduleResponse>> {
    let created = state
        .schedule_service
        .create_schedule(&actor, OrgId::from_uuid(org_id), request.into())
        .await?;

    Ok(Json(CreateScheduleResponse {
        success: true,
        schedule_id: created.schedule_id.as_uuid(),
        days_created: created.days_created,
    }))
}

pub async fn assign_shift(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path((org_id, schedule_id, day_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(request): Json<AssignShiftRequest>,
) -> ApiResult<Json<AckResponse>> {
    state
        .schedule_service
        .assign_shift(
            &actor,
            OrgId::from_uuid(org_id),
            ScheduleId::from_uuid(schedule_id),
            ScheduleDayId::from_uuid(day_id),
            request.into(),
        )
        .await?;

    Ok(Json(AckResponse { success: true }))
}
