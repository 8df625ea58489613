use axum::Json;
use axum::extract::{Extension, State};
use rotaplan_core::ActorIdentity;

use crate::dto::{CreateOrgRequest, CreateOrgResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_org(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(request): Json<CreateOrgRequest>,
) -> ApiResult<Json<CreateOrgResponse>> {
    let created = state.org_service.create_org(&actor, request.into()).await?;

    Ok(Json(CreateOrgResponse {
        success: true,
        org_id: created.org_id.as_uuid(),
        slug: created.slug,
    }))
}
