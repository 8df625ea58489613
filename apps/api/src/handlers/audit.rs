use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use rotaplan_application::AuditLogQuery;
use rotaplan_core::{ActorIdentity, OrgId};
use uuid::Uuid;

use crate::dto::{AuditLogParams, AuditLogResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_log(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(org_id): Path<Uuid>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<AuditLogResponse>> {
    let entries = state
        .audit_log_service
        .list_entries(
            &actor,
            OrgId::from_uuid(org_id),
            AuditLogQuery {
                action: params.action,
                actor_user_id: params.actor,
                limit: params.limit.unwrap_or(50),
                offset: params.offset.unwrap_or(0),
            },
        )
        .await?;

    Ok(Json(AuditLogResponse {
        success: true,
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}
