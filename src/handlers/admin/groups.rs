use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Group;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::accessors::{GroupPatch, NewGroup};
use crate::state::AppState;

use super::{deny_unassigned, effective_church, reject_invalid};

/// GET /admin/groups - includes best-effort member counts
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let groups = state.accessors.groups.list(user.scope).await;
    Ok(ApiResponse::success(json!({ "groups": &*groups })))
}

/// POST /admin/groups
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewGroup>,
) -> ApiResult<Group> {
    reject_invalid(payload.validate())?;
    let church_id = effective_church(&user, payload.church_id)?;

    let group = state.accessors.groups.create(church_id, payload).await?;
    Ok(ApiResponse::created(group))
}

/// PATCH /admin/groups/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<GroupPatch>,
) -> ApiResult<Group> {
    deny_unassigned(&user)?;

    let group = state.accessors.groups.update(user.scope, id, patch).await?;
    Ok(ApiResponse::success(group))
}

/// DELETE /admin/groups/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    deny_unassigned(&user)?;

    state.accessors.groups.delete(user.scope, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
