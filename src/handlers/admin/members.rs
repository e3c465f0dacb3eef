use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Member;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::accessors::{MemberPatch, NewMember};
use crate::state::AppState;

use super::{deny_unassigned, effective_church, reject_invalid};

/// GET /admin/members - tenant roster, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let members = state.accessors.members.list(user.scope).await;
    Ok(ApiResponse::success(json!({ "members": &*members })))
}

/// POST /admin/members
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewMember>,
) -> ApiResult<Member> {
    reject_invalid(payload.validate())?;
    let church_id = effective_church(&user, payload.church_id)?;

    let member = state.accessors.members.create(church_id, payload).await?;
    Ok(ApiResponse::created(member))
}

/// PATCH /admin/members/:id - patches named fields only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MemberPatch>,
) -> ApiResult<Member> {
    deny_unassigned(&user)?;
    reject_invalid(patch.validate())?;

    let member = state.accessors.members.update(user.scope, id, patch).await?;
    Ok(ApiResponse::success(member))
}

/// DELETE /admin/members/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    deny_unassigned(&user)?;

    state.accessors.members.delete(user.scope, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
