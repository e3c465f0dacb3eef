use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Event;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::accessors::{EventPatch, NewEvent};
use crate::state::AppState;

use super::{deny_unassigned, effective_church, reject_invalid};

/// GET /admin/events
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let events = state.accessors.events.list(user.scope).await;
    Ok(ApiResponse::success(json!({ "events": &*events })))
}

/// POST /admin/events
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewEvent>,
) -> ApiResult<Event> {
    reject_invalid(payload.validate())?;
    let church_id = effective_church(&user, payload.church_id)?;

    let event = state.accessors.events.create(church_id, payload).await?;
    Ok(ApiResponse::created(event))
}

/// PATCH /admin/events/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> ApiResult<Event> {
    deny_unassigned(&user)?;

    let event = state.accessors.events.update(user.scope, id, patch).await?;
    Ok(ApiResponse::success(event))
}

/// DELETE /admin/events/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    deny_unassigned(&user)?;

    state.accessors.events.delete(user.scope, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
