use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{Church, ChurchOverview};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accessors::{ChurchPatch, NewChurch};
use crate::state::AppState;

use crate::handlers::admin::reject_invalid;

/// GET /master/churches - all tenants, name ascending, with best-effort
/// members_count / total_finance
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let churches = state.accessors.churches.list().await;
    Ok(ApiResponse::success(json!({ "churches": &*churches })))
}

/// POST /master/churches
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewChurch>,
) -> ApiResult<Church> {
    reject_invalid(payload.validate())?;

    let church = state.accessors.churches.create(payload).await?;
    Ok(ApiResponse::created(church))
}

/// GET /master/churches/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<ChurchOverview> {
    let church = state.accessors.churches.get(id).await?;
    Ok(ApiResponse::success(church))
}

/// PATCH /master/churches/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ChurchPatch>,
) -> ApiResult<Church> {
    let church = state.accessors.churches.update(id, patch).await?;
    Ok(ApiResponse::success(church))
}

/// DELETE /master/churches/:id - removes the tenant and everything it owns
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    state.accessors.churches.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
