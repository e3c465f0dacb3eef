use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Finance;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::accessors::{FinancePatch, NewFinance};
use crate::state::AppState;

use super::{deny_unassigned, effective_church, reject_invalid};

/// GET /admin/finances - tenant ledger plus running totals
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let finances = state.accessors.finances.list(user.scope).await;

    let entradas = finances
        .iter()
        .filter(|f| f.kind == "entrada")
        .fold(Decimal::ZERO, |acc, f| acc + f.amount);
    let saidas = finances
        .iter()
        .filter(|f| f.kind == "saida")
        .fold(Decimal::ZERO, |acc, f| acc + f.amount);

    Ok(ApiResponse::success(json!({
        "finances": &*finances,
        "totals": {
            "entradas": entradas,
            "saidas": saidas,
            "saldo": entradas - saidas,
        },
    })))
}

/// POST /admin/finances
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewFinance>,
) -> ApiResult<Finance> {
    reject_invalid(payload.validate())?;
    let church_id = effective_church(&user, payload.church_id)?;

    let entry = state.accessors.finances.create(church_id, payload).await?;
    Ok(ApiResponse::created(entry))
}

/// PATCH /admin/finances/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FinancePatch>,
) -> ApiResult<Finance> {
    deny_unassigned(&user)?;
    reject_invalid(patch.validate())?;

    let entry = state.accessors.finances.update(user.scope, id, patch).await?;
    Ok(ApiResponse::success(entry))
}

/// DELETE /admin/finances/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    deny_unassigned(&user)?;

    state.accessors.finances.delete(user.scope, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
