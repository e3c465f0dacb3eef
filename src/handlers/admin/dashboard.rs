use axum::extract::State;
use axum::Extension;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::tenancy::TenantScope;
use crate::state::AppState;

use super::scope_label;

/// GET /admin - tenant dashboard: entity counts and the ledger balance for
/// the caller's scope
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Value> {
    if user.scope == TenantScope::Unassigned {
        return Ok(ApiResponse::success(json!({
            "scope": "unassigned",
            "message": "Nenhuma igreja atribuída a este usuário.",
            "members_count": 0,
            "groups_count": 0,
            "events_count": 0,
            "finance": { "entradas": 0, "saidas": 0, "saldo": 0 },
        })));
    }

    let accessors = &state.accessors;
    let (members, groups, events, finances) = tokio::join!(
        accessors.members.list(user.scope),
        accessors.groups.list(user.scope),
        accessors.events.list(user.scope),
        accessors.finances.list(user.scope),
    );

    let entradas = finances
        .iter()
        .filter(|f| f.kind == "entrada")
        .fold(Decimal::ZERO, |acc, f| acc + f.amount);
    let saidas = finances
        .iter()
        .filter(|f| f.kind == "saida")
        .fold(Decimal::ZERO, |acc, f| acc + f.amount);

    Ok(ApiResponse::success(json!({
        "scope": scope_label(&user.scope),
        "church_id": user.scope.church_id(),
        "members_count": members.len(),
        "groups_count": groups.len(),
        "events_count": events.len(),
        "finance": {
            "entradas": entradas,
            "saidas": saidas,
            "saldo": entradas - saidas,
        },
    })))
}
