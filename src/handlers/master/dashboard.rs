use axum::extract::State;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenancy::TenantScope;
use crate::state::AppState;

/// GET /master - cross-tenant dashboard: every church with its best-effort
/// aggregates, plus fleet-wide totals
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Value> {
    let churches = state.accessors.churches.list().await;
    let events = state.accessors.events.list(TenantScope::All).await;

    let members_total: i64 = churches.iter().map(|c| c.members_count).sum();
    let finance_total = churches
        .iter()
        .fold(Decimal::ZERO, |acc, c| acc + c.total_finance);

    Ok(ApiResponse::success(json!({
        "churches": &*churches,
        "totals": {
            "churches": churches.len(),
            "members": members_total,
            "events": events.len(),
            "finance": finance_total,
        },
    })))
}
