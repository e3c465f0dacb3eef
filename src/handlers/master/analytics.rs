use std::collections::BTreeMap;

use axum::extract::State;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::database::models::Finance;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenancy::TenantScope;
use crate::state::AppState;

/// GET /master/analytics - cross-tenant aggregates: per-church breakdown,
/// ledger totals by kind and a monthly series
pub async fn analytics(State(state): State<AppState>) -> ApiResult<Value> {
    let (churches, finances) = tokio::join!(
        state.accessors.churches.list(),
        state.accessors.finances.list(TenantScope::All),
    );

    let entradas = sum_kind(&finances, "entrada");
    let saidas = sum_kind(&finances, "saida");

    let per_church: Vec<Value> = churches
        .iter()
        .map(|c| {
            json!({
                "church_id": c.id,
                "name": c.name,
                "members_count": c.members_count,
                "total_finance": c.total_finance,
            })
        })
        .collect();

    Ok(ApiResponse::success(json!({
        "churches": per_church,
        "totals": {
            "entradas": entradas,
            "saidas": saidas,
            "saldo": entradas - saidas,
        },
        "monthly": monthly_series(&finances),
    })))
}

fn sum_kind(finances: &[Finance], kind: &str) -> Decimal {
    finances
        .iter()
        .filter(|f| f.kind == kind)
        .fold(Decimal::ZERO, |acc, f| acc + f.amount)
}

/// Ledger entries bucketed by entry date, oldest month first.
fn monthly_series(finances: &[Finance]) -> Vec<Value> {
    let mut months: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();

    for entry in finances {
        let bucket = months
            .entry(entry.date.format("%Y-%m").to_string())
            .or_default();
        if entry.kind == "saida" {
            bucket.1 += entry.amount;
        } else {
            bucket.0 += entry.amount;
        }
    }

    months
        .into_iter()
        .map(|(month, (entradas, saidas))| {
            json!({
                "month": month,
                "entradas": entradas,
                "saidas": saidas,
                "saldo": entradas - saidas,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn entry(kind: &str, amount: i64, date: (i32, u32, u32)) -> Finance {
        Finance {
            id: Uuid::new_v4(),
            church_id: Uuid::new_v4(),
            kind: kind.to_string(),
            category: "Dízimo".to_string(),
            description: String::new(),
            amount: Decimal::new(amount, 2),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn monthly_series_buckets_by_entry_date() {
        let finances = vec![
            entry("entrada", 10_000, (2025, 1, 5)),
            entry("saida", 2_500, (2025, 1, 20)),
            entry("entrada", 7_000, (2025, 3, 1)),
        ];

        let series = monthly_series(&finances);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["month"], "2025-01");
        assert_eq!(series[0]["saldo"], json!(Decimal::new(7_500, 2)));
        assert_eq!(series[1]["month"], "2025-03");
    }

    #[test]
    fn totals_split_by_kind() {
        let finances = vec![
            entry("entrada", 10_000, (2025, 1, 5)),
            entry("saida", 4_000, (2025, 2, 5)),
        ];
        assert_eq!(sum_kind(&finances, "entrada"), Decimal::new(10_000, 2));
        assert_eq!(sum_kind(&finances, "saida"), Decimal::new(4_000, 2));
    }
}
