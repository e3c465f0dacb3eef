use std::collections::HashMap;

use sqlx::PgPool;

use crate::config::CacheConfig;

pub mod churches;
pub mod events;
pub mod finances;
pub mod groups;
pub mod members;

pub use churches::{ChurchAccessor, ChurchPatch, NewChurch};
pub use events::{EventAccessor, EventPatch, NewEvent};
pub use finances::{FinanceAccessor, FinancePatch, NewFinance};
pub use groups::{GroupAccessor, GroupPatch, NewGroup};
pub use members::{MemberAccessor, MemberPatch, NewMember};

/// Field-level validation failures, keyed by field name. Collected before
/// any payload touches storage.
pub type FieldErrors = HashMap<String, String>;

pub(crate) fn require(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "Campo obrigatório".to_string());
    }
}

pub(crate) fn require_one_of(errors: &mut FieldErrors, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        errors.insert(
            field.to_string(),
            format!("Valor inválido; esperado um de: {}", allowed.join(", ")),
        );
    }
}

/// One accessor per entity, all sharing the pool and cache sizing.
pub struct Accessors {
    pub members: MemberAccessor,
    pub groups: GroupAccessor,
    pub events: EventAccessor,
    pub finances: FinanceAccessor,
    pub churches: ChurchAccessor,
}

impl Accessors {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            members: MemberAccessor::new(pool.clone(), cache),
            groups: GroupAccessor::new(pool.clone(), cache),
            events: EventAccessor::new(pool.clone(), cache),
            finances: FinanceAccessor::new(pool.clone(), cache),
            churches: ChurchAccessor::new(pool, cache),
        }
    }
}
