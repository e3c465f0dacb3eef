use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::RoleAssignment;

/// Effective data-isolation scope for a caller.
///
/// `All` is the master sentinel, not a real tenant id. `Unassigned` is the
/// explicit state for users with no usable role assignment; such callers see
/// empty collections and may not mutate anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantScope {
    All,
    Church(Uuid),
    Unassigned,
}

impl TenantScope {
    pub fn is_master(&self) -> bool {
        matches!(self, TenantScope::All)
    }

    /// The concrete tenant filter to bind into queries: `None` means
    /// unfiltered (master), which is why `Unassigned` must be short-circuited
    /// before this is consulted.
    pub fn church_id(&self) -> Option<Uuid> {
        match self {
            TenantScope::Church(id) => Some(*id),
            _ => None,
        }
    }
}

/// Scope selection from a user's role assignments: any master assignment wins;
/// otherwise the first assignment carrying a non-null church id; otherwise the
/// caller is explicitly unassigned.
pub fn pick_scope(assignments: &[RoleAssignment]) -> TenantScope {
    if assignments.iter().any(|a| a.is_master()) {
        return TenantScope::All;
    }
    assignments
        .iter()
        .find_map(|a| a.church_id)
        .map(TenantScope::Church)
        .unwrap_or(TenantScope::Unassigned)
}

/// Load the caller's role assignments and resolve the effective scope.
pub async fn resolve_scope(pool: &PgPool, user_id: Uuid) -> Result<TenantScope, sqlx::Error> {
    let assignments = sqlx::query_as::<_, RoleAssignment>(
        "SELECT id, user_id, church_id, role, created_at
         FROM user_roles
         WHERE user_id = $1
         ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(pick_scope(&assignments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assignment(church_id: Option<Uuid>, role: &str) -> RoleAssignment {
        RoleAssignment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            church_id,
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn master_assignment_scopes_to_all_tenants() {
        let church = Uuid::new_v4();
        let assignments = vec![
            assignment(Some(church), "admin"),
            assignment(None, "master"),
        ];
        assert_eq!(pick_scope(&assignments), TenantScope::All);
    }

    #[test]
    fn first_church_assignment_wins_for_ordinary_users() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let assignments = vec![
            assignment(None, "member"),
            assignment(Some(first), "admin"),
            assignment(Some(second), "leader"),
        ];
        assert_eq!(pick_scope(&assignments), TenantScope::Church(first));
    }

    #[test]
    fn no_usable_assignment_is_explicitly_unassigned() {
        assert_eq!(pick_scope(&[]), TenantScope::Unassigned);
        let assignments = vec![assignment(None, "member")];
        assert_eq!(pick_scope(&assignments), TenantScope::Unassigned);
    }

    #[test]
    fn scope_filters() {
        let id = Uuid::new_v4();
        assert_eq!(TenantScope::Church(id).church_id(), Some(id));
        assert_eq!(TenantScope::All.church_id(), None);
        assert!(TenantScope::All.is_master());
        assert!(!TenantScope::Unassigned.is_master());
    }
}
