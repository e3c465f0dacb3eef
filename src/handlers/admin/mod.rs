pub mod dashboard;
pub mod events;
pub mod finances;
pub mod groups;
pub mod members;

pub use dashboard::dashboard;

use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::accessors::FieldErrors;
use crate::services::tenancy::TenantScope;

/// Resolve the church a mutation writes into. Tenant-scoped callers always
/// write into their own church and may not name another one; master callers
/// must name one explicitly; unassigned callers may not mutate at all.
pub(crate) fn effective_church(
    user: &CurrentUser,
    explicit: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    match user.scope {
        TenantScope::Church(id) => match explicit {
            Some(other) if other != id => Err(ApiError::forbidden(
                "Cannot write outside your own church",
            )),
            _ => Ok(id),
        },
        TenantScope::All => explicit.ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.insert(
                "church_id".to_string(),
                "Obrigatório para operações master".to_string(),
            );
            ApiError::validation_error("Dados inválidos", Some(errors))
        }),
        TenantScope::Unassigned => Err(ApiError::forbidden(
            "No church assignment for this user",
        )),
    }
}

/// Reject mutations early for callers with no usable assignment.
pub(crate) fn deny_unassigned(user: &CurrentUser) -> Result<(), ApiError> {
    if user.scope == TenantScope::Unassigned {
        return Err(ApiError::forbidden("No church assignment for this user"));
    }
    Ok(())
}

pub(crate) fn scope_label(scope: &TenantScope) -> &'static str {
    match scope {
        TenantScope::All => "all",
        TenantScope::Church(_) => "church",
        TenantScope::Unassigned => "unassigned",
    }
}

pub(crate) fn reject_invalid(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Dados inválidos", Some(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(scope: TenantScope) -> CurrentUser {
        CurrentUser {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            scope,
        }
    }

    #[test]
    fn tenant_scoped_callers_write_into_their_own_church() {
        let church = Uuid::new_v4();
        let caller = user(TenantScope::Church(church));

        assert_eq!(effective_church(&caller, None).unwrap(), church);
        assert_eq!(effective_church(&caller, Some(church)).unwrap(), church);
    }

    #[test]
    fn naming_a_foreign_church_is_forbidden() {
        let caller = user(TenantScope::Church(Uuid::new_v4()));
        let err = effective_church(&caller, Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn master_must_name_a_church() {
        let caller = user(TenantScope::All);
        let church = Uuid::new_v4();

        assert_eq!(effective_church(&caller, Some(church)).unwrap(), church);
        assert_eq!(effective_church(&caller, None).unwrap_err().status_code(), 400);
    }

    #[test]
    fn unassigned_callers_may_not_mutate() {
        let caller = user(TenantScope::Unassigned);
        assert_eq!(
            effective_church(&caller, Some(Uuid::new_v4()))
                .unwrap_err()
                .status_code(),
            403
        );
        assert!(deny_unassigned(&caller).is_err());
    }
}
