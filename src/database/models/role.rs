use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role tags stored in `user_roles.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Admin,
    Leader,
    Collaborator,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Admin => "admin",
            Role::Leader => "leader",
            Role::Collaborator => "collaborator",
            Role::Member => "member",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Role> {
        match tag {
            "master" => Some(Role::Master),
            "admin" => Some(Role::Admin),
            "leader" => Some(Role::Leader),
            "collaborator" => Some(Role::Collaborator),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Binding of a user id to a tenant and a role tag. A null `church_id` with
/// role = master denotes the cross-tenant super-admin.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub church_id: Option<Uuid>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl RoleAssignment {
    pub fn role(&self) -> Option<Role> {
        Role::from_tag(&self.role)
    }

    pub fn is_master(&self) -> bool {
        self.role == "master"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_round_trip() {
        for role in [
            Role::Master,
            Role::Admin,
            Role::Leader,
            Role::Collaborator,
            Role::Member,
        ] {
            assert_eq!(Role::from_tag(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_tag("owner"), None);
    }
}
