//! User roles and the permissions they grant

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles. Everyone but `Client` is clinic staff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Veterinarian,
    Receptionist,
    Client,
}

/// Resources that can be accessed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Purchase,
    Product,
    Supplier,
    Owner,
    Pet,
    Appointment,
    User,
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

/// Identity carried by a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub permissions: Vec<String>,
    pub login_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Veterinarian => "veterinarian",
            UserRole::Receptionist => "receptionist",
            UserRole::Client => "client",
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, UserRole::Client)
    }

    /// `resource:action` strings granted to this role
    pub fn permissions(&self) -> Vec<String> {
        use Action::*;
        use Resource::*;

        let grants: Vec<(Resource, Vec<Action>)> = match self {
            UserRole::Admin => [Purchase, Product, Supplier, Owner, Pet, Appointment, User]
                .into_iter()
                .map(|r| (r, vec![View, Create, Edit, Delete]))
                .collect(),
            UserRole::Veterinarian => vec![
                (Purchase, vec![View]),
                (Product, vec![View]),
                (Supplier, vec![View]),
                (Owner, vec![View]),
                (Pet, vec![View, Create, Edit]),
                (Appointment, vec![View, Create, Edit]),
            ],
            UserRole::Receptionist => vec![
                (Purchase, vec![View, Create, Delete]),
                (Product, vec![View, Create, Edit]),
                (Supplier, vec![View, Create, Edit]),
                (Owner, vec![View, Create, Edit, Delete]),
                (Pet, vec![View, Create, Edit, Delete]),
                (Appointment, vec![View, Create, Edit, Delete]),
            ],
            // Clients are scoped to their own records by the handlers
            UserRole::Client => vec![
                (Owner, vec![View]),
                (Pet, vec![View]),
                (Appointment, vec![View, Create]),
            ],
        };

        grants
            .into_iter()
            .flat_map(|(resource, actions)| {
                actions
                    .into_iter()
                    .map(move |action| permission_key(resource, action))
            })
            .collect()
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "veterinarian" | "vet" => Ok(UserRole::Veterinarian),
            "receptionist" | "staff" => Ok(UserRole::Receptionist),
            "client" => Ok(UserRole::Client),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Purchase => "purchase",
            Resource::Product => "product",
            Resource::Supplier => "supplier",
            Resource::Owner => "owner",
            Resource::Pet => "pet",
            Resource::Appointment => "appointment",
            Resource::User => "user",
        }
    }
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

/// `resource:action` form used in session permissions
pub fn permission_key(resource: Resource, action: Action) -> String {
    format!("{}:{}", resource.as_str(), action.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        let perms = UserRole::Admin.permissions();
        assert_eq!(perms.len(), 7 * 4);
        assert!(perms.contains(&"purchase:delete".to_string()));
    }

    #[test]
    fn test_client_cannot_touch_inventory() {
        let perms = UserRole::Client.permissions();
        assert!(!perms.iter().any(|p| p.starts_with("purchase:")));
        assert!(!perms.iter().any(|p| p.starts_with("product:")));
        assert!(perms.contains(&"appointment:create".to_string()));
    }

    #[test]
    fn test_role_round_trip_and_aliases() {
        for role in [
            UserRole::Admin,
            UserRole::Veterinarian,
            UserRole::Receptionist,
            UserRole::Client,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!("vet".parse::<UserRole>().unwrap(), UserRole::Veterinarian);
        assert!("owner".parse::<UserRole>().is_err());
    }
}
