//! User domain model and payload shape.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tradepost_core::{Email, ItemId, RoleSet, UserId};

/// A registered account: seller, administrator, or both.
///
/// The password hash deliberately lives outside this struct — repositories
/// return it separately where verification needs it, so a `User` can never be
/// serialized with credential material attached.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: Email,
    pub roles: RoleSet,
    pub favorite_items: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: Email,
    pub roles: RoleSet,
}

/// Wire shape of a user in JSON responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub phone: String,
    pub email: Email,
    pub roles: RoleSet,
    pub favorite_items: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPayload {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.first_name,
            lastname: user.last_name,
            address: user.address,
            phone: user.phone,
            email: user.email,
            roles: user.roles,
            favorite_items: user.favorite_items,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId::generate(),
            first_name: "Amal".to_owned(),
            last_name: "Perera".to_owned(),
            address: None,
            phone: "0712345678".to_owned(),
            email: Email::parse("amal@example.com").unwrap(),
            roles: RoleSet::seller(),
            favorite_items: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_omits_absent_address() {
        let payload = UserPayload::from(sample_user());
        let json = serde_json::to_value(payload).unwrap();
        assert!(json.get("address").is_none());
        assert_eq!(json["firstname"], "Amal");
        assert_eq!(json["roles"][0], "SELLER");
    }

    #[test]
    fn test_payload_never_contains_credentials() {
        let payload = UserPayload::from(sample_user());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("password"));
    }
}
