use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User record in the database. Serialized as-is by `auth.me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub open_id: String, // provider-issued, unique
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_signed_in: OffsetDateTime,
}

/// Values written on sign-in. `None` fields keep what the row already has.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
    pub last_signed_in: OffsetDateTime,
}

impl UpsertUser {
    pub fn sign_in(open_id: impl Into<String>, at: OffsetDateTime) -> Self {
        Self {
            open_id: open_id.into(),
            name: None,
            email: None,
            login_method: None,
            role: None,
            last_signed_in: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn user_serializes_camel_case() {
        let at = datetime!(2025-01-02 03:04:05 UTC);
        let user = User {
            id: 7,
            open_id: "oid-7".into(),
            name: Some("Ada".into()),
            email: None,
            login_method: Some("github".into()),
            role: Role::Admin,
            created_at: at,
            updated_at: at,
            last_signed_in: at,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["openId"], "oid-7");
        assert_eq!(json["loginMethod"], "github");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["lastSignedIn"], "2025-01-02T03:04:05Z");
        assert!(json["email"].is_null());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
