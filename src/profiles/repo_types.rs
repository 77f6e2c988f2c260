use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::opportunities::repo_types::decode_skills;

/// Profile row; `skills` stays JSON text on the wire, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub skills: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub nostr: Option<String>,
    pub telegram: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    pub fn skill_list(&self) -> Option<Vec<String>> {
        decode_skills(self.skills.as_deref(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn skill_list_reads_stored_json() {
        let at = datetime!(2025-03-01 12:00:00 UTC);
        let mut profile = Profile {
            id: 1,
            user_id: 2,
            bio: None,
            location: None,
            skills: Some(r#"["rust","go"]"#.into()),
            website: None,
            twitter: None,
            nostr: None,
            telegram: None,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(profile.skill_list(), Some(vec!["rust".to_string(), "go".to_string()]));

        profile.skills = Some("rust".into());
        assert_eq!(profile.skill_list(), None);
    }
}
