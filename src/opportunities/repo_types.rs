use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OpportunityType {
    Tutoring,
    Internship,
    Volunteer,
    Research,
    Competition,
}

/// Opportunity row, returned over the wire in its stored encoding: `remote`
/// is 0/1 and `skills` is JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: OpportunityType,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub remote: i32,
    pub skills: Option<String>,
    pub contact_email: Option<String>,
    pub contact_nostr: Option<String>,
    pub contact_telegram: Option<String>,
    pub contact_twitter: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Opportunity {
    pub fn is_remote(&self) -> bool {
        self.remote != 0
    }

    /// Decoded skills; `None` when absent or not a JSON string array.
    pub fn skill_list(&self) -> Option<Vec<String>> {
        decode_skills(self.skills.as_deref(), self.id)
    }
}

/// Row to insert; already in storage encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOpportunity {
    pub user_id: i32,
    pub kind: OpportunityType,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub remote: i32,
    pub skills: Option<String>,
    pub contact_email: Option<String>,
    pub contact_nostr: Option<String>,
    pub contact_telegram: Option<String>,
    pub contact_twitter: Option<String>,
}

pub fn encode_skills(skills: Option<&[String]>) -> Option<String> {
    // Serializing a slice of strings cannot fail.
    skills.map(|s| serde_json::to_string(s).unwrap_or_else(|_| "[]".to_string()))
}

/// Stored skills are JSON text; anything unreadable decodes to `None` with a warning.
pub fn decode_skills(raw: Option<&str>, row_id: i32) -> Option<Vec<String>> {
    let raw = raw?;
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, row_id, "stored skills are not a JSON string array");
            None
        }
    }
}
