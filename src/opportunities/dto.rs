use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::repo_types::{encode_skills, NewOpportunity, OpportunityType};
use crate::rpc::FieldErrors;

pub const LIST_LIMIT: i64 = 50;

/// Input of `opportunities.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListInput {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OpportunityType>,
    /// Accepted for compatibility; no matching is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Input of `opportunities.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOpportunityInput {
    #[serde(rename = "type")]
    pub kind: OpportunityType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_nostr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_twitter: Option<String>,
}

/// Output of `opportunities.create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOpportunityOutput {
    pub success: bool,
    pub id: u64,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Content rules shared by a fully parsed input and a partially parsed one.
fn check_content(
    title: Option<&str>,
    description: Option<&str>,
    contact_email: Option<&str>,
    errors: &mut FieldErrors,
) {
    if title.is_some_and(str::is_empty) {
        push(errors, "title", "must contain at least 1 character");
    }
    if description.is_some_and(str::is_empty) {
        push(errors, "description", "must contain at least 1 character");
    }
    if let Some(email) = contact_email {
        if !is_valid_email(email) {
            push(errors, "contactEmail", "invalid email");
        }
    }
}

/// Take `name` out of `obj`. Absent and `null` both read as `None`.
fn take_field<T: DeserializeOwned>(
    obj: &mut Map<String, Value>,
    name: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    match obj.remove(name) {
        None | Some(Value::Null) => None,
        Some(v) => match serde_json::from_value(v) {
            Ok(t) => Some(t),
            Err(e) => {
                push(errors, name, e.to_string());
                None
            }
        },
    }
}

fn required<T>(value: Option<T>, name: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() && !errors.contains_key(name) {
        push(errors, name, "Required");
    }
    value
}

impl CreateOpportunityInput {
    /// Parse a raw JSON body field by field, so every problem is reported
    /// against the field it belongs to rather than stopping at the first.
    pub fn from_value(raw: Value) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let Value::Object(mut obj) = raw else {
            push(&mut errors, "input", "expected an object");
            return Err(errors);
        };

        let kind = take_field::<OpportunityType>(&mut obj, "type", &mut errors);
        let kind = required(kind, "type", &mut errors);
        let title = take_field::<String>(&mut obj, "title", &mut errors);
        let title = required(title, "title", &mut errors);
        let description = take_field::<String>(&mut obj, "description", &mut errors);
        let description = required(description, "description", &mut errors);
        let location = take_field(&mut obj, "location", &mut errors);
        let remote = take_field(&mut obj, "remote", &mut errors);
        let skills = take_field(&mut obj, "skills", &mut errors);
        let contact_email: Option<String> = take_field(&mut obj, "contactEmail", &mut errors);
        let contact_nostr = take_field(&mut obj, "contactNostr", &mut errors);
        let contact_telegram = take_field(&mut obj, "contactTelegram", &mut errors);
        let contact_twitter = take_field(&mut obj, "contactTwitter", &mut errors);

        check_content(
            title.as_deref(),
            description.as_deref(),
            contact_email.as_deref(),
            &mut errors,
        );

        match (kind, title, description) {
            (Some(kind), Some(title), Some(description)) if errors.is_empty() => Ok(Self {
                kind,
                title,
                description,
                location,
                remote,
                skills,
                contact_email,
                contact_nostr,
                contact_telegram,
                contact_twitter,
            }),
            _ => Err(errors),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_content(
            Some(&self.title),
            Some(&self.description),
            self.contact_email.as_deref(),
            &mut errors,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Storage form, attributed to `user_id`.
    pub fn into_new(self, user_id: i32) -> NewOpportunity {
        NewOpportunity {
            user_id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            location: self.location,
            remote: i32::from(self.remote.unwrap_or(false)),
            skills: encode_skills(self.skills.as_deref()),
            contact_email: self.contact_email,
            contact_nostr: self.contact_nostr,
            contact_telegram: self.contact_telegram,
            contact_twitter: self.contact_twitter,
        }
    }
}
