//! Request validation schemas.
//!
//! Payload fields arrive as loosely typed JSON so that a wrong type is reported
//! against its field (422) instead of failing deserialization as a whole. Each
//! operation has its own schema: [`PostInput::into_new_post`] for create and
//! [`PostInput::into_changes`] for update.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{NewPost, PostChanges};

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().flatten().map(String::as_str).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Borrowed view of a post payload. `None` means the key was absent;
/// `Some(Value::Null)` means it was sent as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostInput<'a> {
    pub title: Option<&'a Value>,
    pub content: Option<&'a Value>,
    pub is_draft: Option<&'a Value>,
    pub published_at: Option<&'a Value>,
}

impl PostInput<'_> {
    /// Create schema: title and content required, `is_draft` defaults to `true`.
    pub fn into_new_post(self) -> Result<NewPost, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title, Some(TITLE_MAX_CHARS));
        let content = required_text(&mut errors, "content", self.content, None);
        let is_draft = self
            .is_draft
            .and_then(|value| boolean(&mut errors, "is_draft", value));
        let published_at = self
            .published_at
            .and_then(|value| nullable_timestamp(&mut errors, "published_at", value));

        match (title, content) {
            (Some(title), Some(content)) => errors.into_result(NewPost {
                title,
                content,
                is_draft: is_draft.unwrap_or(true),
                published_at: published_at.flatten(),
            }),
            _ => Err(errors),
        }
    }

    /// Update schema: every field optional, present fields validated.
    pub fn into_changes(self) -> Result<PostChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = PostChanges {
            title: self
                .title
                .and_then(|v| required_text(&mut errors, "title", Some(v), Some(TITLE_MAX_CHARS))),
            content: self
                .content
                .and_then(|v| required_text(&mut errors, "content", Some(v), None)),
            is_draft: self
                .is_draft
                .and_then(|v| boolean(&mut errors, "is_draft", v)),
            published_at: self
                .published_at
                .and_then(|v| nullable_timestamp(&mut errors, "published_at", v)),
        };

        errors.into_result(changes)
    }
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&Value>,
    max_chars: Option<usize>,
) -> Option<String> {
    let text = match value {
        None | Some(Value::Null) => {
            errors.add(field, format!("The {field} field is required."));
            return None;
        }
        Some(Value::String(text)) => text,
        Some(_) => {
            errors.add(field, format!("The {field} field must be a string."));
            return None;
        }
    };

    let text = text.trim();
    if text.is_empty() {
        errors.add(field, format!("The {field} field is required."));
        return None;
    }
    if let Some(max) = max_chars
        && text.chars().count() > max
    {
        errors.add(
            field,
            format!("The {field} field must not be greater than {max} characters."),
        );
        return None;
    }

    Some(text.to_string())
}

/// Accepts JSON booleans plus the integer and string spellings forms send.
fn boolean(errors: &mut ValidationErrors, field: &str, value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    };

    if parsed.is_none() {
        errors.add(field, format!("The {field} field must be true or false."));
    }
    parsed
}

fn nullable_timestamp(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Value,
) -> Option<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Some(None),
        // Blank form input means "no schedule".
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => match parse_timestamp(s) {
            Some(at) => Some(Some(at)),
            None => {
                errors.add(field, format!("The {field} field must be a valid date."));
                None
            }
        },
        _ => {
            errors.add(field, format!("The {field} field must be a valid date."));
            None
        }
    }
}

/// Parse RFC 3339, or a naive `YYYY-MM-DD[ T]HH:MM:SS` / `YYYY-MM-DD` read as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
