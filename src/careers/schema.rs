//! Read and write schemas for career posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::UpstreamError;
use crate::validation::{CharField, FieldErrors};

/// Longest title accepted on update.
pub const TITLE_MAX_LENGTH: usize = 200;

/// A post as returned to callers. Every field is required; extra upstream
/// fields are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerPost {
    pub id: i64,
    pub username: String,
    pub created_datetime: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

/// Map an upstream listing body through the read schema.
/// A missing or null `results` key is an empty listing.
pub(crate) fn parse_listing(body: Value) -> Result<Vec<CareerPost>, UpstreamError> {
    let listing: Listing = serde_json::from_value(body)
        .map_err(|e| UpstreamError::InvalidResponse(format!("listing: {}", e)))?;

    listing
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|record| {
            serde_json::from_value(record)
                .map_err(|e| UpstreamError::InvalidResponse(format!("post record: {}", e)))
        })
        .collect()
}

/// Validated create payload. The owner is attached separately from the
/// authenticated caller, never from the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
}

impl CreatePost {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = CharField::required().extract(payload, "title", &mut errors);
        let content = CharField::required().extract(payload, "content", &mut errors);

        match (title, content) {
            (Some(title), Some(content)) => Ok(Self { title, content }),
            _ => Err(errors),
        }
    }

    /// Attach the owning username.
    pub fn owned_by(self, username: &str) -> NewPost {
        NewPost {
            username: username.to_string(),
            title: self.title,
            content: self.content,
        }
    }
}

/// Body sent upstream on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub username: String,
    pub title: String,
    pub content: String,
}

/// Validated partial update. Absent fields are not sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatePost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UpdatePost {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = CharField::optional()
            .max_length(TITLE_MAX_LENGTH)
            .extract(payload, "title", &mut errors);
        let content = CharField::optional().extract(payload, "content", &mut errors);

        errors.finish(Self { title, content })
    }
}
