//! Shared wire types for the notes REST API and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =====================================================
// Resource Types
// =====================================================

/// A note as it appears on the wire.
///
/// `author`, `created` and `updated` are output-only: they are never read
/// from a request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteResource {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub url: String,
    /// Id of the owning user account
    pub author: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Writable subset of a note, used for create, full update and partial update.
///
/// Unknown and read-only keys (`id`, `author`, `created`, `updated`) are
/// silently dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteWrite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// =====================================================
// Error Types
// =====================================================

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Generic `{"detail": "..."}` error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// =====================================================
// Auth Types
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token issued by the API login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Index of the API's resource collections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRoot {
    pub notes: String,
}
