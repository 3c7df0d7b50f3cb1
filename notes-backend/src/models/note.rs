use chrono::{DateTime, Utc};
use notes_types::{FieldErrors, NoteResource, NoteWrite};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Host;

pub const TITLE_MAX_LEN: usize = 255;
pub const URL_MAX_LEN: usize = 200;

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

const MSG_REQUIRED: &str = "This field is required.";
const MSG_BLANK: &str = "This field may not be blank.";
const MSG_INVALID_URL: &str = "Enter a valid URL.";

/// Field set shared by every note-like entity.
///
/// Concrete entities compose this struct rather than repeating the columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub url: String,
    pub author_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A persisted note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NoteFields,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.title)
    }
}

impl From<Note> for NoteResource {
    fn from(note: Note) -> Self {
        NoteResource {
            id: note.id,
            title: note.fields.title,
            content: note.fields.content,
            url: note.fields.url,
            author: note.fields.author_id,
            created: note.fields.created,
            updated: note.fields.updated,
        }
    }
}

/// How strictly a write payload is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or full replace: required fields must be present
    Full,
    /// Partial update: every field is optional
    Partial,
}

/// Validated values for a new note. The author is supplied separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub url: String,
}

impl NoteInput {
    pub fn new(title: &str, content: &str, url: &str) -> Result<Self, FieldErrors> {
        Self::from_write(&NoteWrite {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            url: Some(url.to_string()),
        })
    }

    pub fn from_write(write: &NoteWrite) -> Result<Self, FieldErrors> {
        let changes = NoteChanges::from_write(write, WriteMode::Full)?;
        Ok(Self {
            title: changes.title.unwrap_or_default(),
            content: changes.content.unwrap_or_default(),
            url: changes.url.unwrap_or_default(),
        })
    }
}

/// Validated changes to an existing note; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
}

impl NoteChanges {
    pub fn from_write(write: &NoteWrite, mode: WriteMode) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = write.title.as_deref().map(str::trim);
        match title {
            None if mode == WriteMode::Full => errors.add("title", MSG_REQUIRED),
            Some("") => errors.add("title", MSG_BLANK),
            Some(t) if t.chars().count() > TITLE_MAX_LEN => {
                errors.add("title", max_length_message(TITLE_MAX_LEN))
            }
            _ => {}
        }

        let url = write.url.as_deref().map(str::trim);
        if let Some(u) = url {
            if u.chars().count() > URL_MAX_LEN {
                errors.add("url", max_length_message(URL_MAX_LEN));
            } else if !u.is_empty() && !is_valid_url(u) {
                errors.add("url", MSG_INVALID_URL);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            title: title.map(str::to_string),
            content: write.content.as_deref().map(|c| c.trim().to_string()),
            url: url.map(str::to_string),
        })
    }
}

fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Absolute URL with a supported scheme and a fully qualified host.
///
/// The raw text must already be a valid URL as typed: whitespace and control
/// characters are rejected instead of being percent-encoded by the parser.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Ok(parsed) = url::Url::parse(raw) else {
        return false;
    };
    if !URL_SCHEMES.contains(&parsed.scheme()) {
        return false;
    }
    match parsed.host() {
        Some(Host::Domain(domain)) => is_qualified_domain(domain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

/// `localhost`, or dotted labels ending in an alphabetic (or punycode) TLD
fn is_qualified_domain(domain: &str) -> bool {
    if domain == "localhost" {
        return true;
    }
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let valid_labels = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    let valid_tld = tld.starts_with("xn--")
        || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    valid_labels && valid_tld
}
