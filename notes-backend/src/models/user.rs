use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERNAME_MAX_LEN: usize = 150;

/// A user account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Usernames are 1-150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username may not be empty".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Username may not be longer than {} characters",
            USERNAME_MAX_LEN
        ));
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
    {
        return Err(format!("Username contains invalid character {:?}", c));
    }
    Ok(())
}
