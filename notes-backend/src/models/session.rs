use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login session backing both the web cookie and API bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
