//! Auth session database operations

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::super::sqlite::{format_ts, now_ts, ts_column};
use super::super::{Database, DbResult};
use crate::models::{Session, User};

impl Database {
    /// Create a new login session for `user_id`
    pub fn create_session(&self, user_id: i64, ttl: Duration) -> DbResult<Session> {
        let conn = self.conn()?;
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + ttl;

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![token, user_id, format_ts(&created_at), format_ts(&expires_at)],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Validate a session token and extend its expiry if valid
    pub fn validate_session(&self, token: &str, ttl: Duration) -> DbResult<Option<(Session, User)>> {
        let conn = self.conn()?;
        let now = Utc::now();

        let found = conn
            .query_row(
                "SELECT s.id, s.token, s.user_id, s.created_at, s.expires_at, u.username, u.created_at
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                params![token, format_ts(&now)],
                |row| {
                    let session = Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: ts_column(row, 3)?,
                        expires_at: ts_column(row, 4)?,
                    };
                    let user = User {
                        id: session.user_id,
                        username: row.get(5)?,
                        created_at: ts_column(row, 6)?,
                    };
                    Ok((session, user))
                },
            )
            .optional()?;

        let Some((mut session, user)) = found else {
            return Ok(None);
        };

        // Keep active sessions alive
        let new_expires = now + ttl;
        conn.execute(
            "UPDATE auth_sessions SET expires_at = ?1 WHERE id = ?2",
            params![format_ts(&new_expires), session.id],
        )?;
        session.expires_at = new_expires;

        Ok(Some((session, user)))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    /// Remove sessions whose expiry has passed
    pub fn purge_expired_sessions(&self) -> DbResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM auth_sessions WHERE expires_at <= ?1", [now_ts()])?;
        if removed > 0 {
            log::info!("[AUTH] Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}
