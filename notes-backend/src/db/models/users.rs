//! User account database operations

use rusqlite::{params, OptionalExtension};

use super::super::sqlite::{now_ts, ts_column};
use super::super::{Database, DbError, DbResult};
use crate::models::{validate_username, User};
use crate::password::{hash_password, verify_password};

impl Database {
    /// Create a user account with a hashed password
    pub fn create_user(&self, username: &str, password: &str) -> DbResult<User> {
        validate_username(username).map_err(DbError::InvalidAccount)?;
        if password.is_empty() {
            return Err(DbError::InvalidAccount("Password may not be empty".to_string()));
        }

        if self.get_user_by_username(username)?.is_some() {
            return Err(DbError::UserExists(username.to_string()));
        }

        let password_hash =
            hash_password(password).map_err(|e| DbError::PasswordHash(e.to_string()))?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now_ts()],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        log::info!("[AUTH] Created user {} ({})", username, id);
        self.get_user(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                [id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user by username and check the password
    pub fn verify_user_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
                [username],
                |row| Ok((row_to_user(row)?, row.get::<_, String>(3)?)),
            )
            .optional()?;

        Ok(match row {
            Some((user, hash)) if verify_password(password, &hash) => Some(user),
            _ => None,
        })
    }

    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, username, created_at FROM users ORDER BY username")?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Delete a user; their notes and sessions go with them
    pub fn delete_user(&self, username: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
        if rows > 0 {
            log::info!("[AUTH] Deleted user {}", username);
        }
        Ok(rows > 0)
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: ts_column(row, 2)?,
    })
}
