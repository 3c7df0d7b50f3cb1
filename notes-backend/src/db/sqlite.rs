//! SQLite connection pool and schema

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use thiserror::Error;

pub type DbConn = PooledConnection<SqliteConnectionManager>;

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the data access layer
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    /// A username that is already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Rejected account input (bad username, empty password)
    #[error("{0}")]
    InvalidAccount(String),
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(title) <= 255),
        content TEXT NOT NULL DEFAULT '',
        url TEXT NOT NULL DEFAULT '' CHECK (length(url) <= 200),
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created TEXT NOT NULL,
        updated TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_notes_author ON notes(author_id);

    CREATE TABLE IF NOT EXISTS auth_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
";

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub fn new(database_url: &str) -> DbResult<Self> {
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Foreign keys are per-connection in SQLite, so every pooled connection enables them.
        let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder().max_size(8).build(manager)?;

        let db = Self { pool };
        db.conn()?.execute_batch(SCHEMA)?;
        log::info!("[DB] Schema ready at {}", database_url);

        Ok(db)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> DbResult<DbConn> {
        Ok(self.pool.get()?)
    }
}

/// Timestamps are stored as fixed-precision RFC 3339 text so they sort lexically.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now_ts() -> String {
    format_ts(&Utc::now())
}

/// Read an RFC 3339 text column
pub(crate) fn ts_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
