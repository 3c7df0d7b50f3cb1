//! Note-taking service: a server-rendered web UI and a JSON REST API over a
//! SQLite store.

use std::sync::Arc;
use std::time::Instant;

pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod html;
pub mod models;
pub mod password;

#[cfg(test)]
pub(crate) mod test_util;

use config::Config;
use db::Database;

/// Request context handed to every handler through `web::Data`
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    /// Server start time for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        Self {
            db,
            config,
            started_at: Instant::now(),
        }
    }
}
