//! Fixtures shared by handler tests

use actix_web::web;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::config::Config;
use crate::db::Database;
use crate::models::User;
use crate::AppState;

pub struct TestContext {
    /// Keeps the database file alive for the duration of the test
    pub _dir: TempDir,
    pub state: web::Data<AppState>,
    pub user: User,
    pub token: String,
}

impl TestContext {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }

    /// Log in a second account, returning it with its session token
    pub fn other_user(&self, username: &str) -> (User, String) {
        let user = self.state.db.create_user(username, "pass").unwrap();
        let session = self
            .state
            .db
            .create_session(user.id, self.state.config.session_ttl())
            .unwrap();
        (user, session.token)
    }
}

/// Fresh database with one logged-in user
pub fn setup(username: &str) -> TestContext {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_path = db_path.to_str().unwrap();

    let db = Database::new(db_path).expect("Failed to create database");
    let config = Config::with_database(db_path);
    let user = db.create_user(username, "pass").unwrap();
    let session = db.create_session(user.id, config.session_ttl()).unwrap();

    TestContext {
        _dir: dir,
        state: web::Data::new(AppState::new(Arc::new(db), config)),
        user,
        token: session.token,
    }
}

/// Build the full application service around a test context's state
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .wrap(actix_web::middleware::NormalizePath::new(
                    actix_web::middleware::TrailingSlash::Always,
                ))
                .configure(crate::controllers::configure),
        )
        .await
    };
}

pub(crate) use test_app;
