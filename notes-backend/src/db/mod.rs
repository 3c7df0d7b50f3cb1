mod models;
pub mod sqlite;

pub use sqlite::{Database, DbConn, DbError, DbResult};
