//! Account management for the notes service.
//!
//! Reads the same `.env` / environment as the server, so it always points at
//! the server's database.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::process::ExitCode;

use notes_backend::config::{self, Config};
use notes_backend::db::{Database, DbError};

#[derive(Parser)]
#[command(name = "notes-admin", version, about = "Manage notes service accounts")]
struct Cli {
    /// Database file (defaults to DATABASE_URL)
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user account
    CreateUser {
        username: String,
        /// Password; falls back to NOTES_ADMIN_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user account together with its notes and sessions
    DeleteUser { username: String },
    /// List user accounts
    ListUsers,
    /// Remove expired login sessions
    PurgeSessions,
}

fn run(cli: Cli) -> Result<(), DbError> {
    let database_url = cli
        .database
        .unwrap_or_else(|| Config::from_env().database_url);
    let db = Database::new(&database_url)?;

    match cli.command {
        Command::CreateUser { username, password } => {
            let Some(password) = password.or_else(config::admin_password) else {
                return Err(DbError::InvalidAccount(format!(
                    "No password given; pass --password or set {}",
                    config::env_vars::ADMIN_PASSWORD
                )));
            };
            let user = db.create_user(&username, &password)?;
            println!("Created user {} (id {})", user.username, user.id);
        }
        Command::DeleteUser { username } => {
            if db.delete_user(&username)? {
                println!("Deleted user {}", username);
            } else {
                println!("No such user: {}", username);
            }
        }
        Command::ListUsers => {
            for user in db.list_users()? {
                println!(
                    "{:>5}  {:<30}  {}",
                    user.id,
                    user.username,
                    user.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::PurgeSessions => {
            let removed = db.purge_expired_sessions()?;
            println!("Removed {} expired sessions", removed);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
