use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Lifetime of a login session, extended on every authenticated request
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
    /// Set to "true" or "1" when serving behind HTTPS so the session cookie is marked Secure.
    pub const SECURE_COOKIES: &str = "SECURE_COOKIES";
    /// Password used by `notes-admin create-user` when `--password` is omitted.
    pub const ADMIN_PASSWORD: &str = "NOTES_ADMIN_PASSWORD";
}

/// Default values
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8000;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const SESSION_TTL_HOURS: i64 = 24;
}

/// Name of the cookie carrying the session token for the web UI
pub const SESSION_COOKIE: &str = "sessionid";

/// Where anonymous web requests are sent
pub const LOGIN_URL: &str = "/accounts/login/";

/// Where successful logins and note form submissions land
pub const HOME_URL: &str = "/notes/";

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let session_ttl_hours =
            parse_or_default(env_vars::SESSION_TTL_HOURS, defaults::SESSION_TTL_HOURS);

        Self {
            host: env::var(env_vars::HOST).unwrap_or_else(|_| defaults::HOST.to_string()),
            port: parse_or_default(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            session_ttl_hours: if session_ttl_hours > 0 {
                session_ttl_hours
            } else {
                defaults::SESSION_TTL_HOURS
            },
            secure_cookies: flag(env_vars::SECURE_COOKIES),
        }
    }

    /// Configuration pointing at an explicit database file, everything else default
    pub fn with_database(database_url: &str) -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            database_url: database_url.to_string(),
            session_ttl_hours: defaults::SESSION_TTL_HOURS,
            secure_cookies: false,
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

/// Admin password from the environment, if set
pub fn admin_password() -> Option<String> {
    env::var(env_vars::ADMIN_PASSWORD).ok().filter(|p| !p.is_empty())
}
