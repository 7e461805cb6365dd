use crate::error::{AppError, Result};
use std::env;
use std::fmt;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_PORT: u16 = 5432;

/// Where the users table lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// Individual Postgres connection settings (`DB_*` variables).
    Postgres {
        user: String,
        host: String,
        name: String,
        password: String,
        port: u16,
    },
    /// A full connection URL from `DATABASE_URL`. `sqlite:` URLs pick the SQLite backend.
    Url(String),
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Postgres {
                user,
                host,
                name,
                port,
                ..
            } => f
                .debug_struct("Postgres")
                .field("user", user)
                .field("host", host)
                .field("name", name)
                .field("password", &"[REDACTED]")
                .field("port", port)
                .finish(),
            DatabaseConfig::Url(_) => f.debug_tuple("Url").field(&"[REDACTED]").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = parse_port(lookup("PORT"), "PORT", DEFAULT_PORT)?;

        let database = match lookup("DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Postgres {
                user: get_or("DB_USER", "postgres"),
                host: get_or("DB_HOST", "localhost"),
                name: get_or("DB_NAME", "thegaadi"),
                password: get_or("DB_PASSWORD", "12345678"),
                port: parse_port(lookup("DB_PORT"), "DB_PORT", DEFAULT_DB_PORT)?,
            },
        };

        Ok(Self { port, database })
    }
}

fn parse_port(value: Option<String>, key: &str, default: u16) -> Result<u16> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
    }
}
