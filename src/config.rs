//! Runtime configuration loaded from environment variables (and `.env`).
//!
//! | variable             | default          |
//! |----------------------|------------------|
//! | `BIND_ADDR`          | `127.0.0.1:8080` |
//! | `STORE`              | `postgres`       |
//! | `DATABASE_URL`       | required for `postgres` |
//! | `DB_MAX_CONNECTIONS` | `8`              |
//! | `UNMARKED_POLICY`    | `ignore`         |

use std::env;

use crate::errors::AppError;
use crate::stats::UnmarkedPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub unmarked_policy: UnmarkedPolicy,
}

impl AppConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "STORE must be 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(AppError::Config("DATABASE_URL is required when STORE=postgres".to_string()));
        }

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::Config(format!("DB_MAX_CONNECTIONS must be a positive integer, got '{raw}'")))?,
            None => 8,
        };

        let unmarked_policy = match lookup("UNMARKED_POLICY") {
            Some(raw) => raw.parse::<UnmarkedPolicy>().map_err(AppError::Config)?,
            None => UnmarkedPolicy::default(),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            store,
            database_url,
            db_max_connections,
            unmarked_policy,
        })
    }
}
