//! Startup configuration. Everything the binary needs to know about where the
//! database, exports, and log file live is gathered here once and passed down;
//! nothing below `main` reads the environment.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::LevelFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".smart-student";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "students.sqlite";
const EXPORT_DIR_NAME: &str = "exports";
const LOG_FILE_NAME: &str = "smart-student.log";

/// Value of `SMART_STUDENT_DB` that selects a throwaway in-memory store.
pub const IN_MEMORY: &str = ":memory:";

pub const ENV_DB: &str = "SMART_STUDENT_DB";
pub const ENV_EXPORT_DIR: &str = "SMART_STUDENT_EXPORT_DIR";
pub const ENV_LOG_FILE: &str = "SMART_STUDENT_LOG_FILE";
pub const ENV_LOG_LEVEL: &str = "SMART_STUDENT_LOG_LEVEL";
pub const ENV_ADMIN_USER: &str = "SMART_STUDENT_ADMIN_USER";
pub const ENV_ADMIN_PASSWORD: &str = "SMART_STUDENT_ADMIN_PASSWORD";

const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    InMemory,
}

/// Settings consumed by [`crate::db::Session::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: DatabaseTarget,
    /// Account seeded when the `users` table is empty.
    pub admin_username: String,
    pub admin_password: String,
}

impl StoreConfig {
    /// In-memory store with the default seed account. Used by tests and
    /// one-off tooling.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseTarget::InMemory,
            admin_username: DEFAULT_ADMIN_USER.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseTarget::File(path.into()),
            ..Self::in_memory()
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// Read an optional `.env` file, then the process environment.
    pub fn load() -> Result<Self> {
        // A missing .env file is the common case.
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to
    /// defaults under `~/.smart-student` for every unset key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database = match get(ENV_DB) {
            Some(value) if value == IN_MEMORY => DatabaseTarget::InMemory,
            Some(value) => DatabaseTarget::File(PathBuf::from(value)),
            None => DatabaseTarget::File(data_dir()?.join(DB_FILE_NAME)),
        };

        let export_dir = match get(ENV_EXPORT_DIR) {
            Some(value) => PathBuf::from(value),
            None => data_dir()?.join(EXPORT_DIR_NAME),
        };

        let log_file = match get(ENV_LOG_FILE) {
            Some(value) => PathBuf::from(value),
            None => data_dir()?.join(LOG_FILE_NAME),
        };

        let log_level = match get(ENV_LOG_LEVEL) {
            Some(value) => LevelFilter::from_str(&value)
                .with_context(|| format!("{ENV_LOG_LEVEL} has unknown level '{value}'"))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            store: StoreConfig {
                database,
                admin_username: get(ENV_ADMIN_USER)
                    .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
                admin_password: get(ENV_ADMIN_PASSWORD)
                    .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            },
            export_dir,
            log_file,
            log_level,
        })
    }
}

/// Resolve `~/.smart-student`.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
