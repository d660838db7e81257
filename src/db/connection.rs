use std::fs;

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

use crate::config::{DatabaseTarget, StoreConfig};

use super::accounts::{count_accounts, create_account};
use super::students::count_students;

/// The single connection the application works through. It is opened once at
/// startup, handed to every store call by reference, and closed on shutdown.
pub struct Session {
    conn: Connection,
    target: DatabaseTarget,
}

impl Session {
    /// Open the configured database, create missing tables, and seed the
    /// default account when no accounts exist yet.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = match &config.database {
            DatabaseTarget::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).context("failed to create data directory")?;
                }
                Connection::open(path)
                    .with_context(|| format!("failed to open SQLite database {}", path.display()))?
            }
            DatabaseTarget::InMemory => {
                Connection::open_in_memory().context("failed to open in-memory database")?
            }
        };

        ensure_schema(&conn)?;

        if count_accounts(&conn)? == 0 {
            create_account(&conn, &config.admin_username, &config.admin_password, None)
                .context("failed to seed default account")?;
            info!("seeded default account '{}'", config.admin_username);
        }

        info!(
            "session opened on {:?} with {} student(s)",
            config.database,
            count_students(&conn)?
        );
        Ok(Self {
            conn,
            target: config.database.clone(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    /// Release the connection, reporting any error SQLite raises while
    /// flushing.
    pub fn close(self) -> Result<()> {
        let target = self.target;
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .context("failed to close database")?;
        info!("session closed on {target:?}");
        Ok(())
    }
}

/// Create the tables if they do not exist yet.
fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            roll_no TEXT NOT NULL UNIQUE,
            department TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            marks REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create students table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'admin',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create users table")?;

    debug!("schema ready");
    Ok(())
}
