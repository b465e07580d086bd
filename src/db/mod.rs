// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite).
//!
//! One connection is shared behind a mutex. Handlers hand a closure to
//! [`Db::call`], which runs it on the blocking pool. Each submodule holds the
//! queries for one area and works on a plain `&Connection`.

pub mod accounts;
pub mod archive;
pub mod calendar;
pub mod day;
pub mod diary;
pub mod log;
pub mod migrations;
pub mod news;
pub mod reminder;
pub mod telecom;
pub mod terms;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::error::AppError;

/// Storage bootstrap errors.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Shared handle to the application database.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open (or create) the database file and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let started_at = Instant::now();
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        bootstrap_connection(&mut conn)?;
        tracing::info!(
            path = %path.display(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Database opened"
        );
        Ok(Self::from_connection(conn))
    }

    /// Fresh in-memory database with the full schema. Used by tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        bootstrap_connection(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("database task failed: {}", e)))?
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrations::apply_migrations(conn)?;
    Ok(())
}

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use rusqlite::Connection;

    use super::accounts::{self, NewGroup, NewUser};

    pub fn seed_user(conn: &Connection, username: &str) -> i64 {
        accounts::create_user(
            conn,
            &NewUser {
                username: username.to_string(),
                email: format!("{username}@chief.com.tw"),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: String::new(),
                is_superuser: false,
                boss_id: None,
                keep_diary: false,
                diary_starting_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
        )
        .unwrap()
    }

    pub fn seed_department(conn: &Connection, name: &str) -> i64 {
        accounts::create_group(
            conn,
            &NewGroup {
                name: name.to_string(),
                is_department: true,
                is_displayed: true,
                ..Default::default()
            },
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_applies_schema() {
        let db = Db::open_in_memory().unwrap();
        let count = db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'prefix_list_tasks'",
                    [],
                    |row| row.get::<_, i64>(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
