//! Opening the store from a path, memory or a `DATABASE_URL`.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const MEMORY_URLS: &[&str] = &[":memory:", "sqlite::memory:", "sqlite://:memory:"];

/// Opens (creating if needed) the store at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Fresh private store; gone when the connection drops.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens a database from a configuration URL.
///
/// Accepted forms:
/// - `:memory:` / `sqlite::memory:` for an in-memory store.
/// - `sqlite://<path>` or `sqlite:<path>` for a file store.
/// - a bare filesystem path.
///
/// # Errors
/// - Returns `DbError::InvalidUrl` for empty input or a non-sqlite scheme.
pub fn open_db_from_url(url: &str) -> DbResult<Connection> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidUrl(url.to_string()));
    }
    if MEMORY_URLS.contains(&trimmed) {
        return open_db_in_memory();
    }

    let path = if let Some(rest) = trimmed.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("sqlite:") {
        rest
    } else if trimmed.contains("://") {
        return Err(DbError::InvalidUrl(trimmed.to_string()));
    } else {
        trimmed
    };

    if path.is_empty() {
        return Err(DbError::InvalidUrl(trimmed.to_string()));
    }
    open_db(path)
}

fn open_with<F>(mode: &str, open: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    let result = open().map_err(DbError::from).and_then(|mut conn| {
        prepare(&mut conn)?;
        Ok(conn)
    });
    let elapsed = started_at.elapsed().as_millis();

    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed} error={err}"
        ),
    }
    result
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    let applied = apply_migrations(conn)?;
    if applied > 0 {
        info!("event=db_schema module=db status=ok applied={applied}");
    }
    Ok(())
}
