//! Ordered schema steps for the relationship store.
//!
//! The applied step is recorded in `PRAGMA user_version`; all pending steps
//! run inside one transaction, so a failed upgrade leaves the old schema intact.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, name, sql)`; versions strictly increase.
const MIGRATIONS: &[(u32, &str, &str)] = &[
    (1, "init", include_str!("0001_init.sql")),
    (2, "graph_indexes", include_str!("0002_graph_indexes.sql")),
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _, _)| *version)
}

/// Brings `conn` up to [`latest_version`]; returns how many steps ran.
///
/// A store written by a newer build is refused rather than downgraded.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let from: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _, _)| *version > from)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for (version, name, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=ok version={version} name={name}");
    }
    tx.commit()?;
    Ok(pending.len())
}
