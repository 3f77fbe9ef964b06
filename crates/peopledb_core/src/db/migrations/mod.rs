//! Bundled schema steps for the people database.
//!
//! # Responsibility
//! - List schema steps in ascending version order.
//! - Upgrade a connection from its stored version to the latest one.
//!
//! # Invariants
//! - Versions start at 1 and increase by one per step.
//! - All pending steps commit together or not at all.
//! - `PRAGMA user_version` equals the last applied step.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs; append only.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_people.sql"))];

/// Highest schema version this build can create.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Version currently recorded in the database header.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Runs every step newer than the stored version inside one transaction.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is ahead of this build.
/// - `Migration` naming the step that failed; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stored = schema_version(conn)?;
    let latest = latest_version();

    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|(version, _)| *version > stored)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration {
                version: *version,
                source,
            })?;
        info!("event=db_migrate module=db status=ok from={stored} version={version}");
    }
    tx.commit()?;

    Ok(())
}
