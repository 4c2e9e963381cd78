// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening and preparing `SQLite` connections for the document store.

use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Where the database lives. File databases switch to WAL journaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Memory,
    File,
}

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Opens `url`, applies connection pragmas and brings the schema up to date.
///
/// # Errors
///
/// Fails if the connection cannot be established, a pragma is rejected,
/// a migration fails, or foreign keys end up disabled.
pub fn open(url: &str, storage: Storage) -> Result<SqliteConnection, PersistenceError> {
    info!(url, ?storage, "Opening SQLite document store");

    let mut conn: SqliteConnection = SqliteConnection::establish(url)?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
    diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).execute(&mut conn)?;
    if storage == Storage::File {
        diesel::sql_query("PRAGMA journal_mode = WAL").execute(&mut conn)?;
    }

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    debug!(count = applied.len(), "Applied pending migrations");

    ensure_foreign_keys(&mut conn)?;
    Ok(conn)
}

/// Bookings reference zones; a connection without enforcement could leave
/// a booking pointing at a deleted zone.
fn ensure_foreign_keys(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if row.foreign_keys == 0 {
        return Err(PersistenceError::InitializationError(String::from(
            "foreign key enforcement is not enabled",
        )));
    }
    Ok(())
}
