// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel-backed document store.
//!
//! Diesel connections are blocking, so every call hops onto the blocking
//! pool and serializes on the connection mutex.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use diesel::SqliteConnection;
use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};

use crate::DocumentStore;
use crate::backend::sqlite::{self, Storage};
use crate::document::{BookingFilter, Committed, Versioned, WriteBatch};
use crate::error::PersistenceError;
use crate::{mutations, queries};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives its own database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A [`DocumentStore`] over a single `SQLite` connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Creates a store backed by a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = sqlite::open(&shared_memory_url, Storage::Memory)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates a store backed by a database file, creating it if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError(String::from("Invalid database path"))
        })?;

        let conn: SqliteConnection = sqlite::open(path_str, Storage::File)?;

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError> + Send + 'static,
    {
        let conn: Arc<Mutex<SqliteConnection>> = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await?
    }
}

impl DocumentStore for SqliteStore {
    async fn get_zone(
        &self,
        zone_id: &ZoneId,
    ) -> Result<Option<Versioned<ParkingZone>>, PersistenceError> {
        let zone_id: ZoneId = zone_id.clone();
        self.with_conn(move |conn| queries::get_zone(conn, &zone_id))
            .await
    }

    async fn list_zones(&self) -> Result<Vec<Versioned<ParkingZone>>, PersistenceError> {
        self.with_conn(queries::list_zones).await
    }

    async fn get_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Versioned<Booking>>, PersistenceError> {
        let booking_id: BookingId = booking_id.clone();
        self.with_conn(move |conn| queries::get_booking(conn, &booking_id))
            .await
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Versioned<Booking>>, PersistenceError> {
        let filter: BookingFilter = filter.clone();
        self.with_conn(move |conn| queries::list_bookings(conn, &filter))
            .await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Committed>, PersistenceError> {
        self.with_conn(move |conn| mutations::commit_batch(conn, batch))
            .await
    }
}
