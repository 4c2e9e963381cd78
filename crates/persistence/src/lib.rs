// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Versioned document storage for ParkWise.
//!
//! Zones and bookings are stored as documents that carry a version. All
//! writes go through [`DocumentStore::commit`], which applies a
//! [`WriteBatch`] of conditional writes atomically: either every write's
//! expected version matches and all of them land, or nothing changes and
//! the caller gets a `VersionConflict`.
//!
//! ## Backends
//!
//! - [`MemoryStore`] keeps everything in process and can inject transient
//!   failures. Used by unit tests and by the server when no database path
//!   is given.
//! - [`SqliteStore`] persists through Diesel. Migrations are embedded and
//!   run on open; foreign key enforcement is verified at startup.
//!
//! Both backends enforce the same rules, including that a booking cannot
//! reference a zone that does not exist.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use std::future::Future;

use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};

mod backend;
mod data_models;
mod diesel_schema;
mod document;
mod error;
mod memory;
mod mutations;
mod queries;
mod sqlite_store;

#[cfg(test)]
mod tests;

pub use document::{
    BOOKINGS, BookingFilter, Committed, Precondition, Versioned, Write, WriteBatch, ZONES,
};
pub use error::PersistenceError;
pub use memory::MemoryStore;
pub use sqlite_store::SqliteStore;

/// A store of versioned zone and booking documents.
///
/// Reads never block writers for longer than one call. Writes are only
/// possible through [`commit`](Self::commit).
pub trait DocumentStore: Send + Sync + 'static {
    /// Reads one zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_zone(
        &self,
        zone_id: &ZoneId,
    ) -> impl Future<Output = Result<Option<Versioned<ParkingZone>>, PersistenceError>> + Send;

    /// Reads every zone, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_zones(
        &self,
    ) -> impl Future<Output = Result<Vec<Versioned<ParkingZone>>, PersistenceError>> + Send;

    /// Reads one booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_booking(
        &self,
        booking_id: &BookingId,
    ) -> impl Future<Output = Result<Option<Versioned<Booking>>, PersistenceError>> + Send;

    /// Reads the bookings matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> impl Future<Output = Result<Vec<Versioned<Booking>>, PersistenceError>> + Send;

    /// Applies `batch` atomically.
    ///
    /// Returns the committed state of every written document, in batch
    /// order.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if any precondition does not hold
    /// - `ForeignKeyViolation` if a booking would reference a missing zone
    /// - `Unavailable` if the store could not be reached
    fn commit(
        &self,
        batch: WriteBatch,
    ) -> impl Future<Output = Result<Vec<Committed>, PersistenceError>> + Send;
}
