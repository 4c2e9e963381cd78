// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Conditional writes.
//!
//! Each write is an `INSERT` (document must be absent) or an `UPDATE` /
//! `DELETE` filtered on the expected version. Zero affected rows means
//! another writer got there first, and the enclosing transaction is rolled
//! back with a `VersionConflict`.

use diesel::SqliteConnection;
use diesel::prelude::*;
use parkwise_domain::{Booking, ParkingZone};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::data_models::{BookingRow, ZoneRow, version_to_column};
use crate::diesel_schema::{bookings, parking_zones};
use crate::document::{BOOKINGS, Committed, Precondition, Versioned, Write, WriteBatch, ZONES};
use crate::error::PersistenceError;

/// Applies every write of `batch` inside one immediate transaction.
///
/// # Errors
///
/// Returns an error, with nothing applied, if any precondition fails or a
/// constraint is violated.
pub fn commit_batch(
    conn: &mut SqliteConnection,
    batch: WriteBatch,
) -> Result<Vec<Committed>, PersistenceError> {
    batch.check_distinct()?;
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let mut committed: Vec<Committed> = Vec::with_capacity(batch.len());
        for write in batch.into_writes() {
            committed.push(apply_write(conn, write)?);
        }
        debug!(writes = committed.len(), "Committed batch to SQLite");
        Ok(committed)
    })
}

fn conflict(collection: &'static str, id: &str) -> PersistenceError {
    PersistenceError::VersionConflict {
        collection,
        id: id.to_string(),
    }
}

/// Inserting an existing primary key means someone created it first.
fn map_insert_error(err: DieselError, collection: &'static str, id: &str) -> PersistenceError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => conflict(collection, id),
        other => other.into(),
    }
}

fn expect_one(affected: usize, collection: &'static str, id: &str) -> Result<(), PersistenceError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(conflict(collection, id))
    }
}

fn apply_write(conn: &mut SqliteConnection, write: Write) -> Result<Committed, PersistenceError> {
    match write {
        Write::PutZone { zone, expected } => {
            let id: &str = zone.id.as_str();
            match expected {
                Precondition::Absent => {
                    let row: ZoneRow = ZoneRow::from_document(&zone, 1)?;
                    diesel::insert_into(parking_zones::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(|e| map_insert_error(e, ZONES, id))?;
                    Ok(Committed::Zone(row.into_document()?))
                }
                Precondition::Version(current) => {
                    let row: ZoneRow = ZoneRow::from_document(&zone, current + 1)?;
                    let affected: usize = diesel::update(
                        parking_zones::table
                            .filter(parking_zones::zone_id.eq(id))
                            .filter(parking_zones::version.eq(version_to_column(current)?)),
                    )
                    .set((
                        parking_zones::version.eq(row.version),
                        parking_zones::name.eq(&row.name),
                        parking_zones::ward_id.eq(&row.ward_id),
                        parking_zones::ward_name.eq(&row.ward_name),
                        parking_zones::lat.eq(row.lat),
                        parking_zones::lng.eq(row.lng),
                        parking_zones::total_slots.eq(row.total_slots),
                        parking_zones::available_slots.eq(row.available_slots),
                        parking_zones::price_per_hour.eq(row.price_per_hour),
                        parking_zones::psi.eq(row.psi),
                        parking_zones::status.eq(&row.status),
                        parking_zones::revenue.eq(row.revenue),
                    ))
                    .execute(conn)?;
                    expect_one(affected, ZONES, id)?;
                    Ok(Committed::Zone(row.into_document()?))
                }
            }
        }
        Write::DeleteZone {
            zone_id,
            expected_version,
        } => {
            let removed: Option<ZoneRow> = diesel::delete(
                parking_zones::table
                    .filter(parking_zones::zone_id.eq(zone_id.as_str()))
                    .filter(parking_zones::version.eq(version_to_column(expected_version)?)),
            )
            .returning(ZoneRow::as_returning())
            .get_result(conn)
            .optional()?;
            let removed: ZoneRow = removed.ok_or_else(|| conflict(ZONES, zone_id.as_str()))?;
            let last: Versioned<ParkingZone> = removed.into_document()?;
            Ok(Committed::ZoneDeleted(Versioned::new(
                expected_version + 1,
                last.data,
            )))
        }
        Write::PutBooking { booking, expected } => {
            let id: &str = booking.id.as_str();
            match expected {
                Precondition::Absent => {
                    let row: BookingRow = BookingRow::from_document(&booking, 1)?;
                    diesel::insert_into(bookings::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(|e| map_insert_error(e, BOOKINGS, id))?;
                    Ok(Committed::Booking(row.into_document()?))
                }
                Precondition::Version(current) => {
                    let row: BookingRow = BookingRow::from_document(&booking, current + 1)?;
                    let affected: usize = diesel::update(
                        bookings::table
                            .filter(bookings::booking_id.eq(id))
                            .filter(bookings::version.eq(version_to_column(current)?)),
                    )
                    .set((
                        bookings::version.eq(row.version),
                        bookings::status.eq(&row.status),
                        bookings::payment_status.eq(&row.payment_status),
                        bookings::paid_at.eq(&row.paid_at),
                        bookings::completed_at.eq(&row.completed_at),
                        bookings::ended_at.eq(&row.ended_at),
                    ))
                    .execute(conn)?;
                    expect_one(affected, BOOKINGS, id)?;
                    Ok(Committed::Booking(row.into_document()?))
                }
            }
        }
        Write::DeleteBooking {
            booking_id,
            expected_version,
        } => {
            let removed: Option<BookingRow> = diesel::delete(
                bookings::table
                    .filter(bookings::booking_id.eq(booking_id.as_str()))
                    .filter(bookings::version.eq(version_to_column(expected_version)?)),
            )
            .returning(BookingRow::as_returning())
            .get_result(conn)
            .optional()?;
            let removed: BookingRow =
                removed.ok_or_else(|| conflict(BOOKINGS, booking_id.as_str()))?;
            let last: Versioned<Booking> = removed.into_document()?;
            Ok(Committed::BookingDeleted(Versioned::new(
                expected_version + 1,
                last.data,
            )))
        }
    }
}
