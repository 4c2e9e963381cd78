// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only document queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use parkwise_domain::{Booking, BookingId, BookingStatus, ParkingZone, ZoneId};

use crate::data_models::{BookingRow, ZoneRow};
use crate::diesel_schema::{bookings, parking_zones};
use crate::document::{BookingFilter, Versioned};
use crate::error::PersistenceError;

pub fn get_zone(
    conn: &mut SqliteConnection,
    zone_id: &ZoneId,
) -> Result<Option<Versioned<ParkingZone>>, PersistenceError> {
    parking_zones::table
        .find(zone_id.as_str())
        .select(ZoneRow::as_select())
        .first(conn)
        .optional()?
        .map(ZoneRow::into_document)
        .transpose()
}

pub fn list_zones(
    conn: &mut SqliteConnection,
) -> Result<Vec<Versioned<ParkingZone>>, PersistenceError> {
    parking_zones::table
        .select(ZoneRow::as_select())
        .order(parking_zones::zone_id.asc())
        .load(conn)?
        .into_iter()
        .map(ZoneRow::into_document)
        .collect()
}

pub fn get_booking(
    conn: &mut SqliteConnection,
    booking_id: &BookingId,
) -> Result<Option<Versioned<Booking>>, PersistenceError> {
    bookings::table
        .find(booking_id.as_str())
        .select(BookingRow::as_select())
        .first(conn)
        .optional()?
        .map(BookingRow::into_document)
        .transpose()
}

pub fn list_bookings(
    conn: &mut SqliteConnection,
    filter: &BookingFilter,
) -> Result<Vec<Versioned<Booking>>, PersistenceError> {
    let mut query = bookings::table
        .select(BookingRow::as_select())
        .order((bookings::created_at.asc(), bookings::booking_id.asc()))
        .into_boxed();

    if let Some(zone_id) = &filter.zone_id {
        query = query.filter(bookings::zone_id.eq(zone_id.as_str().to_owned()));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(bookings::user_id.eq(user_id.clone()));
    }
    if filter.holding_only {
        query = query.filter(bookings::status.eq_any([
            BookingStatus::Reserved.as_str(),
            BookingStatus::Active.as_str(),
        ]));
    }

    query
        .load(conn)?
        .into_iter()
        .map(BookingRow::into_document)
        .collect()
}
