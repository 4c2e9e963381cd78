// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types for the SQL tables and their conversion to domain documents.

use diesel::prelude::*;
use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::diesel_schema::{bookings, parking_zones};
use crate::document::Versioned;
use crate::error::PersistenceError;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = parking_zones)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ZoneRow {
    pub zone_id: String,
    pub version: i64,
    pub name: String,
    pub ward_id: String,
    pub ward_name: String,
    pub lat: f64,
    pub lng: f64,
    pub total_slots: i32,
    pub available_slots: i32,
    pub price_per_hour: i64,
    pub psi: i32,
    pub status: String,
    pub revenue: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookingRow {
    pub booking_id: String,
    pub version: i64,
    pub zone_id: String,
    pub user_id: String,
    pub user_email: String,
    pub duration_hours: i32,
    pub amount: i64,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub completed_at: Option<String>,
    pub ended_at: Option<String>,
}

fn to_column<S, T>(value: S, column: &str) -> Result<T, PersistenceError>
where
    T: TryFrom<S>,
    S: Copy + std::fmt::Display,
{
    T::try_from(value)
        .map_err(|_| PersistenceError::CorruptRow(format!("{column} out of range: {value}")))
}

pub fn version_to_column(version: u64) -> Result<i64, PersistenceError> {
    to_column(version, "version")
}

/// Stored as fixed-width UTC so that text order in SQLite is time order.
fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .map_err(|e| PersistenceError::CorruptRow(format!("unformattable timestamp: {e}")))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::CorruptRow(format!("bad timestamp '{value}': {e}")))
}

fn format_optional(value: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    value.map(format_timestamp).transpose()
}

fn parse_optional(value: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_timestamp).transpose()
}

fn parse_enum<T: std::str::FromStr>(value: &str, column: &str) -> Result<T, PersistenceError> {
    value
        .parse()
        .map_err(|_| PersistenceError::CorruptRow(format!("bad {column} '{value}'")))
}

impl ZoneRow {
    /// Builds the row that stores `zone` at `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field does not fit its column.
    pub fn from_document(zone: &ParkingZone, version: u64) -> Result<Self, PersistenceError> {
        Ok(Self {
            zone_id: zone.id.to_string(),
            version: version_to_column(version)?,
            name: zone.name.clone(),
            ward_id: zone.ward_id.clone(),
            ward_name: zone.ward_name.clone(),
            lat: zone.lat,
            lng: zone.lng,
            total_slots: to_column(zone.total_slots, "total_slots")?,
            available_slots: to_column(zone.available_slots, "available_slots")?,
            price_per_hour: to_column(zone.price_per_hour, "price_per_hour")?,
            psi: i32::from(zone.psi),
            status: zone.status.as_str().to_string(),
            revenue: to_column(zone.revenue, "revenue")?,
        })
    }

    /// Converts the row back into a versioned zone.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CorruptRow` for values no zone can hold.
    pub fn into_document(self) -> Result<Versioned<ParkingZone>, PersistenceError> {
        let zone: ParkingZone = ParkingZone {
            id: ZoneId::new(self.zone_id),
            name: self.name,
            ward_id: self.ward_id,
            ward_name: self.ward_name,
            lat: self.lat,
            lng: self.lng,
            total_slots: to_column(self.total_slots, "total_slots")?,
            available_slots: to_column(self.available_slots, "available_slots")?,
            price_per_hour: to_column(self.price_per_hour, "price_per_hour")?,
            psi: to_column(self.psi, "psi")?,
            status: parse_enum(&self.status, "status")?,
            revenue: to_column(self.revenue, "revenue")?,
        };
        Ok(Versioned::new(to_column(self.version, "version")?, zone))
    }
}

impl BookingRow {
    /// Builds the row that stores `booking` at `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field does not fit its column.
    pub fn from_document(booking: &Booking, version: u64) -> Result<Self, PersistenceError> {
        Ok(Self {
            booking_id: booking.id.to_string(),
            version: version_to_column(version)?,
            zone_id: booking.zone_id.to_string(),
            user_id: booking.user_id.clone(),
            user_email: booking.user_email.clone(),
            duration_hours: to_column(booking.duration_hours, "duration_hours")?,
            amount: to_column(booking.amount, "amount")?,
            status: booking.status.as_str().to_string(),
            payment_status: booking.payment_status.as_str().to_string(),
            created_at: format_timestamp(booking.created_at)?,
            paid_at: format_optional(booking.paid_at)?,
            completed_at: format_optional(booking.completed_at)?,
            ended_at: format_optional(booking.ended_at)?,
        })
    }

    /// Converts the row back into a versioned booking.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CorruptRow` for values no booking can hold.
    pub fn into_document(self) -> Result<Versioned<Booking>, PersistenceError> {
        let booking: Booking = Booking {
            id: BookingId::new(self.booking_id),
            zone_id: ZoneId::new(self.zone_id),
            user_id: self.user_id,
            user_email: self.user_email,
            duration_hours: to_column(self.duration_hours, "duration_hours")?,
            amount: to_column(self.amount, "amount")?,
            status: parse_enum(&self.status, "status")?,
            payment_status: parse_enum(&self.payment_status, "payment_status")?,
            created_at: parse_timestamp(&self.created_at)?,
            paid_at: parse_optional(self.paid_at.as_deref())?,
            completed_at: parse_optional(self.completed_at.as_deref())?,
            ended_at: parse_optional(self.ended_at.as_deref())?,
        };
        Ok(Versioned::new(to_column(self.version, "version")?, booking))
    }
}
