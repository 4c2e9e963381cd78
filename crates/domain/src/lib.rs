// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod booking_status;
mod error;
mod geo;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use booking_status::{BookingStatus, PaymentStatus};
pub use error::DomainError;
pub use geo::{EARTH_RADIUS_KM, NearbyZone, distance_km, nearest};
pub use types::{Booking, BookingId, Coordinates, NewZone, ParkingZone, ZoneId, ZoneStatus};
pub use validation::{
    MAX_PSI, compute_amount, validate_capacity, validate_duration, validate_email,
    validate_radius, validate_zone_fields,
};
