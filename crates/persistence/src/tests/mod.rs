// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod sqlite_tests;

use parkwise_domain::{Booking, BookingId, NewZone, ParkingZone, ZoneId, ZoneStatus};
use time::OffsetDateTime;
use time::macros::datetime;

pub fn create_test_zone(id: &str, total_slots: u32) -> ParkingZone {
    ParkingZone::create(
        ZoneId::new(id),
        NewZone {
            name: format!("Zone {id}"),
            ward_id: String::from("W3"),
            ward_name: String::from("Riverside"),
            lat: 19.07,
            lng: 72.87,
            total_slots,
            price_per_hour: 30,
            psi: 60,
            status: ZoneStatus::Open,
        },
    )
    .unwrap()
}

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-14 08:00 UTC)
}

pub fn create_test_booking(id: &str, zone: &ParkingZone, user_id: &str) -> Booking {
    Booking::reserve(
        BookingId::new(id),
        zone,
        user_id.to_string(),
        format!("{user_id}@example.com"),
        2,
        test_now(),
    )
    .unwrap()
}
