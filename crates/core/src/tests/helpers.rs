// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::{BookingId, NewZone, ParkingZone, ZoneId, ZoneStatus};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{ReservationResult, apply_reservation};

pub fn create_test_zone(total_slots: u32) -> ParkingZone {
    ParkingZone::create(
        ZoneId::new("zone-a"),
        NewZone {
            name: String::from("Market Street"),
            ward_id: String::from("W7"),
            ward_name: String::from("Harbour"),
            lat: 18.94,
            lng: 72.83,
            total_slots,
            price_per_hour: 20,
            psi: 55,
            status: ZoneStatus::Open,
        },
    )
    .unwrap()
}

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-05-04 09:30 UTC)
}

pub fn reserve(zone: &ParkingZone, booking_id: &str, duration_hours: u32) -> ReservationResult {
    apply_reservation(
        zone,
        BookingId::new(booking_id),
        String::from("u1"),
        String::from("u1@example.com"),
        duration_hours,
        test_now(),
    )
    .unwrap()
}
