// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::{NewZone, ParkingZone, ZoneId, ZoneStatus};

pub fn create_test_zone(id: &str, lat: f64, lng: f64) -> ParkingZone {
    ParkingZone::create(
        ZoneId::new(id),
        NewZone {
            name: format!("Zone {id}"),
            ward_id: String::from("W1"),
            ward_name: String::from("Central"),
            lat,
            lng,
            total_slots: 10,
            price_per_hour: 20,
            psi: 40,
            status: ZoneStatus::Open,
        },
    )
    .unwrap()
}
