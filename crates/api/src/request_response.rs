// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response shapes of the reservation boundary.

use parkwise_domain::{Booking, Coordinates, NearbyZone, ParkingZone};
use serde::{Deserialize, Serialize};

/// Default number of zones returned by a nearby search.
pub const DEFAULT_NEARBY_LIMIT: usize = 20;

const fn default_nearby_limit() -> usize {
    DEFAULT_NEARBY_LIMIT
}

/// A citizen's request for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookZoneRequest {
    pub zone_id: String,
    /// Defaults to the acting user.
    #[serde(default)]
    pub user_id: Option<String>,
    pub user_email: String,
    pub duration_hours: u32,
    /// Where the citizen is, for the optional distance check.
    #[serde(default)]
    pub center: Option<Coordinates>,
    /// Refuse zones further than this from `center`.
    #[serde(default)]
    pub max_radius_km: Option<f64>,
}

/// Zones around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    #[serde(default = "default_nearby_limit")]
    pub limit: usize,
}

/// Admin overwrite of a zone's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustCapacityRequest {
    pub total_slots: u32,
    pub available_slots: u32,
}

/// Booking listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBookingsQuery {
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Ignored for citizens, who only ever see their own bookings.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Only bookings that still hold a slot.
    #[serde(default)]
    pub holding_only: bool,
}

/// A zone with its derived occupancy figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneResponse {
    #[serde(flatten)]
    pub zone: ParkingZone,
    pub occupied_slots: u32,
    pub occupancy_ratio: f64,
}

impl From<ParkingZone> for ZoneResponse {
    fn from(zone: ParkingZone) -> Self {
        Self {
            occupied_slots: zone.occupied_slots(),
            occupancy_ratio: zone.occupancy_ratio(),
            zone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyZoneResponse {
    pub zone: ZoneResponse,
    pub distance_km: f64,
}

impl From<NearbyZone> for NearbyZoneResponse {
    fn from(nearby: NearbyZone) -> Self {
        Self {
            zone: nearby.zone.into(),
            distance_km: nearby.distance_km,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self { booking }
    }
}

/// Outcome of an expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireOverdueResponse {
    pub expired: Vec<Booking>,
    /// Overdue bookings left held because their expiry failed. The next
    /// sweep picks them up again.
    #[serde(default)]
    pub failed: Vec<ExpiryFailure>,
}

/// One overdue booking the sweep could not expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryFailure {
    pub booking_id: String,
    pub code: String,
    pub message: String,
}
