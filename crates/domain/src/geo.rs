// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Great-circle distance and nearest-zone search.
//!
//! Everything here is a pure function of its inputs. Results are recomputed
//! on every call because both the zone set and the search center change
//! frequently.

use crate::types::{Coordinates, ParkingZone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Mean earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A zone paired with its distance from a search center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyZone {
    pub zone: ParkingZone,
    pub distance_km: f64,
}

/// Haversine distance between two points in kilometres.
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1: f64 = a.lat.to_radians();
    let lat2: f64 = b.lat.to_radians();
    let d_lat: f64 = (b.lat - a.lat).to_radians();
    let d_lng: f64 = (b.lng - a.lng).to_radians();

    let h: f64 = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h marginally outside [0, 1] for antipodal points.
    let c: f64 = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Open zones within `radius_km` of `center`, nearest first.
///
/// Ties on distance are broken by zone id so that identical inputs always
/// produce identical output. At most `limit` entries are returned. Closed
/// zones are left out even when they are in range.
#[must_use]
pub fn nearest<'a, I>(center: Coordinates, zones: I, radius_km: f64, limit: usize) -> Vec<NearbyZone>
where
    I: IntoIterator<Item = &'a ParkingZone>,
{
    let mut hits: Vec<NearbyZone> = zones
        .into_iter()
        .filter(|zone| zone.is_open())
        .filter_map(|zone| {
            let distance: f64 = distance_km(center, zone.coordinates());
            (distance <= radius_km).then(|| NearbyZone {
                zone: zone.clone(),
                distance_km: distance,
            })
        })
        .collect();

    hits.sort_by(|a, b| match a.distance_km.total_cmp(&b.distance_km) {
        Ordering::Equal => a.zone.id.cmp(&b.zone.id),
        other => other,
    });
    hits.truncate(limit);
    hits
}
