// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::booking_status::{BookingStatus, PaymentStatus};
use crate::error::DomainError;
use crate::validation::{compute_amount, validate_capacity, validate_duration, validate_zone_fields};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

/// Opaque identifier of a parking zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Creates a validated coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoordinates` if either value is not finite
    /// or lies outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, DomainError> {
        let lat_ok: bool = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok: bool = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if !lat_ok || !lng_ok {
            return Err(DomainError::InvalidCoordinates { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

/// Administrative availability of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    #[default]
    Open,
    Closed,
}

impl ZoneStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for ZoneStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(DomainError::InvalidStatus {
                kind: "zone status",
                value: s.to_string(),
            }),
        }
    }
}

/// Admin-supplied fields for a zone that does not exist yet.
///
/// A new zone starts with every slot available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    pub name: String,
    pub ward_id: String,
    pub ward_name: String,
    pub lat: f64,
    pub lng: f64,
    pub total_slots: u32,
    pub price_per_hour: u64,
    #[serde(default)]
    pub psi: u8,
    #[serde(default)]
    pub status: ZoneStatus,
}

/// A physical parking area with a fixed slot capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingZone {
    pub id: ZoneId,
    pub name: String,
    pub ward_id: String,
    pub ward_name: String,
    pub lat: f64,
    pub lng: f64,
    pub total_slots: u32,
    pub available_slots: u32,
    pub price_per_hour: u64,
    /// Parking stress index, advisory only.
    pub psi: u8,
    pub status: ZoneStatus,
    /// Sum of booking amounts settled through paid completion.
    #[serde(default)]
    pub revenue: u64,
}

impl ParkingZone {
    /// Builds a zone from admin input, with all slots available.
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails validation.
    pub fn create(id: ZoneId, new_zone: NewZone) -> Result<Self, DomainError> {
        let zone: Self = Self {
            id,
            name: new_zone.name,
            ward_id: new_zone.ward_id,
            ward_name: new_zone.ward_name,
            lat: new_zone.lat,
            lng: new_zone.lng,
            total_slots: new_zone.total_slots,
            available_slots: new_zone.total_slots,
            price_per_hour: new_zone.price_per_hour,
            psi: new_zone.psi,
            status: new_zone.status,
            revenue: 0,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Checks every field-level rule, including `0 <= available <= total`.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_zone_fields(self)?;
        validate_capacity(self.total_slots, self.available_slots)
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, ZoneStatus::Open)
    }

    /// Open and at least one slot free.
    #[must_use]
    pub const fn is_bookable(&self) -> bool {
        self.is_open() && self.available_slots > 0
    }

    /// Slots currently held by bookings.
    #[must_use]
    pub const fn occupied_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.available_slots)
    }

    /// Fraction of capacity in use, `0.0` for a zone without slots.
    #[must_use]
    pub fn occupancy_ratio(&self) -> f64 {
        if self.total_slots == 0 {
            return 0.0;
        }
        f64::from(self.occupied_slots()) / f64::from(self.total_slots)
    }
}

/// A citizen's reservation of one slot in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub zone_id: ZoneId,
    pub user_id: String,
    pub user_email: String,
    pub duration_hours: u32,
    /// Frozen at creation from the zone price at that time.
    pub amount: u64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub paid_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub completed_at: Option<OffsetDateTime>,
    /// Set when the booking is cancelled or expires.
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub ended_at: Option<OffsetDateTime>,
}

impl Booking {
    /// Creates a `reserved`, unpaid booking against `zone`.
    ///
    /// Does not check zone availability; that belongs to the capacity
    /// reservation that must accompany this booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration is zero or the amount overflows.
    pub fn reserve(
        id: BookingId,
        zone: &ParkingZone,
        user_id: String,
        user_email: String,
        duration_hours: u32,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        validate_duration(duration_hours)?;
        let amount: u64 = compute_amount(zone.price_per_hour, duration_hours)?;
        Ok(Self {
            id,
            zone_id: zone.id.clone(),
            user_id,
            user_email,
            duration_hours,
            amount,
            status: BookingStatus::Reserved,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            paid_at: None,
            completed_at: None,
            ended_at: None,
        })
    }

    #[must_use]
    pub const fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }

    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self.payment_status, PaymentStatus::Paid)
    }

    /// The instant the booked duration runs out.
    #[must_use]
    pub fn ends_at(&self) -> OffsetDateTime {
        self.created_at
            .saturating_add(Duration::hours(i64::from(self.duration_hours)))
    }

    /// Still holding a slot after its duration ran out.
    #[must_use]
    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        self.holds_slot() && self.ends_at() <= now
    }
}
