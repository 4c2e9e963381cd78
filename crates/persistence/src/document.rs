// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Versioned documents and conditional write batches.
//!
//! Every stored document carries a version that increases by one on each
//! write. A [`WriteBatch`] names, per document, the version it expects to
//! replace; the store applies the whole batch or none of it.

use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};
use serde::{Deserialize, Serialize};

/// A document together with its store version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub data: T,
}

impl<T> Versioned<T> {
    #[must_use]
    pub const fn new(version: u64, data: T) -> Self {
        Self { version, data }
    }
}

/// What a conditional write expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must not exist yet.
    Absent,
    /// The document must exist at exactly this version.
    Version(u64),
}

/// One conditional write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    PutZone {
        zone: ParkingZone,
        expected: Precondition,
    },
    DeleteZone {
        zone_id: ZoneId,
        expected_version: u64,
    },
    PutBooking {
        booking: Booking,
        expected: Precondition,
    },
    DeleteBooking {
        booking_id: BookingId,
        expected_version: u64,
    },
}

impl Write {
    /// `(collection, id)` of the document this write targets.
    #[must_use]
    pub fn key(&self) -> (&'static str, &str) {
        match self {
            Self::PutZone { zone, .. } => (ZONES, zone.id.as_str()),
            Self::DeleteZone { zone_id, .. } => (ZONES, zone_id.as_str()),
            Self::PutBooking { booking, .. } => (BOOKINGS, booking.id.as_str()),
            Self::DeleteBooking { booking_id, .. } => (BOOKINGS, booking_id.as_str()),
        }
    }
}

/// Collection name of parking zones.
pub const ZONES: &str = "parking_zones";
/// Collection name of bookings.
pub const BOOKINGS: &str = "bookings";

/// An all-or-nothing group of conditional writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    #[must_use]
    pub const fn new() -> Self {
        Self { writes: Vec::new() }
    }

    #[must_use]
    pub fn put_zone(mut self, zone: ParkingZone, expected: Precondition) -> Self {
        self.writes.push(Write::PutZone { zone, expected });
        self
    }

    #[must_use]
    pub fn delete_zone(mut self, zone_id: ZoneId, expected_version: u64) -> Self {
        self.writes.push(Write::DeleteZone {
            zone_id,
            expected_version,
        });
        self
    }

    #[must_use]
    pub fn put_booking(mut self, booking: Booking, expected: Precondition) -> Self {
        self.writes.push(Write::PutBooking { booking, expected });
        self
    }

    #[must_use]
    pub fn delete_booking(mut self, booking_id: BookingId, expected_version: u64) -> Self {
        self.writes.push(Write::DeleteBooking {
            booking_id,
            expected_version,
        });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter()
    }

    #[must_use]
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    /// Rejects batches that target the same document twice.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::InvalidBatch` naming the duplicated document.
    pub fn check_distinct(&self) -> Result<(), crate::PersistenceError> {
        let mut seen: std::collections::HashSet<(&'static str, &str)> =
            std::collections::HashSet::with_capacity(self.writes.len());
        for write in &self.writes {
            let key = write.key();
            if !seen.insert(key) {
                return Err(crate::PersistenceError::InvalidBatch(format!(
                    "{}/{} written twice",
                    key.0, key.1
                )));
            }
        }
        Ok(())
    }
}

/// A document as it stands after a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Committed {
    Zone(Versioned<ParkingZone>),
    /// The last stored zone, at one past its last stored version.
    ZoneDeleted(Versioned<ParkingZone>),
    Booking(Versioned<Booking>),
    /// The last stored booking, at one past its last stored version.
    BookingDeleted(Versioned<Booking>),
}

/// Which bookings a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub zone_id: Option<ZoneId>,
    pub user_id: Option<String>,
    /// Only bookings in a slot-holding status.
    pub holding_only: bool,
}

impl BookingFilter {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            zone_id: None,
            user_id: None,
            holding_only: false,
        }
    }

    #[must_use]
    pub fn for_zone(zone_id: ZoneId) -> Self {
        Self {
            zone_id: Some(zone_id),
            ..Self::all()
        }
    }

    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::all()
        }
    }

    #[must_use]
    pub const fn holding(mut self) -> Self {
        self.holding_only = true;
        self
    }

    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.zone_id.as_ref().is_none_or(|z| *z == booking.zone_id)
            && self.user_id.as_ref().is_none_or(|u| *u == booking.user_id)
            && (!self.holding_only || booking.holds_slot())
    }
}
