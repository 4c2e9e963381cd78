// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Slot counts violate `0 <= available <= total`.
    #[error("Invalid capacity: {available_slots} available of {total_slots} total ({reason})")]
    InvalidCapacity {
        /// The requested total slot count.
        total_slots: u32,
        /// The requested available slot count.
        available_slots: u32,
        /// Which rule was broken.
        reason: &'static str,
    },
    /// Latitude or longitude out of range, or not finite.
    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates {
        /// The rejected latitude.
        lat: f64,
        /// The rejected longitude.
        lng: f64,
    },
    /// Parking stress index outside 0-100.
    #[error("Invalid PSI {0}: must be between 0 and 100")]
    InvalidPsi(u8),
    /// A required descriptive field is empty or malformed.
    #[error("Invalid {field}: {message}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
    /// Booking duration must be a positive number of hours.
    #[error("Invalid duration: {0} hours")]
    InvalidDuration(u32),
    /// Search radius must be finite and non-negative.
    #[error("Invalid radius: {0} km")]
    InvalidRadius(f64),
    /// A stored or submitted status string is unknown.
    #[error("Invalid {kind} '{value}'")]
    InvalidStatus {
        /// Which status vocabulary was being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A booking status transition is not permitted.
    #[error("Invalid status transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was refused.
        reason: String,
    },
    /// The zone is administratively closed.
    #[error("Zone {zone_id} is closed")]
    ZoneClosed {
        /// The closed zone.
        zone_id: String,
    },
    /// The zone has no free slot.
    #[error("Zone {zone_id} has no available slots")]
    SlotUnavailable {
        /// The full zone.
        zone_id: String,
    },
    /// Price multiplied by duration does not fit the amount type.
    #[error("Booking amount overflows: {price_per_hour} x {duration_hours}h")]
    AmountOverflow {
        /// Zone price per hour.
        price_per_hour: u64,
        /// Requested duration.
        duration_hours: u32,
    },
}
