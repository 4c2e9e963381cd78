// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the reservation boundary.

use parkwise::CoreError;
use parkwise_domain::DomainError;
use parkwise_persistence::PersistenceError;
use thiserror::Error;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The actor's role does not permit the action.
    #[error("Unauthorized: '{action}' requires {required_role} role")]
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A citizen tried to act on someone else's booking.
    #[error("Unauthorized: '{action}' is limited to the booking owner")]
    NotOwner {
        /// The action that was attempted.
        action: String,
    },
}

/// Every failure a reservation operation can report.
///
/// Each variant carries enough context for a specific user-facing message,
/// so a citizen can be told "no slots" apart from "zone closed" apart from
/// "try again".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReservationError {
    #[error("Parking zone {zone_id} does not exist")]
    ZoneNotFound { zone_id: String },
    #[error("Parking zone {zone_id} is closed")]
    ZoneClosed { zone_id: String },
    #[error("No slots are available in parking zone {zone_id}")]
    SlotUnavailable { zone_id: String },
    #[error("Invalid capacity: {message}")]
    InvalidCapacity { message: String },
    #[error("Booking {booking_id} does not exist")]
    BookingNotFound { booking_id: String },
    #[error("Booking cannot move from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },
    /// The CAS retry budget ran out.
    #[error("Too many concurrent updates during {operation}; try again")]
    Contention {
        operation: &'static str,
        attempts: u32,
    },
    #[error("Storage is unavailable: {message}")]
    StoreUnavailable { message: String },
    #[error("Parking zone {zone_id} still has {held} active bookings")]
    ZoneInUse { zone_id: String, held: usize },
    #[error("Parking zone {zone_id} is {distance_km:.2} km away, beyond {max_radius_km} km")]
    ZoneOutOfRange {
        zone_id: String,
        distance_km: f64,
        max_radius_km: f64,
    },
    #[error("Invalid input for field '{field}': {message}")]
    InvalidInput { field: String, message: String },
    #[error("{0}")]
    Unauthorized(#[from] AuthError),
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ReservationError {
    /// Stable machine-readable code for clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ZoneNotFound { .. } => "zone_not_found",
            Self::ZoneClosed { .. } => "zone_closed",
            Self::SlotUnavailable { .. } => "slot_unavailable",
            Self::InvalidCapacity { .. } => "invalid_capacity",
            Self::BookingNotFound { .. } => "booking_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Contention { .. } => "contention",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::ZoneInUse { .. } => "zone_in_use",
            Self::ZoneOutOfRange { .. } => "zone_out_of_range",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether repeating the same call later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Contention { .. } | Self::StoreUnavailable { .. }
        )
    }

    pub(crate) fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<DomainError> for ReservationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ZoneClosed { zone_id } => Self::ZoneClosed { zone_id },
            DomainError::SlotUnavailable { zone_id } => Self::SlotUnavailable { zone_id },
            DomainError::InvalidCapacity { .. } => Self::InvalidCapacity {
                message: err.to_string(),
            },
            DomainError::InvalidTransition { from, to, reason } => {
                Self::InvalidTransition { from, to, reason }
            }
            DomainError::InvalidCoordinates { .. } => Self::invalid_input("coordinates", err.to_string()),
            DomainError::InvalidPsi(_) => Self::invalid_input("psi", err.to_string()),
            DomainError::InvalidField { field, message } => Self::invalid_input(field, message),
            DomainError::InvalidDuration(_) | DomainError::AmountOverflow { .. } => {
                Self::invalid_input("duration_hours", err.to_string())
            }
            DomainError::InvalidRadius(_) => Self::invalid_input("radius_km", err.to_string()),
            DomainError::InvalidStatus { .. } => Self::invalid_input("status", err.to_string()),
        }
    }
}

impl From<CoreError> for ReservationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DomainViolation(domain_err) => domain_err.into(),
            CoreError::MissingZone { zone_id, .. } => Self::ZoneNotFound { zone_id },
            CoreError::ZoneMismatch { .. } => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

/// Store failures that reach the boundary without being handled.
///
/// Version conflicts are normally consumed by CAS loops; one that escapes
/// is reported as contention.
impl From<PersistenceError> for ReservationError {
    fn from(err: PersistenceError) -> Self {
        if err.is_transient() {
            return Self::StoreUnavailable {
                message: err.to_string(),
            };
        }
        match err {
            PersistenceError::VersionConflict { .. } => Self::Contention {
                operation: "commit",
                attempts: 1,
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}
