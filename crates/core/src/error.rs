// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::DomainError;
use thiserror::Error;

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A domain rule was violated.
    #[error("Domain violation: {0}")]
    DomainViolation(#[from] DomainError),
    /// A slot-releasing command was applied without its zone.
    #[error("Command {command} on booking {booking_id} requires zone {zone_id}")]
    MissingZone {
        /// The command being applied.
        command: &'static str,
        /// The booking being transitioned.
        booking_id: String,
        /// The zone the booking belongs to.
        zone_id: String,
    },
    /// The zone passed in is not the booking's zone.
    #[error("Booking belongs to zone {expected}, got zone {actual}")]
    ZoneMismatch {
        /// The booking's zone.
        expected: String,
        /// The zone that was supplied.
        actual: String,
    },
}
