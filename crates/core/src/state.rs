// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::{Booking, ParkingZone};

/// The result of a successful reservation.
///
/// Both documents must be written together: the zone carries one fewer
/// available slot, and the booking is the one holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationResult {
    /// The zone after the slot was taken.
    pub zone: ParkingZone,
    /// The new `reserved` booking.
    pub booking: Booking,
}

/// Whether a transition actually changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// New documents were produced and must be persisted.
    Applied,
    /// The command was already in effect; nothing to persist.
    Unchanged,
}

/// The result of a successful booking transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    /// The booking after the transition.
    pub booking: Booking,
    /// The zone after the transition, when the transition touched it.
    pub zone: Option<ParkingZone>,
    pub outcome: TransitionOutcome,
}
