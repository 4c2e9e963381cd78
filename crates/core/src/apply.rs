// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::BookingCommand;
use crate::error::CoreError;
use crate::state::{ReservationResult, TransitionOutcome, TransitionResult};
use parkwise_domain::{Booking, BookingId, DomainError, ParkingZone, PaymentStatus};
use time::OffsetDateTime;

/// Takes one slot from `zone`.
///
/// # Errors
///
/// Returns an error if:
/// - The zone is closed
/// - The zone has no available slot
pub fn reserve_slot(zone: &ParkingZone) -> Result<ParkingZone, CoreError> {
    if !zone.is_open() {
        return Err(DomainError::ZoneClosed {
            zone_id: zone.id.to_string(),
        }
        .into());
    }
    if zone.available_slots == 0 {
        return Err(DomainError::SlotUnavailable {
            zone_id: zone.id.to_string(),
        }
        .into());
    }

    let mut new_zone: ParkingZone = zone.clone();
    new_zone.available_slots -= 1;
    Ok(new_zone)
}

/// Gives one slot back to `zone`, never exceeding its total.
#[must_use]
pub fn release_slot(zone: &ParkingZone) -> ParkingZone {
    let mut new_zone: ParkingZone = zone.clone();
    new_zone.available_slots = zone
        .available_slots
        .saturating_add(1)
        .min(zone.total_slots);
    new_zone
}

/// Takes a slot from `zone` and creates the booking that holds it.
///
/// The booking amount is frozen from the zone price passed in here.
///
/// # Arguments
///
/// * `zone` - The current zone document
/// * `booking_id` - Identifier for the new booking
/// * `user_id` - The reserving citizen
/// * `user_email` - Contact address of the reserving citizen
/// * `duration_hours` - Booked duration
/// * `now` - Creation timestamp
///
/// # Errors
///
/// Returns an error if the zone cannot give a slot or the booking fields are invalid.
pub fn apply_reservation(
    zone: &ParkingZone,
    booking_id: BookingId,
    user_id: String,
    user_email: String,
    duration_hours: u32,
    now: OffsetDateTime,
) -> Result<ReservationResult, CoreError> {
    let booking: Booking =
        Booking::reserve(booking_id, zone, user_id, user_email, duration_hours, now)?;
    let new_zone: ParkingZone = reserve_slot(zone)?;
    Ok(ReservationResult {
        zone: new_zone,
        booking,
    })
}

/// Applies a lifecycle command to a booking.
///
/// Commands that end the booking need the booking's zone so the held slot
/// can be given back in the same step. The slot is only released on the
/// held -> terminal edge, so re-applying a terminal command fails instead
/// of releasing twice.
///
/// # Arguments
///
/// * `booking` - The current booking document
/// * `zone` - The booking's zone, required when `command.touches_zone()`
/// * `command` - The command to apply
/// * `now` - Timestamp recorded on the booking
///
/// # Errors
///
/// Returns an error if:
/// - The transition is not permitted from the current status
/// - The command needs the zone and none (or the wrong one) was supplied
pub fn apply_transition(
    booking: &Booking,
    zone: Option<&ParkingZone>,
    command: BookingCommand,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    if command == BookingCommand::MarkPaid {
        return mark_paid(booking, now);
    }

    let Some(target) = command.target_status() else {
        return Ok(unchanged(booking));
    };
    booking.status.validate_transition(target)?;

    let mut new_booking: Booking = booking.clone();
    new_booking.status = target;

    if !target.is_terminal() {
        return Ok(TransitionResult {
            booking: new_booking,
            zone: None,
            outcome: TransitionOutcome::Applied,
        });
    }

    let zone: &ParkingZone = owning_zone(booking, zone, command)?;
    let mut new_zone: ParkingZone = release_slot(zone);

    match command {
        BookingCommand::Complete => {
            new_booking.completed_at = Some(now);
        }
        BookingCommand::MarkPaidAndComplete => {
            if !new_booking.is_paid() {
                new_booking.payment_status = PaymentStatus::Paid;
                new_booking.paid_at = Some(now);
            }
            new_booking.completed_at = Some(now);
            new_zone.revenue = new_zone.revenue.saturating_add(booking.amount);
        }
        BookingCommand::Cancel | BookingCommand::Expire => {
            new_booking.ended_at = Some(now);
        }
        BookingCommand::Activate | BookingCommand::MarkPaid => {}
    }

    Ok(TransitionResult {
        booking: new_booking,
        zone: Some(new_zone),
        outcome: TransitionOutcome::Applied,
    })
}

/// Payment can be recorded on a held booking; recording it twice is a no-op.
fn mark_paid(booking: &Booking, now: OffsetDateTime) -> Result<TransitionResult, CoreError> {
    if booking.is_paid() {
        return Ok(unchanged(booking));
    }
    if booking.status.is_terminal() {
        return Err(DomainError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            to: PaymentStatus::Paid.as_str().to_string(),
            reason: "payment can only be recorded on a held booking".to_string(),
        }
        .into());
    }

    let mut new_booking: Booking = booking.clone();
    new_booking.payment_status = PaymentStatus::Paid;
    new_booking.paid_at = Some(now);
    Ok(TransitionResult {
        booking: new_booking,
        zone: None,
        outcome: TransitionOutcome::Applied,
    })
}

fn unchanged(booking: &Booking) -> TransitionResult {
    TransitionResult {
        booking: booking.clone(),
        zone: None,
        outcome: TransitionOutcome::Unchanged,
    }
}

fn owning_zone<'a>(
    booking: &Booking,
    zone: Option<&'a ParkingZone>,
    command: BookingCommand,
) -> Result<&'a ParkingZone, CoreError> {
    let zone: &ParkingZone = zone.ok_or_else(|| CoreError::MissingZone {
        command: command.name(),
        booking_id: booking.id.to_string(),
        zone_id: booking.zone_id.to_string(),
    })?;
    if zone.id != booking.zone_id {
        return Err(CoreError::ZoneMismatch {
            expected: booking.zone_id.to_string(),
            actual: zone.id.to_string(),
        });
    }
    Ok(zone)
}
