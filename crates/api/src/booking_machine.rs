// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking records and their lifecycle.
//!
//! Creation takes the zone's slot and inserts the booking in one
//! conditional commit. Transitions that end a booking give the slot back
//! in the same commit as the status change. The transition table itself
//! lives in the domain crate; this module only reads, applies and
//! persists.

use std::sync::Arc;

use parkwise::{
    BookingCommand, ReservationResult, TransitionOutcome, TransitionResult, apply_reservation,
    apply_transition,
};
use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};
use parkwise_persistence::{
    BookingFilter, Committed, DocumentStore, Precondition, Versioned, WriteBatch,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::change_feed::ChangeFeed;
use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::request_response::{ExpireOverdueResponse, ExpiryFailure};
use crate::retry::{cas_loop, read_with_retry, try_commit};
use crate::zone_store::{SlotMove, stage_slot_move};

/// Inputs of a new booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub zone_id: ZoneId,
    pub user_id: String,
    pub user_email: String,
    pub duration_hours: u32,
}

/// Owner of `bookings` and of their status and payment transitions.
pub struct BookingStateMachine<S> {
    store: Arc<S>,
    feed: ChangeFeed,
    config: ReservationConfig,
}

impl<S> Clone for BookingStateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            feed: self.feed.clone(),
            config: self.config,
        }
    }
}

impl<S: DocumentStore> BookingStateMachine<S> {
    #[must_use]
    pub const fn new(store: Arc<S>, feed: ChangeFeed, config: ReservationConfig) -> Self {
        Self {
            store,
            feed,
            config,
        }
    }

    /// Reads one booking with its version.
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound`, or `StoreUnavailable` once read retries run out.
    pub async fn get(&self, booking_id: &BookingId) -> Result<Versioned<Booking>, ReservationError> {
        read_with_retry(&self.config, "get_booking", || {
            self.store.get_booking(booking_id)
        })
        .await?
        .ok_or_else(|| ReservationError::BookingNotFound {
            booking_id: booking_id.to_string(),
        })
    }

    /// Bookings matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` once read retries run out.
    pub async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, ReservationError> {
        let found: Vec<Versioned<Booking>> = read_with_retry(&self.config, "list_bookings", || {
            self.store.list_bookings(filter)
        })
        .await?;
        Ok(found.into_iter().map(|b| b.data).collect())
    }

    async fn get_zone(&self, zone_id: &ZoneId) -> Result<Versioned<ParkingZone>, ReservationError> {
        read_with_retry(&self.config, "get_zone", || self.store.get_zone(zone_id))
            .await?
            .ok_or_else(|| ReservationError::ZoneNotFound {
                zone_id: zone_id.to_string(),
            })
    }

    fn committed_booking(committed: Vec<Committed>) -> Result<Booking, ReservationError> {
        committed
            .into_iter()
            .find_map(|c| match c {
                Committed::Booking(b) => Some(b.data),
                _ => None,
            })
            .ok_or_else(|| ReservationError::Internal {
                message: String::from("commit returned no booking"),
            })
    }

    /// Takes a slot in the zone and records a `reserved`, unpaid booking.
    ///
    /// The amount is frozen from the price read in the attempt that
    /// commits.
    ///
    /// # Errors
    ///
    /// Returns `ZoneNotFound`, `ZoneClosed`, `SlotUnavailable`, `InvalidInput`
    /// or, after the CAS budget, `Contention`.
    pub async fn create(&self, request: &NewBooking) -> Result<Booking, ReservationError> {
        let booking_id: BookingId = BookingId::generate();
        let booking_id: &BookingId = &booking_id;
        cas_loop(&self.config, "create_booking", move || async move {
            let zone: Versioned<ParkingZone> = self.get_zone(&request.zone_id).await?;
            let reserved: ReservationResult = apply_reservation(
                &zone.data,
                booking_id.clone(),
                request.user_id.clone(),
                request.user_email.clone(),
                request.duration_hours,
                OffsetDateTime::now_utc(),
            )?;

            let batch: WriteBatch =
                stage_slot_move(WriteBatch::new(), &zone, reserved.zone, SlotMove::Take)?
                    .put_booking(reserved.booking, Precondition::Absent);
            match try_commit(&*self.store, &self.feed, batch).await? {
                Some(committed) => {
                    let booking: Booking = Self::committed_booking(committed)?;
                    info!(
                        booking_id = %booking.id,
                        zone_id = %booking.zone_id,
                        amount = booking.amount,
                        "Created booking"
                    );
                    Ok(Some(booking))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// Reads, applies `command` and commits, retrying on conflicts.
    async fn transition(
        &self,
        booking_id: &BookingId,
        command: BookingCommand,
    ) -> Result<Booking, ReservationError> {
        cas_loop(&self.config, command.name(), move || async move {
            let booking: Versioned<Booking> = self.get(booking_id).await?;
            let zone: Option<Versioned<ParkingZone>> = if command.touches_zone() {
                Some(self.get_zone(&booking.data.zone_id).await?)
            } else {
                None
            };

            let result: TransitionResult = apply_transition(
                &booking.data,
                zone.as_ref().map(|z| &z.data),
                command,
                OffsetDateTime::now_utc(),
            )?;
            if result.outcome == TransitionOutcome::Unchanged {
                debug!(%booking_id, %command, "Transition already in effect");
                return Ok(Some(result.booking));
            }

            let mut batch: WriteBatch = WriteBatch::new()
                .put_booking(result.booking, Precondition::Version(booking.version));
            if let (Some(new_zone), Some(zone)) = (result.zone, zone) {
                batch = stage_slot_move(batch, &zone, new_zone, SlotMove::GiveBack)?;
            }
            match try_commit(&*self.store, &self.feed, batch).await? {
                Some(committed) => {
                    let updated: Booking = Self::committed_booking(committed)?;
                    info!(%booking_id, %command, status = %updated.status, "Applied booking transition");
                    Ok(Some(updated))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// reserved -> active. The slot stays held.
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound` or `InvalidTransition`.
    pub async fn activate(&self, booking_id: &BookingId) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::Activate).await
    }

    /// Records payment. Calling it on an already paid booking returns the
    /// booking unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for an unpaid booking that already ended.
    pub async fn mark_paid(&self, booking_id: &BookingId) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::MarkPaid).await
    }

    /// Ends the booking normally and releases its slot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the booking already ended.
    pub async fn complete(&self, booking_id: &BookingId) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::Complete).await
    }

    /// Records payment, ends the booking, releases its slot and adds the
    /// amount to the zone's revenue, all in one commit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the booking already ended.
    pub async fn mark_paid_and_complete(
        &self,
        booking_id: &BookingId,
    ) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::MarkPaidAndComplete)
            .await
    }

    /// Withdraws the booking and releases its slot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the booking already ended.
    pub async fn cancel(&self, booking_id: &BookingId) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::Cancel).await
    }

    /// Ends a booking whose time ran out and releases its slot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the booking already ended.
    pub async fn expire(&self, booking_id: &BookingId) -> Result<Booking, ReservationError> {
        self.transition(booking_id, BookingCommand::Expire).await
    }

    /// Expires every held booking whose duration elapsed before `now`.
    ///
    /// Bookings that end some other way while the sweep runs are skipped.
    /// A booking whose expiry fails is reported and the sweep moves on.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the held bookings cannot be listed.
    pub async fn expire_overdue(
        &self,
        now: OffsetDateTime,
    ) -> Result<ExpireOverdueResponse, ReservationError> {
        let held: Vec<Booking> = self.list(&BookingFilter::all().holding()).await?;
        let mut sweep: ExpireOverdueResponse = ExpireOverdueResponse::default();
        for booking in held.iter().filter(|b| b.is_overdue(now)) {
            match self.expire(&booking.id).await {
                Ok(updated) => sweep.expired.push(updated),
                Err(ReservationError::InvalidTransition { .. }) => {
                    debug!(booking_id = %booking.id, "Booking ended before expiry");
                }
                Err(err) => {
                    warn!(
                        booking_id = %booking.id,
                        error = %err,
                        "Could not expire overdue booking"
                    );
                    sweep.failed.push(ExpiryFailure {
                        booking_id: booking.id.to_string(),
                        code: err.code().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        if !sweep.expired.is_empty() || !sweep.failed.is_empty() {
            info!(
                expired = sweep.expired.len(),
                failed = sweep.failed.len(),
                "Expired overdue bookings"
            );
        }
        Ok(sweep)
    }
}
