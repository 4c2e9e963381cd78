// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reservation boundary of the ParkWise engine.
//!
//! - [`ZoneStore`] owns zone records and is the only writer of slot
//!   counters outside booking transitions.
//! - [`BookingStateMachine`] creates bookings and drives them through their
//!   lifecycle, taking and releasing slots in the same commit.
//! - [`ChangeFeed`] fans committed changes out to subscribers.
//! - [`ReservationService`] validates, authorizes and delegates; it is the
//!   only surface the server talks to.
//!
//! Capacity is kept consistent with compare-and-swap on the zone version:
//! at any time a zone's occupied slots equal the number of its bookings that
//! are `reserved` or `active`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod booking_machine;
mod change_feed;
mod config;
mod error;
mod request_response;
mod retry;
mod service;
mod snapshot;
mod zone_store;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthorizationService, Role};
pub use booking_machine::{BookingStateMachine, NewBooking};
pub use change_feed::{ChangeEvent, ChangeFeed, FeedFilter, Subscription, SubscriptionId};
pub use config::ReservationConfig;
pub use error::{AuthError, ReservationError};
pub use request_response::{
    AdjustCapacityRequest, BookZoneRequest, BookingResponse, DEFAULT_NEARBY_LIMIT,
    ExpireOverdueResponse, ExpiryFailure, ListBookingsQuery, NearbyQuery, NearbyZoneResponse,
    ZoneResponse,
};
pub use service::ReservationService;
pub use snapshot::{Snapshot, SnapshotSubscription};
pub use zone_store::{ZoneStore, ZoneUpdate};
