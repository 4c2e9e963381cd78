// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Whole-collection snapshots on every change.
//!
//! This is what list views consume: instead of deltas, each change to the
//! watched collection re-reads and re-delivers the whole (filtered)
//! collection. Bursts of changes that queue up while a snapshot is being
//! read are coalesced into the next one. The cost of each delivery grows
//! with the collection, which bounds how far this approach scales.

use std::sync::Arc;

use parkwise_domain::{Booking, ParkingZone};
use parkwise_persistence::{BookingFilter, DocumentStore, Versioned};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::change_feed::{FeedFilter, Subscription};
use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::retry::read_with_retry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "items", rename_all = "snake_case")]
pub enum Snapshot {
    Zones(Vec<ParkingZone>),
    Bookings(Vec<Booking>),
}

/// A subscription that yields full snapshots instead of single changes.
///
/// The first call to [`next`](Self::next) returns the current state at
/// once; later calls wait for a change.
pub struct SnapshotSubscription<S> {
    store: Arc<S>,
    config: ReservationConfig,
    subscription: Subscription,
    filter: FeedFilter,
    primed: bool,
}

impl<S: DocumentStore> SnapshotSubscription<S> {
    pub(crate) const fn new(
        store: Arc<S>,
        config: ReservationConfig,
        subscription: Subscription,
        filter: FeedFilter,
    ) -> Self {
        Self {
            store,
            config,
            subscription,
            filter,
            primed: false,
        }
    }

    /// Waits for the next snapshot. Returns `None` once closed.
    pub async fn next(&mut self) -> Option<Result<Snapshot, ReservationError>> {
        if self.primed {
            self.subscription.recv().await?;
            let mut coalesced: usize = 0;
            while self.subscription.try_recv().is_some() {
                coalesced += 1;
            }
            trace!(coalesced, "Coalesced queued changes into one snapshot");
        } else {
            self.primed = true;
        }
        if self.subscription.is_closed() {
            return None;
        }
        Some(self.load().await)
    }

    async fn load(&self) -> Result<Snapshot, ReservationError> {
        match &self.filter {
            FeedFilter::Zones => {
                let zones: Vec<Versioned<ParkingZone>> =
                    read_with_retry(&self.config, "snapshot_zones", || self.store.list_zones())
                        .await?;
                Ok(Snapshot::Zones(zones.into_iter().map(|z| z.data).collect()))
            }
            FeedFilter::Bookings { user_id } => {
                let filter: BookingFilter = BookingFilter {
                    user_id: user_id.clone(),
                    ..BookingFilter::all()
                };
                let bookings: Vec<Versioned<Booking>> =
                    read_with_retry(&self.config, "snapshot_bookings", || {
                        self.store.list_bookings(&filter)
                    })
                    .await?;
                Ok(Snapshot::Bookings(
                    bookings.into_iter().map(|b| b.data).collect(),
                ))
            }
        }
    }

    /// Stops delivery and deregisters from the feed.
    pub fn close(&mut self) {
        self.subscription.close();
    }
}
