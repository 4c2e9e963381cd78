// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Fan-out of committed zone and booking changes.
//!
//! # Delivery contract
//!
//! - Every open subscription whose filter matches receives the full record
//!   after each commit.
//! - Each subscription has its own unbounded queue, so a slow subscriber
//!   never loses events and never slows down writers or other subscribers.
//! - Per entity, events arrive in version order. A publish that loses the
//!   race to a newer version of the same entity is dropped rather than
//!   delivered late.
//! - Closing or dropping a [`Subscription`] removes its registration at
//!   once; nothing is queued for it afterwards.
//!
//! Entity ids are never reused, so the version of a deleted entity is
//! forgotten once its deletion has been delivered.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use parkwise_domain::{Booking, ParkingZone};
use parkwise_persistence::{BOOKINGS, Committed, Versioned, ZONES};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// One committed change, carrying the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    ZoneUpserted(Versioned<ParkingZone>),
    /// The zone as it was last stored.
    ZoneDeleted(Versioned<ParkingZone>),
    BookingUpserted(Versioned<Booking>),
    /// The booking as it was last stored.
    BookingDeleted(Versioned<Booking>),
}

impl ChangeEvent {
    /// `(collection, id)` of the changed entity.
    #[must_use]
    pub fn key(&self) -> (&'static str, &str) {
        match self {
            Self::ZoneUpserted(z) | Self::ZoneDeleted(z) => (ZONES, z.data.id.as_str()),
            Self::BookingUpserted(b) | Self::BookingDeleted(b) => (BOOKINGS, b.data.id.as_str()),
        }
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        match self {
            Self::ZoneUpserted(z) | Self::ZoneDeleted(z) => z.version,
            Self::BookingUpserted(b) | Self::BookingDeleted(b) => b.version,
        }
    }

    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        matches!(self, Self::ZoneDeleted(_) | Self::BookingDeleted(_))
    }

    #[must_use]
    pub const fn booking(&self) -> Option<&Booking> {
        match self {
            Self::BookingUpserted(b) | Self::BookingDeleted(b) => Some(&b.data),
            Self::ZoneUpserted(_) | Self::ZoneDeleted(_) => None,
        }
    }
}

impl From<Committed> for ChangeEvent {
    fn from(committed: Committed) -> Self {
        match committed {
            Committed::Zone(z) => Self::ZoneUpserted(z),
            Committed::ZoneDeleted(z) => Self::ZoneDeleted(z),
            Committed::Booking(b) => Self::BookingUpserted(b),
            Committed::BookingDeleted(b) => Self::BookingDeleted(b),
        }
    }
}

/// What a subscription wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum FeedFilter {
    /// Every zone change.
    Zones,
    /// Booking changes, optionally only those of one user.
    Bookings { user_id: Option<String> },
}

impl FeedFilter {
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match (self, event.booking()) {
            (Self::Zones, None) => true,
            (Self::Bookings { user_id }, Some(booking)) => {
                user_id.as_ref().is_none_or(|u| *u == booking.user_id)
            }
            _ => false,
        }
    }
}

pub type SubscriptionId = u64;

#[derive(Debug)]
struct Subscriber {
    filter: FeedFilter,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: SubscriptionId,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    /// Highest version delivered per `(collection, id)`.
    delivered: HashMap<(&'static str, String), u64>,
}

impl Registry {
    /// With nobody listening there is no order left to protect.
    fn forget_if_idle(&mut self) {
        if self.subscribers.is_empty() {
            self.delivered.clear();
        }
    }
}

/// The change feed shared by every writer and subscriber.
#[derive(Debug, Clone, Default)]
pub struct ChangeFeed {
    registry: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A panicking subscriber cannot leave the registry half-updated.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a subscription. Only changes published after this call are
    /// delivered.
    #[must_use]
    pub fn subscribe(&self, filter: FeedFilter) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.registry);
        let id: SubscriptionId = registry.next_id;
        registry.next_id += 1;
        debug!(subscription = id, ?filter, "Opened change feed subscription");
        registry.subscribers.insert(id, Subscriber { filter, tx });
        drop(registry);

        Subscription {
            id,
            registry: Arc::clone(&self.registry),
            rx,
            closed: false,
        }
    }

    /// Delivers committed changes to every matching subscription.
    ///
    /// Versions are only tracked for entities some subscription is
    /// listening to, and are forgotten once the entity is deleted.
    pub fn publish<I>(&self, events: I)
    where
        I: IntoIterator<Item = ChangeEvent>,
    {
        let mut registry = lock(&self.registry);
        for event in events {
            if !registry.subscribers.values().any(|sub| sub.filter.matches(&event)) {
                continue;
            }

            let (collection, id) = event.key();
            let key: (&'static str, String) = (collection, id.to_string());
            let version: u64 = event.version();
            let last: u64 = registry.delivered.get(&key).copied().unwrap_or(0);
            if version <= last {
                trace!(collection, id, version, last, "Dropping stale change");
                continue;
            }
            if event.is_deletion() {
                registry.delivered.remove(&key);
            } else {
                registry.delivered.insert(key, version);
            }

            registry.subscribers.retain(|sub_id, sub| {
                if !sub.filter.matches(&event) {
                    return true;
                }
                let open: bool = sub.tx.send(event.clone()).is_ok();
                if !open {
                    debug!(subscription = *sub_id, "Removing subscription with dropped receiver");
                }
                open
            });
        }
        registry.forget_if_idle();
    }

    /// Converts and publishes the result of a commit.
    pub fn publish_committed(&self, committed: Vec<Committed>) {
        self.publish(committed.into_iter().map(ChangeEvent::from));
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }

    /// Number of entities whose last delivered version is remembered.
    #[must_use]
    pub fn tracked_entities(&self) -> usize {
        lock(&self.registry).delivered.len()
    }
}

/// A live registration on the [`ChangeFeed`].
///
/// Events are queued until read. Dropping the handle closes it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Arc<Mutex<Registry>>,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    closed: bool,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Takes the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        if self.closed {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Stops delivery and deregisters. Queued events are discarded.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut registry = lock(&self.registry);
        registry.subscribers.remove(&self.id);
        registry.forget_if_idle();
        drop(registry);
        self.rx.close();
        debug!(subscription = self.id, "Closed change feed subscription");
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this: &mut Self = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}
