// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-process document store.
//!
//! Commits take the write lock for their whole duration, so a batch is
//! checked and applied without any other commit interleaving.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use parkwise_domain::{Booking, BookingId, ParkingZone, ZoneId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::DocumentStore;
use crate::document::{
    BOOKINGS, BookingFilter, Committed, Precondition, Versioned, Write, WriteBatch, ZONES,
};
use crate::error::PersistenceError;

#[derive(Debug, Default)]
struct Collections {
    zones: BTreeMap<ZoneId, Versioned<ParkingZone>>,
    bookings: BTreeMap<BookingId, Versioned<Booking>>,
}

/// A [`DocumentStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    failing_reads: AtomicU32,
    failing_commits: AtomicU32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` reads fail with `PersistenceError::Unavailable`.
    ///
    /// Used to exercise retry paths without a real network.
    pub fn inject_read_failures(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` commits fail with `PersistenceError::Unavailable`.
    pub fn inject_commit_failures(&self, count: u32) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> Result<(), PersistenceError> {
        let took: bool = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took {
            return Err(PersistenceError::Unavailable(String::from(
                "injected failure",
            )));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn get_zone(
        &self,
        zone_id: &ZoneId,
    ) -> Result<Option<Versioned<ParkingZone>>, PersistenceError> {
        Self::take_failure(&self.failing_reads)?;
        Ok(self.collections.read().await.zones.get(zone_id).cloned())
    }

    async fn list_zones(&self) -> Result<Vec<Versioned<ParkingZone>>, PersistenceError> {
        Self::take_failure(&self.failing_reads)?;
        Ok(self.collections.read().await.zones.values().cloned().collect())
    }

    async fn get_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Versioned<Booking>>, PersistenceError> {
        Self::take_failure(&self.failing_reads)?;
        Ok(self.collections.read().await.bookings.get(booking_id).cloned())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Versioned<Booking>>, PersistenceError> {
        Self::take_failure(&self.failing_reads)?;
        let collections = self.collections.read().await;
        let mut found: Vec<Versioned<Booking>> = collections
            .bookings
            .values()
            .filter(|b| filter.matches(&b.data))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.data
                .created_at
                .cmp(&b.data.created_at)
                .then_with(|| a.data.id.cmp(&b.data.id))
        });
        Ok(found)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Committed>, PersistenceError> {
        Self::take_failure(&self.failing_commits)?;
        batch.check_distinct()?;

        let mut collections = self.collections.write().await;
        check_preconditions(&collections, &batch)?;
        check_references(&collections, &batch)?;

        let mut committed: Vec<Committed> = Vec::with_capacity(batch.len());
        for write in batch.into_writes() {
            committed.push(apply(&mut collections, write));
        }
        debug!(writes = committed.len(), "Committed batch to memory store");
        Ok(committed)
    }
}

fn check_preconditions(
    collections: &Collections,
    batch: &WriteBatch,
) -> Result<(), PersistenceError> {
    for write in batch.iter() {
        let current: Option<u64> = match write {
            Write::PutZone { zone, .. } => collections.zones.get(&zone.id).map(|z| z.version),
            Write::DeleteZone { zone_id, .. } => collections.zones.get(zone_id).map(|z| z.version),
            Write::PutBooking { booking, .. } => {
                collections.bookings.get(&booking.id).map(|b| b.version)
            }
            Write::DeleteBooking { booking_id, .. } => {
                collections.bookings.get(booking_id).map(|b| b.version)
            }
        };
        let expected: Precondition = match write {
            Write::PutZone { expected, .. } | Write::PutBooking { expected, .. } => *expected,
            Write::DeleteZone {
                expected_version, ..
            }
            | Write::DeleteBooking {
                expected_version, ..
            } => Precondition::Version(*expected_version),
        };
        let satisfied: bool = match expected {
            Precondition::Absent => current.is_none(),
            Precondition::Version(v) => current == Some(v),
        };
        if !satisfied {
            let (collection, id) = write.key();
            return Err(PersistenceError::VersionConflict {
                collection,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Mirrors the `bookings.zone_id` foreign key of the SQL schema.
fn check_references(collections: &Collections, batch: &WriteBatch) -> Result<(), PersistenceError> {
    let deleted_zones: HashSet<&ZoneId> = batch
        .iter()
        .filter_map(|w| match w {
            Write::DeleteZone { zone_id, .. } => Some(zone_id),
            _ => None,
        })
        .collect();
    let put_zones: HashSet<&ZoneId> = batch
        .iter()
        .filter_map(|w| match w {
            Write::PutZone { zone, .. } => Some(&zone.id),
            _ => None,
        })
        .collect();
    let deleted_bookings: HashSet<&BookingId> = batch
        .iter()
        .filter_map(|w| match w {
            Write::DeleteBooking { booking_id, .. } => Some(booking_id),
            _ => None,
        })
        .collect();

    for write in batch.iter() {
        if let Write::PutBooking { booking, .. } = write {
            let zone_exists: bool = put_zones.contains(&booking.zone_id)
                || (collections.zones.contains_key(&booking.zone_id)
                    && !deleted_zones.contains(&booking.zone_id));
            if !zone_exists {
                return Err(PersistenceError::ForeignKeyViolation(format!(
                    "{BOOKINGS}/{} references missing {ZONES}/{}",
                    booking.id, booking.zone_id
                )));
            }
        }
    }

    for zone_id in &deleted_zones {
        let referenced: bool = collections
            .bookings
            .values()
            .any(|b| b.data.zone_id == **zone_id && !deleted_bookings.contains(&b.data.id));
        if referenced {
            return Err(PersistenceError::ForeignKeyViolation(format!(
                "{ZONES}/{zone_id} is still referenced by bookings"
            )));
        }
    }
    Ok(())
}

fn next_version(expected: Precondition) -> u64 {
    match expected {
        Precondition::Absent => 1,
        Precondition::Version(v) => v + 1,
    }
}

fn apply(collections: &mut Collections, write: Write) -> Committed {
    match write {
        Write::PutZone { zone, expected } => {
            let stored: Versioned<ParkingZone> = Versioned::new(next_version(expected), zone);
            collections
                .zones
                .insert(stored.data.id.clone(), stored.clone());
            Committed::Zone(stored)
        }
        Write::DeleteZone {
            zone_id,
            expected_version,
        } => {
            // Preconditions were checked under the same lock.
            let removed: Versioned<ParkingZone> = collections
                .zones
                .remove(&zone_id)
                .unwrap_or_else(|| unreachable!("zone {zone_id} vanished under the write lock"));
            Committed::ZoneDeleted(Versioned::new(expected_version + 1, removed.data))
        }
        Write::PutBooking { booking, expected } => {
            let stored: Versioned<Booking> = Versioned::new(next_version(expected), booking);
            collections
                .bookings
                .insert(stored.data.id.clone(), stored.clone());
            Committed::Booking(stored)
        }
        Write::DeleteBooking {
            booking_id,
            expected_version,
        } => {
            let removed: Versioned<Booking> = collections
                .bookings
                .remove(&booking_id)
                .unwrap_or_else(|| unreachable!("booking {booking_id} vanished under the write lock"));
            Committed::BookingDeleted(Versioned::new(expected_version + 1, removed.data))
        }
    }
}
