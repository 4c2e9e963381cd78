// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Parking zone records and their slot counters.
//!
//! Every write is a read-modify-commit loop guarded by the zone's version.
//! A conflict means someone else changed the zone in between, so the loop
//! re-reads and tries again, up to the configured budget.
//!
//! Slots are only taken or given back together with a booking write.
//! [`stage_slot_move`] is the one place such a zone write is staged.

use std::sync::Arc;

use parkwise_domain::{Booking, NewZone, ParkingZone, ZoneId, ZoneStatus, validate_capacity};
use parkwise_persistence::{
    BookingFilter, Committed, DocumentStore, Precondition, Versioned, WriteBatch,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::change_feed::ChangeFeed;
use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::retry::{cas_loop, read_with_retry, try_commit};

/// Admin edits to a zone's descriptive fields, price and status.
///
/// `None` leaves a field unchanged. Capacity goes through
/// [`ZoneStore::adjust_capacity`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpdate {
    pub name: Option<String>,
    pub ward_id: Option<String>,
    pub ward_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub price_per_hour: Option<u64>,
    pub psi: Option<u8>,
    pub status: Option<ZoneStatus>,
}

impl ZoneUpdate {
    fn apply_to(&self, zone: &ParkingZone) -> ParkingZone {
        let mut updated: ParkingZone = zone.clone();
        if let Some(name) = &self.name {
            updated.name.clone_from(name);
        }
        if let Some(ward_id) = &self.ward_id {
            updated.ward_id.clone_from(ward_id);
        }
        if let Some(ward_name) = &self.ward_name {
            updated.ward_name.clone_from(ward_name);
        }
        if let Some(lat) = self.lat {
            updated.lat = lat;
        }
        if let Some(lng) = self.lng {
            updated.lng = lng;
        }
        if let Some(price) = self.price_per_hour {
            updated.price_per_hour = price;
        }
        if let Some(psi) = self.psi {
            updated.psi = psi;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated
    }
}

/// Owner of `parking_zones` and of every change to `available_slots`.
pub struct ZoneStore<S> {
    store: Arc<S>,
    feed: ChangeFeed,
    config: ReservationConfig,
}

impl<S> Clone for ZoneStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            feed: self.feed.clone(),
            config: self.config,
        }
    }
}

impl<S: DocumentStore> ZoneStore<S> {
    #[must_use]
    pub const fn new(store: Arc<S>, feed: ChangeFeed, config: ReservationConfig) -> Self {
        Self {
            store,
            feed,
            config,
        }
    }

    /// Reads one zone with its version.
    ///
    /// # Errors
    ///
    /// Returns `ZoneNotFound`, or `StoreUnavailable` once read retries run out.
    pub async fn get_zone(&self, zone_id: &ZoneId) -> Result<Versioned<ParkingZone>, ReservationError> {
        read_with_retry(&self.config, "get_zone", || self.store.get_zone(zone_id))
            .await?
            .ok_or_else(|| ReservationError::ZoneNotFound {
                zone_id: zone_id.to_string(),
            })
    }

    /// A fresh snapshot of every zone, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` once read retries run out.
    pub async fn list_zones(&self) -> Result<Vec<ParkingZone>, ReservationError> {
        let zones: Vec<Versioned<ParkingZone>> =
            read_with_retry(&self.config, "list_zones", || self.store.list_zones()).await?;
        Ok(zones.into_iter().map(|z| z.data).collect())
    }

    async fn held_bookings(&self, zone_id: &ZoneId) -> Result<Vec<Versioned<Booking>>, ReservationError> {
        let filter: BookingFilter = BookingFilter::for_zone(zone_id.clone()).holding();
        read_with_retry(&self.config, "list_held_bookings", || {
            self.store.list_bookings(&filter)
        })
        .await
    }

    fn committed_zone(committed: Vec<Committed>) -> Result<ParkingZone, ReservationError> {
        committed
            .into_iter()
            .find_map(|c| match c {
                Committed::Zone(z) => Some(z.data),
                _ => None,
            })
            .ok_or_else(|| ReservationError::Internal {
                message: String::from("commit returned no zone"),
            })
    }

    /// Creates a zone with every slot available.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput`/`InvalidCapacity` for bad fields, or a store error.
    pub async fn create_zone(&self, new_zone: NewZone) -> Result<ParkingZone, ReservationError> {
        let zone: ParkingZone = ParkingZone::create(ZoneId::generate(), new_zone)?;
        let batch: WriteBatch = WriteBatch::new().put_zone(zone.clone(), Precondition::Absent);
        match try_commit(&*self.store, &self.feed, batch).await? {
            Some(_) => {
                info!(zone_id = %zone.id, total_slots = zone.total_slots, "Created parking zone");
                Ok(zone)
            }
            // Generated ids do not collide in practice.
            None => Err(ReservationError::Contention {
                operation: "create_zone",
                attempts: 1,
            }),
        }
    }

    /// Applies descriptive, price and status edits.
    ///
    /// A price change does not touch the amount of existing bookings.
    ///
    /// # Errors
    ///
    /// Returns `ZoneNotFound`, `InvalidInput`, `Contention` or a store error.
    pub async fn update_zone(
        &self,
        zone_id: &ZoneId,
        update: &ZoneUpdate,
    ) -> Result<ParkingZone, ReservationError> {
        cas_loop(&self.config, "update_zone", move || async move {
            let current: Versioned<ParkingZone> = self.get_zone(zone_id).await?;
            let updated: ParkingZone = update.apply_to(&current.data);
            updated.validate()?;
            let batch: WriteBatch =
                WriteBatch::new().put_zone(updated, Precondition::Version(current.version));
            match try_commit(&*self.store, &self.feed, batch).await? {
                Some(committed) => Ok(Some(Self::committed_zone(committed)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Admin overwrite of the slot counters.
    ///
    /// The new counters must satisfy `0 <= available <= total`, and the
    /// occupied difference must equal the number of bookings currently
    /// holding a slot in this zone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` if either rule is broken.
    pub async fn adjust_capacity(
        &self,
        zone_id: &ZoneId,
        new_total: u32,
        new_available: u32,
    ) -> Result<ParkingZone, ReservationError> {
        validate_capacity(new_total, new_available)?;
        cas_loop(&self.config, "adjust_capacity", move || async move {
            let current: Versioned<ParkingZone> = self.get_zone(zone_id).await?;
            // Every change to the held count also bumps the zone version, so
            // this count stays valid for as long as the version does.
            let held: usize = self.held_bookings(zone_id).await?.len();
            let occupied: u32 = new_total - new_available;
            if usize::try_from(occupied).ok() != Some(held) {
                return Err(ReservationError::InvalidCapacity {
                    message: format!(
                        "{occupied} occupied slots requested but {held} bookings hold a slot"
                    ),
                });
            }

            let mut updated: ParkingZone = current.data.clone();
            updated.total_slots = new_total;
            updated.available_slots = new_available;
            let batch: WriteBatch =
                WriteBatch::new().put_zone(updated, Precondition::Version(current.version));
            match try_commit(&*self.store, &self.feed, batch).await? {
                Some(committed) => {
                    info!(%zone_id, new_total, new_available, "Adjusted zone capacity");
                    Ok(Some(Self::committed_zone(committed)?))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// Deletes a zone together with its finished bookings.
    ///
    /// # Errors
    ///
    /// Returns `ZoneInUse` while any booking still holds a slot.
    pub async fn delete_zone(&self, zone_id: &ZoneId) -> Result<(), ReservationError> {
        cas_loop(&self.config, "delete_zone", move || async move {
            let current: Versioned<ParkingZone> = self.get_zone(zone_id).await?;
            let filter: BookingFilter = BookingFilter::for_zone(zone_id.clone());
            let bookings: Vec<Versioned<Booking>> =
                read_with_retry(&self.config, "list_zone_bookings", || {
                    self.store.list_bookings(&filter)
                })
                .await?;

            let held: usize = bookings.iter().filter(|b| b.data.holds_slot()).count();
            if held > 0 {
                return Err(ReservationError::ZoneInUse {
                    zone_id: zone_id.to_string(),
                    held,
                });
            }

            let removed: usize = bookings.len();
            let batch: WriteBatch = bookings
                .into_iter()
                .fold(WriteBatch::new(), |batch, b| {
                    batch.delete_booking(b.data.id, b.version)
                })
                .delete_zone(zone_id.clone(), current.version);
            match try_commit(&*self.store, &self.feed, batch).await? {
                Some(_) => {
                    info!(%zone_id, removed_bookings = removed, "Deleted parking zone");
                    Ok(Some(()))
                }
                None => Ok(None),
            }
        })
        .await
    }
}

/// How a booking write moves its zone's slot counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMove {
    /// A new booking holds a slot.
    Take,
    /// A booking ended; its slot returns, never above the total.
    GiveBack,
}

/// Stages `updated` in place of `current`, guarded by the stored version.
///
/// `updated` may differ from `current` only by the slot move and, when a
/// slot is given back, by added revenue.
///
/// # Errors
///
/// Returns `Internal` for any other change to the counters.
pub fn stage_slot_move(
    batch: WriteBatch,
    current: &Versioned<ParkingZone>,
    updated: ParkingZone,
    slot_move: SlotMove,
) -> Result<WriteBatch, ReservationError> {
    let before: &ParkingZone = &current.data;
    let expected_available: Option<u32> = match slot_move {
        SlotMove::Take => before.available_slots.checked_sub(1),
        SlotMove::GiveBack => Some(
            before
                .available_slots
                .saturating_add(1)
                .min(before.total_slots),
        ),
    };
    let revenue_ok: bool = match slot_move {
        SlotMove::Take => updated.revenue == before.revenue,
        SlotMove::GiveBack => updated.revenue >= before.revenue,
    };

    if updated.id != before.id
        || updated.total_slots != before.total_slots
        || expected_available != Some(updated.available_slots)
        || !revenue_ok
    {
        return Err(ReservationError::Internal {
            message: format!(
                "rejected {slot_move:?} on zone {}: available {} -> {}, revenue {} -> {}",
                before.id,
                before.available_slots,
                updated.available_slots,
                before.revenue,
                updated.revenue
            ),
        });
    }
    Ok(batch.put_zone(updated, Precondition::Version(current.version)))
}
