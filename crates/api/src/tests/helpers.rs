// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::time::Duration;

use parkwise_domain::{Booking, NewZone, ParkingZone, ZoneId, ZoneStatus};
use parkwise_persistence::{
    BookingFilter, Committed, DocumentStore, MemoryStore, PersistenceError, Versioned,
    WriteBatch,
};

use crate::{AuthenticatedActor, BookZoneRequest, ReservationConfig, ReservationService, Role};

pub fn test_config() -> ReservationConfig {
    ReservationConfig::default().with_read_retry_backoff(Duration::ZERO)
}

pub fn setup_service() -> (Arc<MemoryStore>, ReservationService<MemoryStore>) {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let service: ReservationService<MemoryStore> =
        ReservationService::new(Arc::clone(&store), test_config());
    (store, service)
}

pub fn admin() -> AuthenticatedActor {
    AuthenticatedActor::admin("admin-1")
}

pub fn citizen(id: &str) -> AuthenticatedActor {
    AuthenticatedActor::citizen(id)
}

pub fn payment_provider() -> AuthenticatedActor {
    AuthenticatedActor::new("gateway", Role::PaymentProvider)
}

pub fn new_zone(name: &str, lat: f64, lng: f64, total_slots: u32) -> NewZone {
    NewZone {
        name: name.to_string(),
        ward_id: String::from("W12"),
        ward_name: String::from("Old Town"),
        lat,
        lng,
        total_slots,
        price_per_hour: 20,
        psi: 35,
        status: ZoneStatus::Open,
    }
}

pub async fn create_zone<S: DocumentStore>(
    service: &ReservationService<S>,
    total_slots: u32,
) -> ParkingZone {
    service
        .create_zone(&admin(), new_zone("Station Road", 12.97, 77.59, total_slots))
        .await
        .unwrap()
}

pub fn book_request(zone: &ParkingZone, user_id: &str, duration_hours: u32) -> BookZoneRequest {
    BookZoneRequest {
        zone_id: zone.id.to_string(),
        user_id: None,
        user_email: format!("{user_id}@example.com"),
        duration_hours,
        center: None,
        max_radius_km: None,
    }
}

pub async fn book<S: DocumentStore>(
    service: &ReservationService<S>,
    zone: &ParkingZone,
    user_id: &str,
) -> Booking {
    service
        .book_zone(&citizen(user_id), &book_request(zone, user_id, 2))
        .await
        .unwrap()
}

/// Checks `0 <= available <= total` and that occupied slots match the
/// bookings holding one.
pub async fn assert_capacity_consistent<S: DocumentStore>(store: &S, zone_id: &ZoneId) {
    let zone: Versioned<ParkingZone> = store.get_zone(zone_id).await.unwrap().unwrap();
    assert!(zone.data.available_slots <= zone.data.total_slots);
    let held: usize = store
        .list_bookings(&BookingFilter::for_zone(zone_id.clone()).holding())
        .await
        .unwrap()
        .len();
    assert_eq!(
        usize::try_from(zone.data.occupied_slots()).unwrap(),
        held,
        "occupied slots must equal held bookings"
    );
}

/// A store whose commits always lose the version race.
#[derive(Debug, Default)]
pub struct AlwaysConflicting {
    pub inner: MemoryStore,
}

impl DocumentStore for AlwaysConflicting {
    async fn get_zone(
        &self,
        zone_id: &ZoneId,
    ) -> Result<Option<Versioned<ParkingZone>>, PersistenceError> {
        self.inner.get_zone(zone_id).await
    }

    async fn list_zones(&self) -> Result<Vec<Versioned<ParkingZone>>, PersistenceError> {
        self.inner.list_zones().await
    }

    async fn get_booking(
        &self,
        booking_id: &parkwise_domain::BookingId,
    ) -> Result<Option<Versioned<Booking>>, PersistenceError> {
        self.inner.get_booking(booking_id).await
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Versioned<Booking>>, PersistenceError> {
        self.inner.list_bookings(filter).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Committed>, PersistenceError> {
        let (collection, id) = batch
            .iter()
            .next()
            .map_or(("none", ""), parkwise_persistence::Write::key);
        Err(PersistenceError::VersionConflict {
            collection,
            id: id.to_string(),
        })
    }
}
