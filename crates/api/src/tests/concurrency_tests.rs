// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Concurrent writers against one zone.

use std::sync::Arc;

use parkwise_domain::{Booking, ParkingZone};
use parkwise_persistence::MemoryStore;

use super::helpers::{
    admin, assert_capacity_consistent, book, book_request, citizen, create_zone, test_config,
};
use crate::{ReservationError, ReservationService};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_on_last_slot_admit_exactly_one() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let service: ReservationService<MemoryStore> =
        ReservationService::new(Arc::clone(&store), test_config());
    let zone: ParkingZone = create_zone(&service, 1).await;

    let mut handles = Vec::new();
    for n in 0..10 {
        let service: ReservationService<MemoryStore> = service.clone();
        let zone: ParkingZone = zone.clone();
        handles.push(tokio::spawn(async move {
            let user: String = format!("citizen-{n}");
            service
                .book_zone(&citizen(&user), &book_request(&zone, &user, 1))
                .await
        }));
    }

    let mut successes: usize = 0;
    let mut unavailable: usize = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ReservationError::SlotUnavailable { .. }) => unavailable += 1,
            Err(other) => panic!("Unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(unavailable, 9);
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 0);
    assert_capacity_consistent(&*store, &zone.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_never_oversell() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let service: ReservationService<MemoryStore> = ReservationService::new(
        Arc::clone(&store),
        test_config().with_max_cas_retries(64),
    );
    let zone: ParkingZone = create_zone(&service, 16).await;

    let mut handles = Vec::new();
    for n in 0..24 {
        let service: ReservationService<MemoryStore> = service.clone();
        let zone: ParkingZone = zone.clone();
        handles.push(tokio::spawn(async move {
            let user: String = format!("citizen-{n}");
            service
                .book_zone(&citizen(&user), &book_request(&zone, &user, 1))
                .await
        }));
    }

    let mut successes: usize = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ReservationError::SlotUnavailable { .. }) => {}
            Err(other) => panic!("Unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 16);
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 0);
    assert_capacity_consistent(&*store, &zone.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_terminal_transitions_release_once() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let service: ReservationService<MemoryStore> =
        ReservationService::new(Arc::clone(&store), test_config());
    let zone: ParkingZone = create_zone(&service, 2).await;
    let booking: Booking = book(&service, &zone, "alice").await;

    let complete = {
        let service: ReservationService<MemoryStore> = service.clone();
        let id: String = booking.id.to_string();
        tokio::spawn(async move { service.complete(&admin(), &id).await })
    };
    let cancel = {
        let service: ReservationService<MemoryStore> = service.clone();
        let id: String = booking.id.to_string();
        tokio::spawn(async move { service.cancel(&admin(), &id).await })
    };

    let results: [Result<Booking, ReservationError>; 2] =
        [complete.await.unwrap(), cancel.await.unwrap()];
    let winners: usize = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, ReservationError::InvalidTransition { .. }));
        }
    }

    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 2);
    assert_capacity_consistent(&*store, &zone.id).await;
}
