// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parkwise_domain::{ParkingZone, ZoneId};
use parkwise_persistence::{
    BookingFilter, DocumentStore, PersistenceError, Precondition, WriteBatch,
};

use super::helpers::{
    AlwaysConflicting, book, book_request, citizen, create_zone, new_zone, setup_service,
    test_config,
};
use crate::retry::{cas_loop, read_with_retry};
use crate::{ReservationError, ReservationService};

#[tokio::test]
async fn test_reads_survive_transient_failures() {
    let (store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    store.inject_read_failures(2);
    let zones: Vec<ParkingZone> = service.list_zones().await.unwrap();
    assert_eq!(zones, vec![zone]);
}

#[tokio::test]
async fn test_reads_give_up_after_retry_budget() {
    let (store, service) = setup_service();
    create_zone(&service, 2).await;

    // One initial attempt plus three retries.
    store.inject_read_failures(4);
    let err: ReservationError = service.list_zones().await.unwrap_err();
    assert!(matches!(err, ReservationError::StoreUnavailable { .. }));
    assert!(err.is_retryable());

    assert_eq!(service.list_zones().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_commit_is_not_retried_and_changes_nothing() {
    let (store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    store.inject_commit_failures(2);
    let first: ReservationError = service
        .book_zone(&citizen("alice"), &book_request(&zone, "alice", 1))
        .await
        .unwrap_err();
    assert!(matches!(first, ReservationError::StoreUnavailable { .. }));

    // The second injected failure is still pending, so the first call
    // committed exactly once.
    let second: ReservationError = service
        .book_zone(&citizen("alice"), &book_request(&zone, "alice", 1))
        .await
        .unwrap_err();
    assert!(matches!(second, ReservationError::StoreUnavailable { .. }));

    let stored: ParkingZone = service.get_zone(zone.id.as_str()).await.unwrap();
    assert_eq!(stored.available_slots, 2);

    book(&service, &zone, "alice").await;
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 1);
}

#[tokio::test]
async fn test_persistent_conflicts_surface_as_contention() {
    let store: Arc<AlwaysConflicting> = Arc::new(AlwaysConflicting::default());
    let zone: ParkingZone =
        ParkingZone::create(ZoneId::new("z-busy"), new_zone("Busy", 12.97, 77.59, 5)).unwrap();
    store
        .inner
        .commit(WriteBatch::new().put_zone(zone.clone(), Precondition::Absent))
        .await
        .unwrap();

    let service: ReservationService<AlwaysConflicting> =
        ReservationService::new(Arc::clone(&store), test_config());
    let err: ReservationError = service
        .book_zone(&citizen("alice"), &book_request(&zone, "alice", 1))
        .await
        .unwrap_err();

    match err {
        ReservationError::Contention { attempts, .. } => assert_eq!(attempts, 6),
        other => panic!("Expected Contention, got {other:?}"),
    }
    let bookings = store.inner.list_bookings(&BookingFilter::all()).await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn test_cas_loop_stops_at_first_success() {
    let calls: AtomicU32 = AtomicU32::new(0);
    let result: Result<u32, ReservationError> = cas_loop(&test_config(), "test", || {
        let n: u32 = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok((n == 3).then_some(n)) }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_cas_loop_propagates_attempt_errors() {
    let calls: AtomicU32 = AtomicU32::new(0);
    let result: Result<(), ReservationError> = cas_loop(&test_config(), "test", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async {
            Err(ReservationError::SlotUnavailable {
                zone_id: String::from("z1"),
            })
        }
    })
    .await;

    assert!(matches!(result, Err(ReservationError::SlotUnavailable { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_permanent_read_errors_are_not_retried() {
    let calls: AtomicU32 = AtomicU32::new(0);
    let result: Result<(), ReservationError> = read_with_retry(&test_config(), "test", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(PersistenceError::CorruptRow(String::from("bad status"))) }
    })
    .await;

    assert!(matches!(result, Err(ReservationError::Internal { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
