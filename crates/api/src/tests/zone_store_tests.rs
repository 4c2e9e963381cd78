// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::{Booking, ParkingZone, ZoneId, ZoneStatus};
use parkwise_persistence::{Versioned, WriteBatch};

use super::helpers::{
    admin, assert_capacity_consistent, book, book_request, citizen, create_zone, new_zone,
    setup_service,
};
use crate::zone_store::{SlotMove, stage_slot_move};
use crate::{AdjustCapacityRequest, ReservationError, ZoneUpdate};

#[tokio::test]
async fn test_new_zone_starts_fully_available() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 12).await;

    assert_eq!(zone.total_slots, 12);
    assert_eq!(zone.available_slots, 12);
    assert_eq!(zone.revenue, 0);
    assert_eq!(service.list_zones().await.unwrap(), vec![zone]);
}

#[tokio::test]
async fn test_create_zone_rejects_invalid_fields() {
    let (_store, service) = setup_service();

    let mut bad = new_zone("", 12.9, 77.6, 5);
    let err: ReservationError = service.create_zone(&admin(), bad.clone()).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidInput { ref field, .. } if field == "name"));

    bad.name = String::from("Fine");
    bad.lat = 123.0;
    let err: ReservationError = service.create_zone(&admin(), bad).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidInput { ref field, .. } if field == "coordinates"));
}

#[tokio::test]
async fn test_closed_zone_cannot_be_booked() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 4).await;
    let update = ZoneUpdate {
        status: Some(ZoneStatus::Closed),
        ..ZoneUpdate::default()
    };
    service
        .update_zone(&admin(), zone.id.as_str(), &update)
        .await
        .unwrap();

    let err: ReservationError = service
        .book_zone(&citizen("alice"), &book_request(&zone, "alice", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::ZoneClosed { .. }));
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 4);
}

#[tokio::test]
async fn test_booking_unknown_zone_is_reported() {
    let (_store, service) = setup_service();
    let mut zone: ParkingZone = create_zone(&service, 1).await;
    zone.id = parkwise_domain::ZoneId::new("nowhere");

    let err: ReservationError = service
        .book_zone(&citizen("alice"), &book_request(&zone, "alice", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::ZoneNotFound { .. }));
}

#[tokio::test]
async fn test_adjust_capacity_must_match_held_bookings() {
    let (store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 5).await;
    book(&service, &zone, "alice").await;
    book(&service, &zone, "bob").await;

    let grown: ParkingZone = service
        .adjust_capacity(
            &admin(),
            zone.id.as_str(),
            &AdjustCapacityRequest {
                total_slots: 8,
                available_slots: 6,
            },
        )
        .await
        .unwrap();
    assert_eq!(grown.total_slots, 8);
    assert_eq!(grown.available_slots, 6);

    // Would pretend only one slot is held.
    let err: ReservationError = service
        .adjust_capacity(
            &admin(),
            zone.id.as_str(),
            &AdjustCapacityRequest {
                total_slots: 8,
                available_slots: 7,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::InvalidCapacity { .. }));

    // Breaks available <= total.
    let err: ReservationError = service
        .adjust_capacity(
            &admin(),
            zone.id.as_str(),
            &AdjustCapacityRequest {
                total_slots: 2,
                available_slots: 3,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::InvalidCapacity { .. }));

    assert_capacity_consistent(&*store, &zone.id).await;
}

#[tokio::test]
async fn test_delete_zone_in_use_is_rejected() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 3).await;
    book(&service, &zone, "alice").await;

    let err: ReservationError = service
        .delete_zone(&admin(), zone.id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::ZoneInUse { held: 1, .. }));
    assert!(service.get_zone(zone.id.as_str()).await.is_ok());
}

#[tokio::test]
async fn test_delete_zone_removes_finished_bookings() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 3).await;
    let booking: Booking = book(&service, &zone, "alice").await;
    service.complete(&admin(), booking.id.as_str()).await.unwrap();

    service.delete_zone(&admin(), zone.id.as_str()).await.unwrap();

    let err: ReservationError = service.get_zone(zone.id.as_str()).await.unwrap_err();
    assert!(matches!(err, ReservationError::ZoneNotFound { .. }));
    let err: ReservationError = service
        .get_booking(&admin(), booking.id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::BookingNotFound { .. }));
}

fn stored(version: u64, total: u32, available: u32) -> Versioned<ParkingZone> {
    let mut zone: ParkingZone =
        ParkingZone::create(ZoneId::new("z1"), new_zone("Dock Road", 1.0, 1.0, total)).unwrap();
    zone.available_slots = available;
    Versioned::new(version, zone)
}

#[test]
fn test_slot_moves_stage_exactly_one_slot() {
    let current = stored(4, 2, 1);

    let mut taken: ParkingZone = current.data.clone();
    taken.available_slots = 0;
    let batch = stage_slot_move(WriteBatch::new(), &current, taken, SlotMove::Take).unwrap();
    assert_eq!(batch.len(), 1);

    let mut returned: ParkingZone = current.data.clone();
    returned.available_slots = 2;
    returned.revenue = 40;
    let batch = stage_slot_move(WriteBatch::new(), &current, returned, SlotMove::GiveBack).unwrap();
    assert_eq!(batch.len(), 1);
}

#[test]
fn test_slot_moves_reject_other_counter_changes() {
    let full = stored(1, 1, 0);
    let err = stage_slot_move(WriteBatch::new(), &full, full.data.clone(), SlotMove::Take)
        .unwrap_err();
    assert!(matches!(err, ReservationError::Internal { .. }));

    let current = stored(1, 3, 1);
    let mut two_taken: ParkingZone = current.data.clone();
    two_taken.available_slots = 3;
    let err = stage_slot_move(WriteBatch::new(), &current, two_taken, SlotMove::GiveBack)
        .unwrap_err();
    assert!(matches!(err, ReservationError::Internal { .. }));

    let mut resized: ParkingZone = current.data.clone();
    resized.total_slots = 4;
    resized.available_slots = 0;
    let err = stage_slot_move(WriteBatch::new(), &current, resized, SlotMove::Take).unwrap_err();
    assert!(matches!(err, ReservationError::Internal { .. }));
}

#[test]
fn test_give_back_on_full_zone_is_clamped() {
    let current = stored(2, 2, 2);
    let batch =
        stage_slot_move(WriteBatch::new(), &current, current.data.clone(), SlotMove::GiveBack)
            .unwrap();
    assert_eq!(batch.len(), 1);
}

#[tokio::test]
async fn test_slots_only_move_with_bookings() {
    let (store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    let booking: Booking = book(&service, &zone, "alice").await;
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 1);
    assert_capacity_consistent(&*store, &zone.id).await;

    service.cancel(&admin(), booking.id.as_str()).await.unwrap();
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 2);
    assert_capacity_consistent(&*store, &zone.id).await;
}

#[tokio::test]
async fn test_update_keeps_counters() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 6).await;
    book(&service, &zone, "alice").await;

    let update = ZoneUpdate {
        name: Some(String::from("Station Road East")),
        psi: Some(80),
        ..ZoneUpdate::default()
    };
    let updated: ParkingZone = service
        .update_zone(&admin(), zone.id.as_str(), &update)
        .await
        .unwrap();
    assert_eq!(updated.name, "Station Road East");
    assert_eq!(updated.psi, 80);
    assert_eq!(updated.total_slots, 6);
    assert_eq!(updated.available_slots, 5);

    let bad = ZoneUpdate {
        psi: Some(101),
        ..ZoneUpdate::default()
    };
    let err: ReservationError = service
        .update_zone(&admin(), zone.id.as_str(), &bad)
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::InvalidInput { ref field, .. } if field == "psi"));
}
