// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::{Booking, BookingStatus, ParkingZone};

use super::helpers::{
    admin, book, book_request, citizen, create_zone, new_zone, payment_provider, setup_service,
};
use crate::{
    AdjustCapacityRequest, AuthError, AuthenticatedActor, AuthorizationService,
    ListBookingsQuery, ReservationError, Role, ZoneUpdate,
};

fn assert_unauthorized(err: &ReservationError) {
    assert!(
        matches!(err, ReservationError::Unauthorized(_)),
        "Expected Unauthorized, got {err:?}"
    );
    assert_eq!(err.code(), "unauthorized");
}

#[tokio::test]
async fn test_only_admins_manage_zones() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    for actor in [citizen("alice"), payment_provider(), AuthenticatedActor::system()] {
        assert_unauthorized(
            &service
                .create_zone(&actor, new_zone("Pier", 12.9, 77.5, 4))
                .await
                .unwrap_err(),
        );
        assert_unauthorized(
            &service
                .update_zone(&actor, zone.id.as_str(), &ZoneUpdate::default())
                .await
                .unwrap_err(),
        );
        assert_unauthorized(
            &service
                .adjust_capacity(
                    &actor,
                    zone.id.as_str(),
                    &AdjustCapacityRequest {
                        total_slots: 4,
                        available_slots: 4,
                    },
                )
                .await
                .unwrap_err(),
        );
        assert_unauthorized(&service.delete_zone(&actor, zone.id.as_str()).await.unwrap_err());
    }

    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap(), zone);
}

#[tokio::test]
async fn test_citizen_books_only_for_self() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    let mut request = book_request(&zone, "bob", 1);
    request.user_id = Some(String::from("bob"));
    let err: ReservationError = service
        .book_zone(&citizen("alice"), &request)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReservationError::Unauthorized(AuthError::NotOwner { .. })
    ));

    // Admins may book on someone's behalf.
    let booking: Booking = service.book_zone(&admin(), &request).await.unwrap();
    assert_eq!(booking.user_id, "bob");
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 1);
}

#[tokio::test]
async fn test_payment_provider_may_only_mark_paid() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;
    let booking: Booking = book(&service, &zone, "alice").await;
    let id: &str = booking.id.as_str();
    let gateway: AuthenticatedActor = payment_provider();

    assert_unauthorized(&service.activate(&gateway, id).await.unwrap_err());
    assert_unauthorized(&service.complete(&gateway, id).await.unwrap_err());
    assert_unauthorized(&service.cancel(&gateway, id).await.unwrap_err());
    assert_unauthorized(&service.expire(&gateway, id).await.unwrap_err());

    let paid: Booking = service.mark_paid(&gateway, id).await.unwrap();
    assert!(paid.is_paid());
}

#[tokio::test]
async fn test_citizen_cancels_only_own_booking() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;
    let booking: Booking = book(&service, &zone, "alice").await;

    let err: ReservationError = service
        .cancel(&citizen("mallory"), booking.id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReservationError::Unauthorized(AuthError::NotOwner { .. })
    ));
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 1);

    let cancelled: Booking = service
        .cancel(&citizen("alice"), booking.id.as_str())
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 2);
}

#[tokio::test]
async fn test_citizen_sees_only_own_bookings() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 4).await;
    let mine: Booking = book(&service, &zone, "alice").await;
    let theirs: Booking = book(&service, &zone, "bob").await;

    let listed: Vec<Booking> = service
        .list_bookings(&citizen("alice"), &ListBookingsQuery::default())
        .await
        .unwrap();
    assert_eq!(listed, vec![mine.clone()]);

    let err: ReservationError = service
        .list_bookings(
            &citizen("alice"),
            &ListBookingsQuery {
                user_id: Some(String::from("bob")),
                ..ListBookingsQuery::default()
            },
        )
        .await
        .unwrap_err();
    assert_unauthorized(&err);

    assert_unauthorized(
        &service
            .get_booking(&citizen("alice"), theirs.id.as_str())
            .await
            .unwrap_err(),
    );
    assert_eq!(
        service.get_booking(&citizen("alice"), mine.id.as_str()).await.unwrap(),
        mine
    );

    let everything: Vec<Booking> = service
        .list_bookings(&admin(), &ListBookingsQuery::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 2);
}

#[tokio::test]
async fn test_system_may_expire_but_not_book() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;
    let booking: Booking = book(&service, &zone, "alice").await;
    let sweeper: AuthenticatedActor = AuthenticatedActor::system();

    assert_unauthorized(
        &service
            .book_zone(&sweeper, &book_request(&zone, "system", 1))
            .await
            .unwrap_err(),
    );
    assert_unauthorized(
        &service
            .expire(&citizen("alice"), booking.id.as_str())
            .await
            .unwrap_err(),
    );

    let expired: Booking = service.expire(&sweeper, booking.id.as_str()).await.unwrap();
    assert_eq!(expired.status, BookingStatus::Expired);
}

#[test]
fn test_booking_view_scope_by_role() {
    let alice: AuthenticatedActor = citizen("alice");
    assert_eq!(
        AuthorizationService::scope_booking_view(&alice, None).unwrap(),
        Some(String::from("alice"))
    );
    assert_eq!(
        AuthorizationService::scope_booking_view(&alice, Some("alice")).unwrap(),
        Some(String::from("alice"))
    );
    assert!(AuthorizationService::scope_booking_view(&alice, Some("bob")).is_err());

    assert_eq!(AuthorizationService::scope_booking_view(&admin(), None).unwrap(), None);
    assert_eq!(
        AuthorizationService::scope_booking_view(&admin(), Some("bob")).unwrap(),
        Some(String::from("bob"))
    );
}

#[test]
fn test_role_parses_from_wire_names() {
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("payment_provider".parse::<Role>().unwrap(), Role::PaymentProvider);
    assert!("root".parse::<Role>().is_err());
    assert_eq!(Role::Citizen.to_string(), "citizen");
}
