// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Façade behaviour that is not specific to one component.

use parkwise_domain::{Coordinates, NearbyZone, ParkingZone, ZoneStatus};
use parkwise_persistence::MemoryStore;

use super::helpers::{admin, book, book_request, citizen, create_zone, new_zone, setup_service};
use crate::{
    BookZoneRequest, DEFAULT_NEARBY_LIMIT, NearbyQuery, ReservationError, ReservationService,
    ZoneResponse, ZoneUpdate,
};

const CENTER_LAT: f64 = 12.97;
const CENTER_LNG: f64 = 77.59;

async fn zone_at(
    service: &ReservationService<MemoryStore>,
    name: &str,
    lat: f64,
    lng: f64,
) -> ParkingZone {
    service
        .create_zone(&admin(), new_zone(name, lat, lng, 4))
        .await
        .unwrap()
}

fn query(radius_km: f64, limit: usize) -> NearbyQuery {
    NearbyQuery {
        lat: CENTER_LAT,
        lng: CENTER_LNG,
        radius_km,
        limit,
    }
}

fn names(found: &[NearbyZone]) -> Vec<&str> {
    found.iter().map(|n| n.zone.name.as_str()).collect()
}

#[tokio::test]
async fn test_nearby_orders_by_distance_within_radius() {
    let (_store, service) = setup_service();
    zone_at(&service, "Far", 13.10, CENTER_LNG).await;
    zone_at(&service, "Middle", 13.00, CENTER_LNG).await;
    zone_at(&service, "Near", 12.98, CENTER_LNG).await;

    let found: Vec<NearbyZone> = service.list_nearby(&query(5.0, 10)).await.unwrap();
    assert_eq!(names(&found), vec!["Near", "Middle"]);
    assert!(found[0].distance_km < found[1].distance_km);
    assert!(found[1].distance_km <= 5.0);

    let limited: Vec<NearbyZone> = service.list_nearby(&query(50.0, 1)).await.unwrap();
    assert_eq!(names(&limited), vec!["Near"]);
}

#[tokio::test]
async fn test_nearby_is_deterministic_for_equal_distances() {
    let (_store, service) = setup_service();
    let a: ParkingZone = zone_at(&service, "Twin A", 12.98, CENTER_LNG).await;
    let b: ParkingZone = zone_at(&service, "Twin B", 12.98, CENTER_LNG).await;

    let first: Vec<NearbyZone> = service.list_nearby(&query(5.0, 10)).await.unwrap();
    let second: Vec<NearbyZone> = service.list_nearby(&query(5.0, 10)).await.unwrap();
    assert_eq!(first, second);

    let mut expected = vec![a.id, b.id];
    expected.sort();
    let ids: Vec<_> = first.into_iter().map(|n| n.zone.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_nearby_skips_closed_zones() {
    let (_store, service) = setup_service();
    let closed: ParkingZone = zone_at(&service, "Closed", 12.98, CENTER_LNG).await;
    zone_at(&service, "Open", 13.00, CENTER_LNG).await;
    service
        .update_zone(
            &admin(),
            closed.id.as_str(),
            &ZoneUpdate {
                status: Some(ZoneStatus::Closed),
                ..ZoneUpdate::default()
            },
        )
        .await
        .unwrap();

    let found: Vec<NearbyZone> = service.list_nearby(&query(10.0, 10)).await.unwrap();
    assert_eq!(names(&found), vec!["Open"]);
}

#[tokio::test]
async fn test_nearby_rejects_bad_input() {
    let (_store, service) = setup_service();

    let bad_lat: NearbyQuery = NearbyQuery {
        lat: 91.0,
        ..query(1.0, 10)
    };
    assert!(matches!(
        service.list_nearby(&bad_lat).await.unwrap_err(),
        ReservationError::InvalidInput { ref field, .. } if field == "coordinates"
    ));
    assert!(matches!(
        service.list_nearby(&query(-1.0, 10)).await.unwrap_err(),
        ReservationError::InvalidInput { ref field, .. } if field == "radius_km"
    ));
    assert!(service.list_nearby(&query(1.0, 10)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_beyond_max_radius_is_refused() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = zone_at(&service, "Airport", 13.20, CENTER_LNG).await;

    let mut request: BookZoneRequest = book_request(&zone, "alice", 1);
    request.center = Some(Coordinates::new(CENTER_LAT, CENTER_LNG).unwrap());
    request.max_radius_km = Some(5.0);
    let err: ReservationError = service
        .book_zone(&citizen("alice"), &request)
        .await
        .unwrap_err();
    match err {
        ReservationError::ZoneOutOfRange {
            distance_km,
            max_radius_km,
            ..
        } => {
            assert!(distance_km > 20.0);
            assert!((max_radius_km - 5.0).abs() < f64::EPSILON);
        }
        other => panic!("Expected ZoneOutOfRange, got {other:?}"),
    }
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 4);

    request.max_radius_km = Some(50.0);
    service.book_zone(&citizen("alice"), &request).await.unwrap();
}

#[tokio::test]
async fn test_book_zone_validates_request() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 2).await;

    let cases: [(BookZoneRequest, &str); 3] = [
        (
            BookZoneRequest {
                zone_id: String::from("  "),
                ..book_request(&zone, "alice", 1)
            },
            "zone_id",
        ),
        (
            BookZoneRequest {
                user_email: String::from("not-an-email"),
                ..book_request(&zone, "alice", 1)
            },
            "user_email",
        ),
        (book_request(&zone, "alice", 0), "duration_hours"),
    ];

    for (request, expected_field) in cases {
        match service.book_zone(&citizen("alice"), &request).await {
            Err(ReservationError::InvalidInput { field, .. }) => {
                assert_eq!(field, expected_field);
            }
            other => panic!("Expected InvalidInput for {expected_field}, got {other:?}"),
        }
    }
    assert_eq!(service.get_zone(zone.id.as_str()).await.unwrap().available_slots, 2);
}

#[tokio::test]
async fn test_zone_response_reports_occupancy() {
    let (_store, service) = setup_service();
    let zone: ParkingZone = create_zone(&service, 4).await;
    book(&service, &zone, "alice").await;

    let response: ZoneResponse = service.get_zone(zone.id.as_str()).await.unwrap().into();
    assert_eq!(response.occupied_slots, 1);
    assert!((response.occupancy_ratio - 0.25).abs() < f64::EPSILON);

    let json: serde_json::Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["available_slots"], 3);
    assert_eq!(json["occupied_slots"], 1);
}

#[test]
fn test_request_defaults_when_deserializing() {
    let request: BookZoneRequest = serde_json::from_str(
        r#"{"zone_id":"z1","user_email":"a@example.com","duration_hours":2}"#,
    )
    .unwrap();
    assert_eq!(request.user_id, None);
    assert_eq!(request.center, None);

    let nearby: NearbyQuery =
        serde_json::from_str(r#"{"lat":12.9,"lng":77.5,"radius_km":2.0}"#).unwrap();
    assert_eq!(nearby.limit, DEFAULT_NEARBY_LIMIT);
}

#[test]
fn test_error_codes_are_stable() {
    let err: ReservationError = ReservationError::SlotUnavailable {
        zone_id: String::from("z1"),
    };
    assert_eq!(err.code(), "slot_unavailable");
    assert!(!err.is_retryable());

    let err: ReservationError = ReservationError::Contention {
        operation: "reserve",
        attempts: 6,
    };
    assert_eq!(err.code(), "contention");
    assert!(err.is_retryable());
}
