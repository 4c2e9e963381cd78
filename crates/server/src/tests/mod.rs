// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.


use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use parkwise_api::{ReservationConfig, ReservationService};
use parkwise_persistence::MemoryStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::actor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::{AppState, build_router};

pub const ADMIN: (&str, &str) = ("admin-1", "admin");
pub const GATEWAY: (&str, &str) = ("gateway", "payment_provider");

pub fn citizen(id: &str) -> (&str, &str) {
    (id, "citizen")
}

pub fn test_service() -> ReservationService<MemoryStore> {
    ReservationService::new(Arc::new(MemoryStore::new()), ReservationConfig::default())
}

pub fn test_app() -> Router {
    build_router(AppState::new(test_service()))
}

/// Sends one request and returns the status and the JSON body
/// (`Value::Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder
            .header(ACTOR_ID_HEADER, id)
            .header(ACTOR_ROLE_HEADER, role);
    }
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status: StatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn zone_body(name: &str, lat: f64, lng: f64, total_slots: u32) -> Value {
    json!({
        "name": name,
        "ward_id": "W12",
        "ward_name": "Old Town",
        "lat": lat,
        "lng": lng,
        "total_slots": total_slots,
        "price_per_hour": 20,
        "psi": 35,
    })
}

/// Creates a zone as admin and returns its id.
pub async fn create_zone(app: &Router, total_slots: u32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/zones",
        Some(ADMIN),
        Some(zone_body("Station Road", 12.97, 77.59, total_slots)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// Books a slot as `user` for two hours and returns the booking id.
pub async fn book(app: &Router, zone_id: &str, user: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/bookings",
        Some(citizen(user)),
        Some(json!({
            "zone_id": zone_id,
            "user_email": format!("{user}@example.com"),
            "duration_hours": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
    body["id"].as_str().unwrap().to_string()
}
