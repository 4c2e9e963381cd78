// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod actor;
mod live;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use parkwise_api::{
    AdjustCapacityRequest, AuthenticatedActor, BookZoneRequest, BookingResponse,
    ExpireOverdueResponse, ListBookingsQuery, NearbyQuery, NearbyZoneResponse,
    ReservationConfig, ReservationError, ReservationService, ZoneResponse, ZoneUpdate,
};
use parkwise_domain::{Booking, NewZone};
use parkwise_persistence::{DocumentStore, MemoryStore, SqliteStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::actor::RequestActor;

/// ParkWise Server - HTTP server for the ParkWise parking engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an in-memory store.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Re-attempts after a version conflict before reporting contention
    #[arg(long, default_value_t = ReservationConfig::DEFAULT_MAX_CAS_RETRIES)]
    max_cas_retries: u32,

    /// Re-attempts of a read after a transient store failure
    #[arg(long, default_value_t = ReservationConfig::DEFAULT_MAX_READ_RETRIES)]
    max_read_retries: u32,

    /// Seconds between sweeps that expire overdue bookings (0 disables)
    #[arg(long, default_value_t = 60)]
    expiry_sweep_secs: u64,
}

impl Args {
    fn reservation_config(&self) -> ReservationConfig {
        ReservationConfig::default()
            .with_max_cas_retries(self.max_cas_retries)
            .with_max_read_retries(self.max_read_retries)
    }
}

/// Application state shared across handlers.
pub struct AppState<S> {
    service: ReservationService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    const fn new(service: ReservationService<S>) -> Self {
        Self { service }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Stable machine-readable code.
    code: String,
    /// Human-readable message.
    message: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: true,
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        ErrorResponse::new(self.code, self.message).into_response_with(self.status)
    }
}

const fn status_for(err: &ReservationError) -> StatusCode {
    match err {
        ReservationError::ZoneNotFound { .. } | ReservationError::BookingNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ReservationError::ZoneClosed { .. }
        | ReservationError::SlotUnavailable { .. }
        | ReservationError::InvalidTransition { .. }
        | ReservationError::ZoneInUse { .. } => StatusCode::CONFLICT,
        ReservationError::InvalidCapacity { .. } | ReservationError::ZoneOutOfRange { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReservationError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        ReservationError::Unauthorized(_) => StatusCode::FORBIDDEN,
        ReservationError::Contention { .. } | ReservationError::StoreUnavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ReservationError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ReservationError> for HttpError {
    fn from(err: ReservationError) -> Self {
        let status: StatusCode = status_for(&err);
        if status.is_server_error() {
            if err.is_retryable() {
                warn!(error = %err, "Request failed, client may retry");
            } else {
                error!(error = %err, "Request failed");
            }
        } else {
            debug!(error = %err, "Request rejected");
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Zones
// ============================================================================

/// Handler for GET `/zones`.
async fn handle_list_zones<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
) -> Result<Json<Vec<ZoneResponse>>, HttpError> {
    let zones = app_state.service.list_zones().await?;
    Ok(Json(zones.into_iter().map(ZoneResponse::from).collect()))
}

/// Handler for GET `/zones/nearby`.
async fn handle_list_nearby<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyZoneResponse>>, HttpError> {
    let found = app_state.service.list_nearby(&query).await?;
    Ok(Json(found.into_iter().map(NearbyZoneResponse::from).collect()))
}

/// Handler for GET `/zones/{zone_id}`.
async fn handle_get_zone<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    Path(zone_id): Path<String>,
) -> Result<Json<ZoneResponse>, HttpError> {
    let zone = app_state.service.get_zone(&zone_id).await?;
    Ok(Json(zone.into()))
}

/// Handler for POST `/zones`.
async fn handle_create_zone<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Json(req): Json<NewZone>,
) -> Result<(StatusCode, Json<ZoneResponse>), HttpError> {
    info!(actor_id = %actor.id, name = %req.name, "Handling create_zone request");
    let zone = app_state.service.create_zone(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(zone.into())))
}

/// Handler for PATCH `/zones/{zone_id}`.
async fn handle_update_zone<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(zone_id): Path<String>,
    Json(req): Json<ZoneUpdate>,
) -> Result<Json<ZoneResponse>, HttpError> {
    info!(actor_id = %actor.id, %zone_id, "Handling update_zone request");
    let zone = app_state.service.update_zone(&actor, &zone_id, &req).await?;
    Ok(Json(zone.into()))
}

/// Handler for POST `/zones/{zone_id}/capacity`.
async fn handle_adjust_capacity<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(zone_id): Path<String>,
    Json(req): Json<AdjustCapacityRequest>,
) -> Result<Json<ZoneResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        %zone_id,
        total_slots = req.total_slots,
        available_slots = req.available_slots,
        "Handling adjust_capacity request"
    );
    let zone = app_state
        .service
        .adjust_capacity(&actor, &zone_id, &req)
        .await?;
    Ok(Json(zone.into()))
}

/// Handler for DELETE `/zones/{zone_id}`.
async fn handle_delete_zone<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(zone_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    info!(actor_id = %actor.id, %zone_id, "Handling delete_zone request");
    app_state.service.delete_zone(&actor, &zone_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Bookings
// ============================================================================

/// Handler for POST `/bookings`.
async fn handle_book_zone<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Json(req): Json<BookZoneRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), HttpError> {
    info!(
        actor_id = %actor.id,
        zone_id = %req.zone_id,
        duration_hours = req.duration_hours,
        "Handling book_zone request"
    );
    let booking = app_state.service.book_zone(&actor, &req).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// Handler for GET `/bookings`.
async fn handle_list_bookings<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, HttpError> {
    let bookings = app_state.service.list_bookings(&actor, &query).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Handler for GET `/bookings/{booking_id}`.
async fn handle_get_booking<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.get_booking(&actor, &booking_id).await?;
    Ok(Json(booking.into()))
}

fn transitioned(action: &str, actor: &AuthenticatedActor, booking: Booking) -> Json<BookingResponse> {
    info!(
        actor_id = %actor.id,
        booking_id = %booking.id,
        status = %booking.status,
        action,
        "Booking transition applied"
    );
    Json(booking.into())
}

/// Handler for POST `/bookings/{booking_id}/activate`.
async fn handle_activate<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.activate(&actor, &booking_id).await?;
    Ok(transitioned("activate", &actor, booking))
}

/// Handler for POST `/bookings/{booking_id}/mark_paid`.
async fn handle_mark_paid<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.mark_paid(&actor, &booking_id).await?;
    Ok(transitioned("mark_paid", &actor, booking))
}

/// Handler for POST `/bookings/{booking_id}/complete`.
async fn handle_complete<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.complete(&actor, &booking_id).await?;
    Ok(transitioned("complete", &actor, booking))
}

/// Handler for POST `/bookings/{booking_id}/mark_paid_and_complete`.
async fn handle_mark_paid_and_complete<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state
        .service
        .mark_paid_and_complete(&actor, &booking_id)
        .await?;
    Ok(transitioned("mark_paid_and_complete", &actor, booking))
}

/// Handler for POST `/bookings/{booking_id}/cancel`.
async fn handle_cancel<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.cancel(&actor, &booking_id).await?;
    Ok(transitioned("cancel", &actor, booking))
}

/// Handler for POST `/bookings/{booking_id}/expire`.
async fn handle_expire<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = app_state.service.expire(&actor, &booking_id).await?;
    Ok(transitioned("expire", &actor, booking))
}

/// Handler for POST `/bookings/expire_overdue`.
async fn handle_expire_overdue<S: DocumentStore>(
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
) -> Result<Json<ExpireOverdueResponse>, HttpError> {
    let sweep: ExpireOverdueResponse = app_state
        .service
        .expire_overdue(&actor, OffsetDateTime::now_utc())
        .await?;
    info!(
        actor_id = %actor.id,
        expired = sweep.expired.len(),
        failed = sweep.failed.len(),
        "Expired overdue bookings"
    );
    Ok(Json(sweep))
}

/// Builds the application router with all endpoints.
fn build_router<S: DocumentStore>(app_state: AppState<S>) -> Router {
    Router::new()
        .route("/zones", get(handle_list_zones::<S>).post(handle_create_zone::<S>))
        .route("/zones/nearby", get(handle_list_nearby::<S>))
        .route(
            "/zones/{zone_id}",
            get(handle_get_zone::<S>)
                .patch(handle_update_zone::<S>)
                .delete(handle_delete_zone::<S>),
        )
        .route("/zones/{zone_id}/capacity", post(handle_adjust_capacity::<S>))
        .route(
            "/bookings",
            get(handle_list_bookings::<S>).post(handle_book_zone::<S>),
        )
        .route("/bookings/expire_overdue", post(handle_expire_overdue::<S>))
        .route("/bookings/{booking_id}", get(handle_get_booking::<S>))
        .route("/bookings/{booking_id}/activate", post(handle_activate::<S>))
        .route("/bookings/{booking_id}/mark_paid", post(handle_mark_paid::<S>))
        .route("/bookings/{booking_id}/complete", post(handle_complete::<S>))
        .route(
            "/bookings/{booking_id}/mark_paid_and_complete",
            post(handle_mark_paid_and_complete::<S>),
        )
        .route("/bookings/{booking_id}/cancel", post(handle_cancel::<S>))
        .route("/bookings/{booking_id}/expire", post(handle_expire::<S>))
        .route("/live", get(live::live_events_handler::<S>))
        .with_state(app_state)
}

/// Expires every overdue booking once, as the system actor.
///
/// Returns how many bookings were expired.
async fn sweep_expired<S: DocumentStore>(
    service: &ReservationService<S>,
    now: OffsetDateTime,
) -> usize {
    match service
        .expire_overdue(&AuthenticatedActor::system(), now)
        .await
    {
        Ok(sweep) => {
            for failure in &sweep.failed {
                warn!(
                    booking_id = %failure.booking_id,
                    code = %failure.code,
                    "Overdue booking left for the next sweep"
                );
            }
            if !sweep.expired.is_empty() {
                info!(expired = sweep.expired.len(), "Expiry sweep released slots");
            }
            sweep.expired.len()
        }
        Err(err) => {
            warn!(error = %err, "Expiry sweep failed, will retry next interval");
            0
        }
    }
}

async fn run_expiry_sweeper<S: DocumentStore>(service: ReservationService<S>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        sweep_expired(&service, OffsetDateTime::now_utc()).await;
    }
}

async fn serve<S: DocumentStore>(store: Arc<S>, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let service: ReservationService<S> = ReservationService::new(store, args.reservation_config());

    if args.expiry_sweep_secs > 0 {
        info!(every_secs = args.expiry_sweep_secs, "Starting expiry sweeper");
        tokio::spawn(run_expiry_sweeper(
            service.clone(),
            Duration::from_secs(args.expiry_sweep_secs),
        ));
    }

    let app: Router = build_router(AppState::new(service));

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing ParkWise server");

    if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        serve(Arc::new(SqliteStore::new_with_file(db_path)?), &args).await
    } else {
        info!("Using in-memory store");
        serve(Arc::new(MemoryStore::new()), &args).await
    }
}
