// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The single entry point for citizens, admins and integrations.
//!
//! Every public operation validates its input, checks the actor's role,
//! delegates to the component that owns the data, and returns a typed
//! [`ReservationError`]. The service holds no state of its own beyond
//! shared handles.

use std::sync::Arc;

use parkwise_domain::{
    Booking, BookingId, Coordinates, NearbyZone, NewZone, ParkingZone, ZoneId, distance_km,
    nearest, validate_duration, validate_email, validate_radius,
};
use parkwise_persistence::{BookingFilter, DocumentStore, Versioned};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::auth::{AuthenticatedActor, AuthorizationService, Role};
use crate::booking_machine::{BookingStateMachine, NewBooking};
use crate::change_feed::{ChangeFeed, FeedFilter, Subscription};
use crate::config::ReservationConfig;
use crate::error::{AuthError, ReservationError};
use crate::request_response::{
    AdjustCapacityRequest, BookZoneRequest, ExpireOverdueResponse, ListBookingsQuery,
    NearbyQuery,
};
use crate::snapshot::SnapshotSubscription;
use crate::zone_store::{ZoneStore, ZoneUpdate};

fn parse_zone_id(value: &str) -> Result<ZoneId, ReservationError> {
    if value.trim().is_empty() {
        return Err(ReservationError::invalid_input("zone_id", "must not be empty"));
    }
    Ok(ZoneId::new(value))
}

fn parse_booking_id(value: &str) -> Result<BookingId, ReservationError> {
    if value.trim().is_empty() {
        return Err(ReservationError::invalid_input(
            "booking_id",
            "must not be empty",
        ));
    }
    Ok(BookingId::new(value))
}

/// Façade over the zone store, booking machine and change feed.
pub struct ReservationService<S> {
    store: Arc<S>,
    config: ReservationConfig,
    feed: ChangeFeed,
    zones: ZoneStore<S>,
    bookings: BookingStateMachine<S>,
}

impl<S> Clone for ReservationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
            feed: self.feed.clone(),
            zones: self.zones.clone(),
            bookings: self.bookings.clone(),
        }
    }
}

impl<S: DocumentStore> ReservationService<S> {
    /// Wires the components over one store and one change feed.
    #[must_use]
    pub fn new(store: Arc<S>, config: ReservationConfig) -> Self {
        let feed: ChangeFeed = ChangeFeed::new();
        Self {
            zones: ZoneStore::new(Arc::clone(&store), feed.clone(), config),
            bookings: BookingStateMachine::new(Arc::clone(&store), feed.clone(), config),
            store,
            config,
            feed,
        }
    }

    // ========================================================================
    // Citizen operations
    // ========================================================================

    /// Books one slot in a zone.
    ///
    /// When both `center` and `max_radius_km` are given, zones further away
    /// than the radius are refused before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput`, `Unauthorized`, `ZoneOutOfRange`, or any
    /// error of [`BookingStateMachine::create`].
    pub async fn book_zone(
        &self,
        actor: &AuthenticatedActor,
        request: &BookZoneRequest,
    ) -> Result<Booking, ReservationError> {
        let zone_id: ZoneId = parse_zone_id(&request.zone_id)?;
        let user_id: String = request.user_id.clone().unwrap_or_else(|| actor.id.clone());
        AuthorizationService::authorize_book_for(actor, &user_id)?;
        validate_email(&request.user_email)?;
        validate_duration(request.duration_hours)?;

        if let (Some(center), Some(max_radius_km)) = (request.center, request.max_radius_km) {
            let center: Coordinates = Coordinates::new(center.lat, center.lng)?;
            validate_radius(max_radius_km)?;
            let zone: Versioned<ParkingZone> = self.zones.get_zone(&zone_id).await?;
            let distance: f64 = distance_km(center, zone.data.coordinates());
            if distance > max_radius_km {
                return Err(ReservationError::ZoneOutOfRange {
                    zone_id: zone_id.to_string(),
                    distance_km: distance,
                    max_radius_km,
                });
            }
        }

        self.bookings
            .create(&NewBooking {
                zone_id,
                user_id,
                user_email: request.user_email.clone(),
                duration_hours: request.duration_hours,
            })
            .await
    }

    /// Open zones around a point, nearest first, from a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad coordinates or radius, or
    /// `StoreUnavailable`.
    pub async fn list_nearby(&self, query: &NearbyQuery) -> Result<Vec<NearbyZone>, ReservationError> {
        let center: Coordinates = Coordinates::new(query.lat, query.lng)?;
        validate_radius(query.radius_km)?;
        let zones: Vec<ParkingZone> = self.zones.list_zones().await?;
        let found: Vec<NearbyZone> = nearest(center, &zones, query.radius_km, query.limit);
        debug!(
            candidates = zones.len(),
            found = found.len(),
            radius_km = query.radius_km,
            "Nearby search"
        );
        Ok(found)
    }

    // ========================================================================
    // Zones
    // ========================================================================

    /// # Errors
    ///
    /// Returns `ZoneNotFound` or `StoreUnavailable`.
    pub async fn get_zone(&self, zone_id: &str) -> Result<ParkingZone, ReservationError> {
        let zone_id: ZoneId = parse_zone_id(zone_id)?;
        Ok(self.zones.get_zone(&zone_id).await?.data)
    }

    /// # Errors
    ///
    /// Returns `StoreUnavailable` once read retries run out.
    pub async fn list_zones(&self) -> Result<Vec<ParkingZone>, ReservationError> {
        self.zones.list_zones().await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or any error of
    /// [`ZoneStore::create_zone`].
    pub async fn create_zone(
        &self,
        actor: &AuthenticatedActor,
        new_zone: NewZone,
    ) -> Result<ParkingZone, ReservationError> {
        AuthorizationService::authorize_manage_zones(actor, "create_zone")?;
        let zone: ParkingZone = self.zones.create_zone(new_zone).await?;
        info!(actor = %actor.id, zone_id = %zone.id, "Zone created");
        Ok(zone)
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or any error of
    /// [`ZoneStore::update_zone`].
    pub async fn update_zone(
        &self,
        actor: &AuthenticatedActor,
        zone_id: &str,
        update: &ZoneUpdate,
    ) -> Result<ParkingZone, ReservationError> {
        AuthorizationService::authorize_manage_zones(actor, "update_zone")?;
        let zone_id: ZoneId = parse_zone_id(zone_id)?;
        self.zones.update_zone(&zone_id, update).await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or `InvalidCapacity`.
    pub async fn adjust_capacity(
        &self,
        actor: &AuthenticatedActor,
        zone_id: &str,
        request: &AdjustCapacityRequest,
    ) -> Result<ParkingZone, ReservationError> {
        AuthorizationService::authorize_manage_zones(actor, "adjust_capacity")?;
        let zone_id: ZoneId = parse_zone_id(zone_id)?;
        self.zones
            .adjust_capacity(&zone_id, request.total_slots, request.available_slots)
            .await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or `ZoneInUse`.
    pub async fn delete_zone(
        &self,
        actor: &AuthenticatedActor,
        zone_id: &str,
    ) -> Result<(), ReservationError> {
        AuthorizationService::authorize_manage_zones(actor, "delete_zone")?;
        let zone_id: ZoneId = parse_zone_id(zone_id)?;
        self.zones.delete_zone(&zone_id).await?;
        info!(actor = %actor.id, %zone_id, "Zone deleted");
        Ok(())
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// # Errors
    ///
    /// Returns `BookingNotFound`, or `Unauthorized` when a citizen reads
    /// someone else's booking.
    pub async fn get_booking(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        let booking_id: BookingId = parse_booking_id(booking_id)?;
        let booking: Booking = self.bookings.get(&booking_id).await?.data;
        AuthorizationService::authorize_view_booking(actor, &booking)?;
        Ok(booking)
    }

    /// Bookings visible to `actor`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when a citizen asks for another user.
    pub async fn list_bookings(
        &self,
        actor: &AuthenticatedActor,
        query: &ListBookingsQuery,
    ) -> Result<Vec<Booking>, ReservationError> {
        let user_id: Option<String> =
            AuthorizationService::scope_booking_view(actor, query.user_id.as_deref())?;
        let zone_id: Option<ZoneId> = query
            .zone_id
            .as_deref()
            .map(parse_zone_id)
            .transpose()?;
        let filter: BookingFilter = BookingFilter {
            zone_id,
            user_id,
            holding_only: query.holding_only,
        };
        self.bookings.list(&filter).await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or `InvalidTransition`.
    pub async fn activate(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        AuthorizationService::authorize_drive_booking(actor, "activate")?;
        self.bookings.activate(&parse_booking_id(booking_id)?).await
    }

    /// Idempotent: an already paid booking is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless admin or payment provider, or
    /// `InvalidTransition` for an unpaid booking that already ended.
    pub async fn mark_paid(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        AuthorizationService::authorize_mark_paid(actor)?;
        self.bookings.mark_paid(&parse_booking_id(booking_id)?).await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or `InvalidTransition`.
    pub async fn complete(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        AuthorizationService::authorize_drive_booking(actor, "complete")?;
        self.bookings.complete(&parse_booking_id(booking_id)?).await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, or `InvalidTransition`.
    pub async fn mark_paid_and_complete(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        AuthorizationService::authorize_drive_booking(actor, "mark_paid_and_complete")?;
        self.bookings
            .mark_paid_and_complete(&parse_booking_id(booking_id)?)
            .await
    }

    /// Admins cancel any booking; citizens only their own.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`, `BookingNotFound` or `InvalidTransition`.
    pub async fn cancel(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        let booking_id: BookingId = parse_booking_id(booking_id)?;
        if actor.role != Role::Admin {
            // The owner never changes, so checking it ahead of the CAS loop is safe.
            let booking: Booking = self.bookings.get(&booking_id).await?.data;
            AuthorizationService::authorize_cancel(actor, &booking)?;
        }
        self.bookings.cancel(&booking_id).await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` unless admin or system, or `InvalidTransition`.
    pub async fn expire(
        &self,
        actor: &AuthenticatedActor,
        booking_id: &str,
    ) -> Result<Booking, ReservationError> {
        AuthorizationService::authorize_expire(actor)?;
        self.bookings.expire(&parse_booking_id(booking_id)?).await
    }

    /// Expires every held booking whose duration elapsed before `now`.
    ///
    /// Per-booking failures are reported in the response.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless admin or system.
    pub async fn expire_overdue(
        &self,
        actor: &AuthenticatedActor,
        now: OffsetDateTime,
    ) -> Result<ExpireOverdueResponse, ReservationError> {
        AuthorizationService::authorize_expire(actor)?;
        self.bookings.expire_overdue(now).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Resolves the filter `actor` may actually listen on.
    fn scope_filter(
        actor: &AuthenticatedActor,
        filter: FeedFilter,
    ) -> Result<FeedFilter, AuthError> {
        match filter {
            FeedFilter::Zones => Ok(FeedFilter::Zones),
            FeedFilter::Bookings { user_id } => {
                let user_id: Option<String> =
                    AuthorizationService::scope_booking_view(actor, user_id.as_deref())?;
                Ok(FeedFilter::Bookings { user_id })
            }
        }
    }

    /// Raw change events, scoped to what `actor` may see.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when a citizen asks for another user's bookings.
    pub fn subscribe_changes(
        &self,
        actor: &AuthenticatedActor,
        filter: FeedFilter,
    ) -> Result<Subscription, ReservationError> {
        let filter: FeedFilter = Self::scope_filter(actor, filter)?;
        Ok(self.feed.subscribe(filter))
    }

    /// Full collection snapshots on every change.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when a citizen asks for another user's bookings.
    pub fn subscribe_snapshots(
        &self,
        actor: &AuthenticatedActor,
        filter: FeedFilter,
    ) -> Result<SnapshotSubscription<S>, ReservationError> {
        let filter: FeedFilter = Self::scope_filter(actor, filter)?;
        let subscription: Subscription = self.feed.subscribe(filter.clone());
        Ok(SnapshotSubscription::new(
            Arc::clone(&self.store),
            self.config,
            subscription,
            filter,
        ))
    }
}
