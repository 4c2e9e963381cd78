// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor extraction at the server boundary.
//!
//! Identity is asserted by the gateway in front of this server through two
//! headers, `x-actor-id` and `x-actor-role`. This server does not
//! authenticate; it only turns those headers into an
//! [`AuthenticatedActor`] that the reservation service authorizes.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use parkwise_api::{AuthenticatedActor, Role};
use tracing::{debug, warn};

use crate::ErrorResponse;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor for the acting user.
///
/// ```ignore
/// async fn my_handler(RequestActor(actor): RequestActor) -> ... {
///     // actor: AuthenticatedActor
/// }
/// ```
pub struct RequestActor(pub AuthenticatedActor);

impl<T: Send + Sync> FromRequestParts<T> for RequestActor {
    type Rejection = ActorError;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        let id: &str = header(parts, ACTOR_ID_HEADER)?;
        if id.trim().is_empty() {
            return Err(ActorError::MissingHeader(ACTOR_ID_HEADER));
        }
        let role: Role = header(parts, ACTOR_ROLE_HEADER)?
            .to_lowercase()
            .parse()
            .map_err(|_| {
                warn!(actor_id = id, "Unknown actor role");
                ActorError::InvalidRole
            })?;

        debug!(actor_id = id, %role, "Resolved request actor");
        Ok(Self(AuthenticatedActor::new(id, role)))
    }
}

fn header<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, ActorError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| {
            debug!(header = name, "Missing actor header");
            ActorError::MissingHeader(name)
        })?
        .to_str()
        .map_err(|_| {
            warn!(header = name, "Actor header is not valid ASCII");
            ActorError::InvalidEncoding(name)
        })
}

/// Actor extraction errors.
#[derive(Debug)]
pub enum ActorError {
    MissingHeader(&'static str),
    InvalidEncoding(&'static str),
    InvalidRole,
}

impl IntoResponse for ActorError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::MissingHeader(name) => (
                StatusCode::UNAUTHORIZED,
                "missing_actor",
                format!("Missing {name} header"),
            ),
            Self::InvalidEncoding(name) => (
                StatusCode::BAD_REQUEST,
                "invalid_actor",
                format!("Header {name} is not valid text"),
            ),
            Self::InvalidRole => (
                StatusCode::BAD_REQUEST,
                "invalid_actor",
                String::from(
                    "Invalid role. Must be 'admin', 'citizen', 'payment_provider' or 'system'",
                ),
            ),
        };
        ErrorResponse::new(code, message).into_response_with(status)
    }
}
