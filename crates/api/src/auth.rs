// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor roles and the authorization rules of every operation.
//!
//! Authentication happens outside this crate; callers arrive here already
//! identified as an [`AuthenticatedActor`].

use std::str::FromStr;

use parkwise_domain::Booking;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ReservationError};

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Municipal operators. May manage zones and drive any booking.
    Admin,
    /// A member of the public booking for themselves.
    Citizen,
    /// The trusted payment integration. May only record payments.
    PaymentProvider,
    /// Internal jobs such as the expiry sweeper.
    System,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Citizen => "citizen",
            Self::PaymentProvider => "payment_provider",
            Self::System => "system",
        }
    }
}

impl FromStr for Role {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "citizen" => Ok(Self::Citizen),
            "payment_provider" => Ok(Self::PaymentProvider),
            "system" => Ok(Self::System),
            _ => Err(ReservationError::invalid_input(
                "role",
                format!("unknown role '{s}'"),
            )),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor. For citizens this is their
    /// user id.
    pub id: String,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `role` - The role assigned to this actor
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    #[must_use]
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }

    #[must_use]
    pub fn citizen(id: impl Into<String>) -> Self {
        Self::new(id, Role::Citizen)
    }

    #[must_use]
    pub fn system() -> Self {
        Self::new("system", Role::System)
    }
}

fn require(
    actor: &AuthenticatedActor,
    action: &str,
    allowed: &[Role],
    required_role: &str,
) -> Result<(), AuthError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: required_role.to_string(),
        })
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Zone CRUD and capacity adjustment are admin-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_manage_zones(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        require(actor, action, &[Role::Admin], "Admin")
    }

    /// Starting, completing and settling a booking are admin-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_drive_booking(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        require(actor, action, &[Role::Admin], "Admin")
    }

    /// Payment may be recorded by an admin or the payment provider.
    ///
    /// # Errors
    ///
    /// Returns an error for any other role.
    pub fn authorize_mark_paid(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(
            actor,
            "mark_paid",
            &[Role::Admin, Role::PaymentProvider],
            "Admin or PaymentProvider",
        )
    }

    /// Expiry is run by an admin or the system sweeper.
    ///
    /// # Errors
    ///
    /// Returns an error for any other role.
    pub fn authorize_expire(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(actor, "expire", &[Role::Admin, Role::System], "Admin or System")
    }

    /// Admins may cancel any booking; citizens only their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is neither an admin nor the owner.
    pub fn authorize_cancel(actor: &AuthenticatedActor, booking: &Booking) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Citizen if actor.id == booking.user_id => Ok(()),
            Role::Citizen => Err(AuthError::NotOwner {
                action: String::from("cancel"),
            }),
            Role::PaymentProvider | Role::System => Err(AuthError::Unauthorized {
                action: String::from("cancel"),
                required_role: String::from("Admin or Citizen"),
            }),
        }
    }

    /// Citizens book for themselves; admins may book on anyone's behalf.
    ///
    /// # Errors
    ///
    /// Returns an error if a citizen books for another user or the role
    /// cannot book at all.
    pub fn authorize_book_for(actor: &AuthenticatedActor, user_id: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Citizen if actor.id == user_id => Ok(()),
            Role::Citizen => Err(AuthError::NotOwner {
                action: String::from("book_zone"),
            }),
            Role::PaymentProvider | Role::System => Err(AuthError::Unauthorized {
                action: String::from("book_zone"),
                required_role: String::from("Admin or Citizen"),
            }),
        }
    }

    /// Resolves which user's bookings the actor may see.
    ///
    /// Citizens are always scoped to themselves. Other roles see the
    /// requested user, or everyone when `requested` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a citizen asks for another user's bookings.
    pub fn scope_booking_view(
        actor: &AuthenticatedActor,
        requested: Option<&str>,
    ) -> Result<Option<String>, AuthError> {
        match actor.role {
            Role::Citizen => match requested {
                Some(user_id) if user_id != actor.id => Err(AuthError::NotOwner {
                    action: String::from("list_bookings"),
                }),
                _ => Ok(Some(actor.id.clone())),
            },
            Role::Admin | Role::PaymentProvider | Role::System => {
                Ok(requested.map(str::to_string))
            }
        }
    }

    /// Single-booking reads follow the same scoping as listings.
    ///
    /// # Errors
    ///
    /// Returns an error if a citizen reads another user's booking.
    pub fn authorize_view_booking(actor: &AuthenticatedActor, booking: &Booking) -> Result<(), AuthError> {
        Self::scope_booking_view(actor, Some(&booking.user_id)).map(|_| ())
    }
}
