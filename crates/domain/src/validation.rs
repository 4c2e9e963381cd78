// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{Coordinates, ParkingZone};

/// Upper bound of the parking stress index.
pub const MAX_PSI: u8 = 100;

/// Validates slot counts against `0 <= available <= total`.
///
/// # Errors
///
/// Returns `DomainError::InvalidCapacity` if `available_slots` exceeds
/// `total_slots`.
pub const fn validate_capacity(total_slots: u32, available_slots: u32) -> Result<(), DomainError> {
    if available_slots > total_slots {
        return Err(DomainError::InvalidCapacity {
            total_slots,
            available_slots,
            reason: "available slots exceed total slots",
        });
    }
    Ok(())
}

/// Validates the descriptive and pricing fields of a zone.
///
/// Capacity is checked separately by [`validate_capacity`].
///
/// # Errors
///
/// Returns an error if:
/// - The name, ward id or ward name is blank
/// - The coordinates are out of range
/// - The PSI exceeds [`MAX_PSI`]
pub fn validate_zone_fields(zone: &ParkingZone) -> Result<(), DomainError> {
    if zone.name.trim().is_empty() {
        return Err(DomainError::InvalidField {
            field: "name",
            message: String::from("Zone name cannot be empty"),
        });
    }
    if zone.ward_id.trim().is_empty() {
        return Err(DomainError::InvalidField {
            field: "ward_id",
            message: String::from("Ward id cannot be empty"),
        });
    }
    if zone.ward_name.trim().is_empty() {
        return Err(DomainError::InvalidField {
            field: "ward_name",
            message: String::from("Ward name cannot be empty"),
        });
    }
    Coordinates::new(zone.lat, zone.lng)?;
    if zone.psi > MAX_PSI {
        return Err(DomainError::InvalidPsi(zone.psi));
    }
    Ok(())
}

/// Validates a booking duration in hours.
///
/// # Errors
///
/// Returns `DomainError::InvalidDuration` for a zero duration.
pub const fn validate_duration(duration_hours: u32) -> Result<(), DomainError> {
    if duration_hours == 0 {
        return Err(DomainError::InvalidDuration(duration_hours));
    }
    Ok(())
}

/// Validates a search radius.
///
/// # Errors
///
/// Returns `DomainError::InvalidRadius` for negative, NaN or infinite values.
pub fn validate_radius(radius_km: f64) -> Result<(), DomainError> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(DomainError::InvalidRadius(radius_km));
    }
    Ok(())
}

/// Minimal shape check for a contact email.
///
/// # Errors
///
/// Returns `DomainError::InvalidField` unless the address has a non-empty
/// local part and a domain.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid: bool = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.chars().any(char::is_whitespace);
    if !valid {
        return Err(DomainError::InvalidField {
            field: "user_email",
            message: format!("'{email}' is not an email address"),
        });
    }
    Ok(())
}

/// Computes `price_per_hour * duration_hours`.
///
/// # Errors
///
/// Returns `DomainError::AmountOverflow` if the product does not fit in `u64`.
pub fn compute_amount(price_per_hour: u64, duration_hours: u32) -> Result<u64, DomainError> {
    price_per_hour
        .checked_mul(u64::from(duration_hours))
        .ok_or(DomainError::AmountOverflow {
            price_per_hour,
            duration_hours,
        })
}
