// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure capacity and booking lifecycle transitions.
//!
//! Nothing in this crate touches storage. Each function takes the current
//! documents and returns the documents that should replace them; callers
//! persist the results atomically.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::{apply_reservation, apply_transition, release_slot, reserve_slot};
pub use command::BookingCommand;
pub use error::CoreError;
pub use state::{ReservationResult, TransitionOutcome, TransitionResult};
