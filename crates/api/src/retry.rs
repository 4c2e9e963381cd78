// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded retries: idempotent reads on transient failures, and
//! read-modify-commit loops on version conflicts.
//!
//! A commit that fails with a transient error may or may not have landed,
//! so it is never retried; it is reported as `StoreUnavailable`.

use std::future::Future;

use parkwise_persistence::{Committed, DocumentStore, PersistenceError, WriteBatch};
use tracing::{debug, warn};

use crate::change_feed::ChangeFeed;
use crate::config::ReservationConfig;
use crate::error::ReservationError;

/// Runs `read` until it succeeds, fails permanently, or the read retry
/// budget is spent.
///
/// # Errors
///
/// Returns the last error, translated, once retries are exhausted or the
/// failure is not transient.
pub async fn read_with_retry<T, F, Fut>(
    config: &ReservationConfig,
    operation: &'static str,
    mut read: F,
) -> Result<T, ReservationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PersistenceError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match read().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < config.max_read_retries => {
                attempt += 1;
                warn!(operation, attempt, error = %err, "Transient read failure, retrying");
                tokio::time::sleep(config.read_retry_backoff.saturating_mul(attempt)).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Commits `batch` and publishes the result on the feed.
///
/// `Ok(None)` means a version conflict: the caller should re-read and try
/// again.
///
/// # Errors
///
/// Returns any other store failure, translated.
pub async fn try_commit<S: DocumentStore>(
    store: &S,
    feed: &ChangeFeed,
    batch: WriteBatch,
) -> Result<Option<Vec<Committed>>, ReservationError> {
    match store.commit(batch).await {
        Ok(committed) => {
            feed.publish_committed(committed.clone());
            Ok(Some(committed))
        }
        Err(PersistenceError::VersionConflict { collection, id }) => {
            debug!(collection, id, "Version conflict");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Runs `attempt` until it yields a value, fails, or the CAS budget is
/// spent.
///
/// An attempt returns `Ok(None)` when its commit hit a version conflict.
///
/// # Errors
///
/// Returns the attempt's own error, or `Contention` after
/// `max_cas_retries + 1` conflicting attempts.
pub async fn cas_loop<T, F, Fut>(
    config: &ReservationConfig,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, ReservationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ReservationError>>,
{
    let attempts: u32 = config.max_cas_retries.saturating_add(1);
    for n in 1..=attempts {
        if let Some(done) = attempt().await? {
            return Ok(done);
        }
        debug!(operation, attempt = n, "Retrying after version conflict");
    }
    warn!(operation, attempts, "CAS retry budget exhausted");
    Err(ReservationError::Contention {
        operation,
        attempts,
    })
}
