// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::time::Duration;

/// Retry budgets shared by every store-touching component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationConfig {
    /// Re-attempts after a version conflict before giving up with
    /// `Contention`. The first attempt is not counted.
    pub max_cas_retries: u32,
    /// Re-attempts of an idempotent read after a transient store failure.
    pub max_read_retries: u32,
    /// Base delay between read retries; attempt `n` waits `n` times this.
    pub read_retry_backoff: Duration,
}

impl ReservationConfig {
    pub const DEFAULT_MAX_CAS_RETRIES: u32 = 5;
    pub const DEFAULT_MAX_READ_RETRIES: u32 = 3;
    pub const DEFAULT_READ_RETRY_BACKOFF: Duration = Duration::from_millis(25);

    #[must_use]
    pub const fn with_max_cas_retries(mut self, retries: u32) -> Self {
        self.max_cas_retries = retries;
        self
    }

    #[must_use]
    pub const fn with_max_read_retries(mut self, retries: u32) -> Self {
        self.max_read_retries = retries;
        self
    }

    #[must_use]
    pub const fn with_read_retry_backoff(mut self, backoff: Duration) -> Self {
        self.read_retry_backoff = backoff;
        self
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            max_cas_retries: Self::DEFAULT_MAX_CAS_RETRIES,
            max_read_retries: Self::DEFAULT_MAX_READ_RETRIES,
            read_retry_backoff: Self::DEFAULT_READ_RETRY_BACKOFF,
        }
    }
}
