// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// A conditional write found a different version than expected.
    ///
    /// Callers re-read and retry; nothing in the batch was applied.
    #[error("Version conflict on {collection}/{id}")]
    VersionConflict {
        /// The collection holding the document.
        collection: &'static str,
        /// The document id.
        id: String,
    },
    /// A write would leave a booking pointing at a missing zone.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
    /// A stored value violates a schema constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    /// The same document appears twice in one batch.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
    /// The store could not be reached or did not answer.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Database connection failed.
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    /// A database error occurred.
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// A stored row could not be turned back into a document.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
    /// Initialization error.
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl PersistenceError {
    /// True for failures of the transport rather than of the request.
    ///
    /// Only these are worth retrying for idempotent reads.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::DatabaseConnectionFailed(_)
        )
    }
}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                Self::ConstraintViolation(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                Self::Unavailable(info.message().to_string())
            }
            // SQLITE_BUSY and SQLITE_LOCKED surface as unknown kinds.
            Error::DatabaseError(_, ref info)
                if info.message().contains("database is locked")
                    || info.message().contains("database is busy") =>
            {
                Self::Unavailable(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PersistenceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Unavailable(format!("storage task failed: {err}"))
    }
}
