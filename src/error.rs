//! Defines the app level error type, its coarse [ErrorKind] and the conversion to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The errors that may occur in the ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount was not a finite, positive number with at most cent
    /// precision after rounding.
    ///
    /// Callers should pass in the offending text.
    #[error("\"{0}\" is not a valid positive amount")]
    InvalidAmount(String),

    /// Delimited input did not have exactly three fields.
    #[error("expected 3 fields separated by ';', got {0}")]
    WrongFieldCount(usize),

    /// Delimited input had three fields but the one at this position (from 1)
    /// was blank.
    #[error("field {0} is empty")]
    EmptyField(usize),

    /// The confirmation token is not the one currently held for the
    /// conversation, e.g. because the same button press was delivered twice.
    #[error("the confirmation was already processed")]
    StaleConfirmation,

    /// Text or a decision arrived while the conversation was not waiting for
    /// one.
    #[error("there is no pending action for this conversation")]
    NothingPending,

    /// The month/year input could not be turned into a calendar month.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// The store was busy or locked by another writer. Retrying may succeed.
    #[error("the database is busy: {0}")]
    StorageTransient(String),

    /// A commit kept failing with transient errors until the retry budget ran
    /// out.
    #[error("gave up after {attempts} attempts: {reason}")]
    StorageFatal {
        /// How many times the commit was attempted.
        attempts: u32,
        /// The last error seen.
        reason: String,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A blocking task running a store operation panicked or was cancelled.
    #[error("the background task failed: {0}")]
    TaskFailed(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The cached balance does not match the sum of the committed movements.
    #[error("cached balance {cached} does not match the movements total {computed}")]
    BalanceMismatch {
        /// The value of the balance cell.
        cached: Decimal,
        /// Income minus expenses over the movement table.
        computed: Decimal,
    },
}

/// The coarse error categories reported to the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The amount is not a positive number.
    InvalidAmount,
    /// Delimited input did not have three non-empty fields.
    WrongFieldCount,
    /// The confirmation was already handled.
    StaleConfirmation,
    /// The conversation was not waiting for this input.
    NothingPending,
    /// The month or year is malformed.
    InvalidPeriod,
    /// The database was busy; trying again may work.
    StorageTransient,
    /// The database failed and retrying will not help.
    StorageFatal,
    /// The configured timezone is not known.
    InvalidTimezone,
}

impl Error {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Error::WrongFieldCount(_) | Error::EmptyField(_) => ErrorKind::WrongFieldCount,
            Error::StaleConfirmation => ErrorKind::StaleConfirmation,
            Error::NothingPending => ErrorKind::NothingPending,
            Error::InvalidPeriod(_) => ErrorKind::InvalidPeriod,
            Error::StorageTransient(_) => ErrorKind::StorageTransient,
            Error::StorageFatal { .. }
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::TaskFailed(_)
            | Error::BalanceMismatch { .. } => ErrorKind::StorageFatal,
            Error::InvalidTimezone(_) => ErrorKind::InvalidTimezone,
        }
    }

    /// Whether retrying the same store operation may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::StorageTransient
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                Error::StorageTransient(value.to_string())
            }
            _ => {
                tracing::error!("an unhandled SQL error occurred: {}", value);
                Error::SqlError(value)
            }
        }
    }
}

/// The JSON body sent for errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error category.
    pub error: ErrorKind,
    /// A human readable description.
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::InvalidAmount
            | ErrorKind::WrongFieldCount
            | ErrorKind::InvalidPeriod
            | ErrorKind::NothingPending => StatusCode::BAD_REQUEST,
            ErrorKind::StaleConfirmation => StatusCode::CONFLICT,
            ErrorKind::StorageTransient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::StorageFatal | ErrorKind::InvalidTimezone => {
                tracing::error!("An unexpected error occurred: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
