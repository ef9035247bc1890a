#![allow(missing_docs)]

//! Errors reported by the rental engine.

use thiserror::Error;

use crate::models::EntityId;

/// Broad category of a [`RentalError`], used by frontends to pick wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Missing session, wrong role or wrong owner.
    Authorization,
    /// Unknown car or rental.
    NotFound,
    /// Registration clashes with an existing account.
    Conflict,
    /// Persistence failed.
    Storage,
}

/// Reasons an engine operation was refused. No refused operation mutates state.
#[derive(Debug, Error)]
pub enum RentalError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("not permitted")]
    PermissionDenied,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("car #{0} not found")]
    CarNotFound(EntityId),
    #[error("car #{0} is not available")]
    CarUnavailable(EntityId),
    #[error("rental #{0} not found")]
    RentalNotFound(EntityId),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDateFormat(String),
    #[error("start date {0} is in the past")]
    PastStartDate(chrono::NaiveDate),
    #[error("end date must be after start date")]
    NonPositiveDuration,
    #[error("total price is out of range")]
    PriceOverflow,
    #[error("no identifiers left")]
    IdsExhausted,
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl RentalError {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateFormat(_)
            | Self::PastStartDate(_)
            | Self::NonPositiveDuration
            | Self::PriceOverflow
            | Self::IdsExhausted => ErrorKind::Validation,
            Self::NotAuthenticated | Self::PermissionDenied | Self::InvalidCredentials => {
                ErrorKind::Authorization
            }
            Self::CarNotFound(_) | Self::RentalNotFound(_) => ErrorKind::NotFound,
            // An unavailable car is refused like a bad booking request.
            Self::CarUnavailable(_) => ErrorKind::Validation,
            Self::UsernameTaken(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience alias for engine results.
pub type RentalResult<T> = Result<T, RentalError>;
