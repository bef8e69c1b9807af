//! Unified error type for the moneybook service.
//!
//! Core functions return [`Result`]; the API layer maps each variant to an HTTP status
//! via [`Error::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

/// All errors produced by configuration, storage, the rate client and the API.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Any failure reported by the database layer
    #[error("Database error: {message}")]
    Database {
        /// Message from the database driver
        message: String,
    },

    /// A request field failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Amount is not a positive integer
    #[error("Invalid amount: {amount:?} (must be a positive integer)")]
    InvalidAmount {
        /// The amount as received
        amount: String,
    },

    /// More receipt images than a record can hold
    #[error("Too many images: {count} (at most {max} allowed)")]
    TooManyImages {
        /// Number of images supplied
        count: usize,
        /// Upper bound
        max: usize,
    },

    /// Record does not exist or belongs to another user
    #[error("Record not found: {id}")]
    RecordNotFound {
        /// Requested record id
        id: i64,
    },

    /// Category does not exist or is not accessible
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested category id
        id: i64,
    },

    /// Account does not exist or is not accessible
    #[error("Account not found: {id}")]
    AccountNotFound {
        /// Requested account id
        id: i64,
    },

    /// The external exchange-rate API failed
    #[error("Exchange rate API error: {message}")]
    RateApi {
        /// Description of the failure
        message: String,
    },

    /// A month snapshot lacks a quote needed for a conversion
    #[error("No exchange rate from {from} to {to} for {year_month}")]
    RateUnavailable {
        /// Source currency
        from: String,
        /// Target currency
        to: String,
        /// Month of the snapshot
        year_month: String,
    },

    /// Missing or invalid identity token
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the caller was rejected
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database {
            message: value.to_string(),
        }
    }
}

impl From<sea_orm::TransactionError<Self>> for Error {
    fn from(value: sea_orm::TransactionError<Self>) -> Self {
        match value {
            sea_orm::TransactionError::Connection(e) => e.into(),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::RateApi {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// HTTP status the API responds with for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidAmount { .. } | Self::TooManyImages { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::RecordNotFound { .. }
            | Self::CategoryNotFound { .. }
            | Self::AccountNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::RateApi { .. } => StatusCode::BAD_GATEWAY,
            Self::RateUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Config { .. } | Self::Database { .. } | Self::Io(_) | Self::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
