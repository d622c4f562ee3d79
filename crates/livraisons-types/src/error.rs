//! Error types for livraisons

use thiserror::Error;

use crate::FieldError;

/// Marker the backend puts in row-level access policy rejections
const POLICY_MARKER: &str = "policy";

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// The four classes of failure a user can be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local form check failed, nothing was sent to the store
    Validation,
    /// The store's row-level policy refused the operation
    PermissionDenied,
    /// Any other store, network or disk failure
    RemoteFailure,
    /// An action was blocked before doing anything (empty export, bad rate)
    CalculationPrecondition,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid delivery: {}", summarize_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store error: {0}")]
    Remote(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Delivery not found: #{0}")]
    DeliveryNotFound(i64),

    #[error("CSV export error: {0}")]
    Export(String),

    #[error("Import error: {0}")]
    Import(String),
}

impl Error {
    /// Build a store error from a raw backend message.
    ///
    /// Messages mentioning an access policy become `PermissionDenied`,
    /// everything else stays a generic store failure.
    pub fn remote(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains(POLICY_MARKER) {
            Error::PermissionDenied(message)
        } else {
            Error::Remote(message)
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::Precondition(_) => ErrorKind::CalculationPrecondition,
            Error::Io(_)
            | Error::Json(_)
            | Error::Config(_)
            | Error::Remote(_)
            | Error::DeliveryNotFound(_)
            | Error::Export(_)
            | Error::Import(_) => ErrorKind::RemoteFailure,
        }
    }

    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Error::Validation(fields) => fields,
            _ => &[],
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Export(err.to_string())
    }
}

fn summarize_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
