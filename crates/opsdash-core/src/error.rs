//! Error types for dashboard operations.

use thiserror::Error;

use crate::input::InputField;

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from dashboard operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A slider value was rejected at the update boundary.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The control name is not one of the recognized input fields.
    #[error("unknown input field: {0}")]
    UnknownField(String),

    /// The prediction service answered with something unusable.
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// The prediction request did not complete.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Channel closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}

/// Reasons a slider value can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The raw control value did not parse as a number.
    #[error("{field} value {raw:?} is not numeric")]
    NotNumeric { field: InputField, raw: String },

    /// NaN or an infinity.
    #[error("{field} value {value} is not finite")]
    NotFinite { field: InputField, value: f64 },

    /// Outside the field's domain while the range policy rejects.
    #[error("{field} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: InputField,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::ChannelClosed
    }
}
