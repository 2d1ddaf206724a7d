use thiserror::Error;

/// Canonical error type for workload definitions and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation name did not match any known operation.
    #[error("unknown operation `{0}` (expected create, update or delete)")]
    UnknownOperation(String),

    /// An object type name did not match any known object type.
    #[error("unknown object type `{0}` (expected todo or project)")]
    UnknownObjectType(String),

    /// An export format name did not match any known format.
    #[error("unknown export format `{0}` (expected csv or json)")]
    UnknownFormat(String),

    /// Configuration values were loaded but are not usable.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    /// Creates a `ValidationError` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
