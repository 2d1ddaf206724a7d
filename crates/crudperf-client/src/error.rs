use thiserror::Error;

/// Errors raised while setting up the HTTP client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
