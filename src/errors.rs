// errors.rs
use thiserror::Error;

/// Failure of a call against the remote service.
///
/// Callers only ever need to show `to_string()` to the user; the variants exist
/// so tests and logs can tell the failure kinds apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("API key not set. Please set an API key")]
    Unauthenticated,

    #[error("could not read the stored API key: {0}")]
    Credential(String),

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("could not connect to the API: {0}")]
    Transport(String),

    #[error("API request failed: {status} - {body}")]
    Http { status: String, body: String },

    #[error("failed to decode JSON response (status {status}): {message}\nResponse body: {body}")]
    Decode { status: u16, message: String, body: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Input rejected before anything is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store is corrupt: {0}")]
    Format(#[from] serde_json::Error),

    #[error("No configuration directory available for the credential store")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Release lookup failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Could not replace executable: {0}")]
    Io(#[from] std::io::Error),

    #[error("No releases found")]
    NoRelease,

    #[error("Unparseable version: {0}")]
    Version(String),
}
