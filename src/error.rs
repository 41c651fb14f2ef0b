//! Error types for backend access, saving, and startup configuration.

use thiserror::Error;

/// Failure talking to the annotation backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection, DNS, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a status the contract does not accept
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body was not the expected JSON
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading the response body failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image bytes could not be decoded
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Why a save request was not (successfully) made.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Please select an area to crop first.")]
    NoCompletedCrop,

    #[error("The image has not finished loading yet.")]
    ImageNotReady,

    #[error("A save for this image is already in progress.")]
    SaveInFlight,

    #[error("Error saving annotation: {0}")]
    Submission(#[from] BackendError),
}

impl SaveError {
    /// True when the save was refused locally and nothing was sent.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, SaveError::Submission(_))
    }
}

/// Invalid command-line configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("backend URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),

    #[error("unexpected extra argument '{0}'")]
    UnexpectedArgument(String),
}
