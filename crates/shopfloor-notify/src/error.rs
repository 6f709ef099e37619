//! # Notification Errors
//!
//! None of these reach the till. The dispatcher logs them with `warn!` and
//! moves on; the sale has already committed by the time delivery starts.

use thiserror::Error;

/// Result type alias for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Things that can go wrong while delivering a low-stock alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Configuration cannot deliver (e.g. enabled without a gateway).
    #[error("Invalid notification config: {0}")]
    InvalidConfig(String),

    /// Recipient or push token lookup failed.
    #[error("Recipient lookup failed: {0}")]
    Lookup(#[from] shopfloor_db::DbError),

    /// Request never got a response (DNS, TLS, timeout, ...).
    #[error("Push transport error: {0}")]
    Transport(String),

    /// Gateway answered with a non-success status.
    #[error("Push gateway rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Message could not be encoded.
    #[error("Failed to encode push message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}
