//! Error types for the stats client.

use thiserror::Error;

/// Result type alias for stats client operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur while talking to the upstream stats API.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The gRPC channel could not be established. Fatal at startup.
    #[error("failed to connect to stats api at {addr}: {reason}")]
    Connection { addr: String, reason: String },

    /// A call could not complete (transport error, deadline, bad response).
    #[error("{call} failed: {reason}")]
    Unavailable { call: String, reason: String },
}

impl StatsError {
    pub(crate) fn unavailable(call: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            call: call.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error happened mid-scrape (as opposed to at startup).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
