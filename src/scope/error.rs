//! Acquisition error types.

use thiserror::Error;

/// Errors that can occur while capturing a frame from the scope.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// Device path invalid, port busy or not a terminal.
    #[error("Failed to open {path}: {source}")]
    ChannelOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while writing the request or reading the response.
    #[error("Channel error: {0}")]
    Channel(#[from] std::io::Error),

    /// No data arrived within the per-wait timeout.
    #[error("Timeout after {received} of {expected} bytes")]
    Timeout { received: usize, expected: usize },

    /// More bytes arrived than one frame holds; the stream is out of step.
    #[error("Overflow: {received} bytes received, frame is {expected} bytes")]
    Overflow { received: usize, expected: usize },
}

impl AcquireError {
    /// Whether the channel should be flushed before the next capture.
    pub fn needs_resync(&self) -> bool {
        matches!(self, Self::Overflow { .. } | Self::Timeout { received: 1.., .. })
    }
}

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;
