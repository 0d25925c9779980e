use thiserror::Error;

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during topology construction
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid position: expected at least 2 ordinates, found {0}")]
    InvalidPosition(usize),

    #[error("topology conversion failed: {message}")]
    TopologyConversionFailed {
        message: String,
        /// Truncated preview of the offending input, ASCII or hex.
        preview: String,
        /// Diagnostics captured before the failure.
        stderr: String,
    },
}
