use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling or parsing an uploaded file
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported file encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("decompression failed: {detail}")]
    DecompressionFailed { detail: String },

    #[error("feature collection parse failed: {failed}/{total} features failed to parse")]
    PartialParseFailure { failed: usize, total: usize },

    #[error("buffer of {size} bytes is not a feature collection and exceeds the {limit} byte whole-parse limit")]
    BufferTooLargeToParse { size: usize, limit: usize },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
