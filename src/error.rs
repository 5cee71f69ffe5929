use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced to the layer above.
///
/// Provider trouble (`Transport`, `Provider`, `ProviderMalformed`) maps to a
/// retryable service-unavailable condition; `Generation` is fatal for the
/// whole create; `NotFound` and `Validation` map to the usual 404/400.
/// Duplicate-creation races are resolved to idempotent success inside the
/// services and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider response malformed: {0}")]
    ProviderMalformed(String),

    #[error("generated output violates the expected structure: {0}")]
    Generation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Db(#[from] libsql::Error),

    #[error("deserialization error: {0}")]
    Row(#[from] serde_json::Error),

    #[error("row decoding error: {0}")]
    RowDecode(#[from] serde::de::value::Error),

    #[error("stored timestamp is not RFC 3339: {0}")]
    Timestamp(#[from] chrono::ParseError),
}
