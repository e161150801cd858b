//! Error types for syncwatch event decoding.

use thiserror::Error;

/// Errors that can occur while decoding daemon events.
///
/// Only problems with the event envelope are errors. A recognized event whose
/// payload cannot be extracted decodes to
/// [`EventPayload::Malformed`](crate::EventPayload::Malformed) instead.
#[derive(Debug, Error)]
pub enum EventError {
    /// The batch is not valid JSON, or not a JSON array
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),

    /// An event lacks a usable id or type
    #[error("invalid event envelope: {0}")]
    InvalidEnvelope(String),

    /// A completion percentage that is not a finite number
    #[error("invalid completion value: {0}")]
    InvalidCompletion(f64),
}
