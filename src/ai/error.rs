use thiserror::Error;

/// Failures from the outbound AI-provider calls.
///
/// `BadPayload` is special: for question generation and answer evaluation the
/// gateway swallows it and substitutes a fixed fallback, so only the other
/// variants ever reach a handler for those operations. Transcription and
/// follow-up generation propagate everything.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider response contained no content")]
    EmptyResponse,

    #[error("provider returned malformed payload: {0}")]
    BadPayload(String),
}
