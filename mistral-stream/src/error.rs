//! Error taxonomy for chat requests and stream decoding, plus internal helpers
//! for mapping HTTP/reqwest errors to [`MistralError`].

use std::time::Duration;

/// Default timeout reported when reqwest gives up on a request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from Mistral chat operations.
///
/// The variants fall into three groups a caller can tell apart:
/// the server rejected the request ([`Api`](Self::Api), [`Network`](Self::Network),
/// [`Timeout`](Self::Timeout)), the server sent malformed data
/// ([`Protocol`](Self::Protocol), [`Parse`](Self::Parse)), or the caller
/// asked to stop ([`Cancelled`](Self::Cancelled)).
#[derive(Debug, thiserror::Error)]
pub enum MistralError {
    // Transport errors
    /// The API answered with a non-success status.
    #[error("Mistral API error, status: {status}: {body}")]
    Api {
        /// HTTP status returned by the API.
        status: reqwest::StatusCode,
        /// Response body, read best-effort for diagnostics (may be empty).
        body: String,
    },
    /// Network-level error (connection reset, DNS failure, body read failure).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // Malformed stream data
    /// A completed record did not start with the `data:` field prefix.
    #[error("invalid chunk line encountered: {record}")]
    Protocol {
        /// The offending raw record text.
        record: String,
    },
    /// A `data:` record carried a payload that is not a valid chunk document.
    #[error("invalid chunk payload: {source}: {record}")]
    Parse {
        /// The JSON failure.
        #[source]
        source: serde_json::Error,
        /// The offending raw record text.
        record: String,
    },

    /// The caller cancelled the request or the stream.
    #[error("cancelled")]
    Cancelled,

    /// No API key was supplied and `MISTRAL_API_KEY` is not set.
    #[error("missing API key: set MISTRAL_API_KEY or pass a key explicitly")]
    MissingApiKey,
}

impl MistralError {
    /// Whether this is the caller-initiated cancellation path rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error is likely transient and the request could be retried.
    ///
    /// Classification only; nothing in this crate retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }

    /// The HTTP status carried by an [`Api`](Self::Api) error.
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Map a non-success HTTP status and its body text to a [`MistralError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> MistralError {
    MistralError::Api {
        status,
        body: body.to_string(),
    }
}

/// Map a [`reqwest::Error`] to a [`MistralError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> MistralError {
    if err.is_timeout() {
        MistralError::Timeout(DEFAULT_TIMEOUT)
    } else {
        MistralError::Network(Box::new(err))
    }
}
