use thiserror::Error;

/// Errors produced while relaying a generation request upstream.
///
/// The taxonomy is closed: every transport outcome is classified into
/// exactly one of these variants, once, at the transport boundary. Nothing
/// in this crate retries; callers that want retry semantics layer them on
/// top of the classification.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The registry has no provider under the requested id. Raised at
    /// request entry, before any upstream call is attempted.
    #[error("provider '{0}' is not configured")]
    ProviderNotFound(String),

    /// An outbound call exceeded the timeout policy. The source is absent
    /// when the relay's own idle clock fired rather than the HTTP layer's.
    #[error("upstream request timed out")]
    UpstreamTimeout(#[source] Option<reqwest::Error>),

    /// The upstream could not be reached (connection-level failure).
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The upstream answered with a non-2xx status. The body is carried
    /// through verbatim and never reinterpreted; callers decide what, if
    /// anything, to make of it.
    #[error("upstream returned HTTP {status}")]
    UpstreamHttp {
        /// Upstream status code.
        status: u16,
        /// Raw upstream response body.
        body: String,
    },

    /// A buffered upstream body could not be decoded as the expected JSON.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),
}

impl From<reqwest::Error> for RelayError {
    /// Classifies a transport failure: timeouts are kept distinct from
    /// every other connection-level error.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(Some(err))
        } else {
            Self::UpstreamUnreachable(err)
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
