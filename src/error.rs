/// Boxed error type accepted from caller-supplied resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// Network or request execution error from `reqwest`, including custom
    /// DNS resolution failures and per-attempt timeouts.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The underlying client could not be constructed.
    #[error("client build error: {0}")]
    Build(reqwest::Error),
    /// The configured proxy URL could not be parsed.
    #[error("invalid proxy url '{url}': {source}")]
    Proxy {
        /// Proxy URL as configured.
        url: String,
        /// Parse failure reported by `reqwest`.
        source: reqwest::Error,
    },
    /// The outbound request could not be built (malformed URL and similar).
    #[error("request build error: {0}")]
    Request(reqwest::Error),
    /// A JSON payload could not be serialized, or a response body could
    /// not be decoded.
    #[error("json error: {0}")]
    Json(serde_json::Error),
    /// The payload shape is not accepted by the called verb.
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(&'static str),
    /// A single-use body was already handed to a previous attempt.
    #[error("request body cannot be replayed")]
    BodyNotReplayable,
}

impl HttpClientError {
    /// Returns `true` when the error came out of the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` when an attempt ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

/// Failure reported by a custom DNS resolver.
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    /// The resolver rejected the host.
    #[error("dns override failed for '{host}': {source}")]
    Lookup {
        /// Host handed to the resolver.
        host: String,
        /// Error produced by the resolver.
        source: BoxError,
    },
}
