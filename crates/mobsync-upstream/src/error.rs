use thiserror::Error;

/// Errors returned by the Mobgran document client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something other than `200 OK`.
    #[error("provider returned HTTP {status} for {url}: {body}")]
    Rejected {
        status: u16,
        url: String,
        /// Response body, truncated, kept for diagnostics.
        body: String,
    },

    /// The response body could not be deserialized into the document shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body was valid JSON but carried none of the document fields.
    #[error("provider returned an empty document for {url}")]
    EmptyDocument { url: String },

    /// The body was longer than the client's size cap.
    #[error("provider response for {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("invalid upstream base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl UpstreamError {
    /// `true` when the provider could not be reached or did not answer in time.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
