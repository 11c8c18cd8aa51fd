use thiserror::Error;

/// Failure of a single city lookup.
///
/// `NotFound` is deterministic and caller-correctable (supply a different
/// query); everything the network or the provider does wrong ends up in
/// `Provider` and is propagated without local recovery.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Geocoding returned zero matches for the query text.
    #[error("City not found: {0}")]
    NotFound(String),

    /// Either outbound call failed: network error, non-2xx status, or a
    /// payload that did not parse.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl LookupError {
    /// Whether a different query text could succeed where this one failed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Low-level cause of a failed provider call, tagged with the endpoint it
/// came from.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send request to {endpoint}: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
