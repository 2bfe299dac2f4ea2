use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Remote service a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Geocoding,
    Forecast,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Geocoding => "Geocoding",
            Upstream::Forecast => "Forecast",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure while talking to, or interpreting the answer of, a remote service.
///
/// Lower-level errors (transport, JSON decoding, missing or mistyped fields) are
/// converted into one of these variants where they occur and never leave a client
/// in their original form.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("{upstream} request failed: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },

    #[error("{upstream} returned status {status}: {body}")]
    Status {
        upstream: Upstream,
        status: StatusCode,
        body: String,
    },

    #[error("{upstream} response is not valid JSON: {source}")]
    Decode {
        upstream: Upstream,
        #[source]
        source: serde_json::Error,
    },

    #[error("{upstream} response is invalid: {message}")]
    InvalidPayload { upstream: Upstream, message: String },

    #[error("No geocoding results for query: {query:?}")]
    NoResults { query: String },
}

impl ApiClientError {
    pub(crate) fn invalid(upstream: Upstream, message: impl Into<String>) -> Self {
        ApiClientError::InvalidPayload { upstream, message: message.into() }
    }

    /// HTTP status code, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(status.as_u16()),
            ApiClientError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Truncated response body, when the failure was a non-success response.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiClientError::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// The service the failed call was addressed to.
    pub fn upstream(&self) -> Upstream {
        match self {
            ApiClientError::Transport { upstream, .. }
            | ApiClientError::Status { upstream, .. }
            | ApiClientError::Decode { upstream, .. }
            | ApiClientError::InvalidPayload { upstream, .. } => *upstream,
            ApiClientError::NoResults { .. } => Upstream::Geocoding,
        }
    }
}
