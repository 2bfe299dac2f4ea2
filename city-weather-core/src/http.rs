//! Request decoration and response handling shared by both clients.

use std::time::Duration;

use reqwest::{
    RequestBuilder, Response,
    header::{ACCEPT, USER_AGENT},
};
use serde_json::Value;

use crate::error::{ApiClientError, Upstream};

/// Identification sent when the caller does not configure one.
///
/// Both Nominatim and MET Norway ask for an agent that names the application
/// and a contact address; override it for anything beyond local experiments.
pub const DEFAULT_USER_AGENT: &str = concat!("city-weather/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_BODY_CHARS: usize = 200;

/// Attach the identification header, the JSON accept header and the timeout.
pub(crate) fn decorate(
    request: RequestBuilder,
    user_agent: &str,
    timeout: Duration,
) -> RequestBuilder {
    request
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, "application/json")
        .timeout(timeout)
}

pub(crate) async fn send(
    upstream: Upstream,
    request: RequestBuilder,
) -> Result<Response, ApiClientError> {
    request
        .send()
        .await
        .map_err(|source| ApiClientError::Transport { upstream, source })
}

/// Turn a raw response into JSON, or into the matching [`ApiClientError`].
pub(crate) async fn handle_response(
    upstream: Upstream,
    response: Response,
) -> Result<Value, ApiClientError> {
    let status = response.status();

    if !status.is_success() {
        tracing::warn!(%upstream, %status, "upstream returned a non-success status");
        // The status is what matters here; an unreadable body is reported as empty.
        let body = response.text().await.unwrap_or_else(|err| {
            tracing::debug!(%upstream, error = %err, "failed to read error response body");
            String::new()
        });
        return Err(ApiClientError::Status { upstream, status, body: truncate_body(&body) });
    }

    let body = response
        .text()
        .await
        .map_err(|source| ApiClientError::Transport { upstream, source })?;

    serde_json::from_str(&body).map_err(|source| ApiClientError::Decode { upstream, source })
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
