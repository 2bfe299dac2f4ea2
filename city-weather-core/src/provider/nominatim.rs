//! Place search against OpenStreetMap Nominatim.
//!
//! Docs: <https://nominatim.org/release-docs/latest/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{
    error::{ApiClientError, Upstream},
    http::{self, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
    model::GeoLocation,
};

use super::Geocoder;

pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    http: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl GeocodingClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_GEOCODING_URL.to_string(),
            user_agent: user_agent.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Full address of the search endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reuse an existing connection pool.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a place name such as "Stockholm" or "Stockholm, Sweden".
    pub async fn geocode_city(&self, query: &str) -> Result<GeoLocation, ApiClientError> {
        self.geocode_city_with_limit(query, 1).await
    }

    /// Like [`geocode_city`](Self::geocode_city), asking upstream for up to `limit`
    /// candidates. Only the first candidate is ever used.
    pub async fn geocode_city_with_limit(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<GeoLocation, ApiClientError> {
        tracing::debug!(query, limit, url = %self.base_url, "geocoding request");

        let limit = limit.to_string();
        let request = self.http.get(&self.base_url).query(&[
            ("q", query),
            ("format", "jsonv2"),
            ("limit", limit.as_str()),
            ("addressdetails", "1"),
        ]);
        let request = http::decorate(request, &self.user_agent, self.timeout);

        let response = http::send(Upstream::Geocoding, request).await?;
        let payload = http::handle_response(Upstream::Geocoding, response).await?;

        let location = first_candidate(query, &payload)?;
        tracing::info!(query, location = %location, "resolved location");

        Ok(location)
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn geocode_city(&self, query: &str) -> Result<GeoLocation, ApiClientError> {
        GeocodingClient::geocode_city(self, query).await
    }
}

fn first_candidate(query: &str, payload: &Value) -> Result<GeoLocation, ApiClientError> {
    let candidates = payload.as_array().ok_or_else(|| {
        ApiClientError::invalid(Upstream::Geocoding, "expected a JSON array of candidates")
    })?;

    let first = candidates
        .first()
        .ok_or_else(|| ApiClientError::NoResults { query: query.to_string() })?;

    let latitude = coordinate(first, "lat")?;
    let longitude = coordinate(first, "lon")?;

    let display_name = match first.get("display_name") {
        None | Some(Value::Null) => query.to_string(),
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
    };

    Ok(GeoLocation { latitude, longitude, display_name })
}

/// Nominatim sends coordinates as strings; plain JSON numbers are accepted too.
fn coordinate(candidate: &Value, key: &str) -> Result<f64, ApiClientError> {
    match candidate.get(key) {
        Some(Value::String(raw)) => raw.trim().parse::<f64>().map_err(|_| {
            ApiClientError::invalid(
                Upstream::Geocoding,
                format!("`{key}` is not a number: {raw:?}"),
            )
        }),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| {
            ApiClientError::invalid(Upstream::Geocoding, format!("`{key}` is out of range"))
        }),
        Some(other) => Err(ApiClientError::invalid(
            Upstream::Geocoding,
            format!("`{key}` has an unexpected type: {other}"),
        )),
        None => Err(ApiClientError::invalid(
            Upstream::Geocoding,
            format!("missing expected key `{key}`"),
        )),
    }
}
