//! Point forecasts from MET Norway's Locationforecast 2.0.
//!
//! Docs: <https://api.met.no/weatherapi/locationforecast/2.0/documentation>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::{
    error::{ApiClientError, Upstream},
    http::{self, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
    model::{CoordinateQuery, WeatherInfo, round_coordinate},
    symbol::{NO_SUMMARY, symbol_to_text},
};

use super::ForecastProvider;

pub const DEFAULT_FORECAST_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0";

/// Summary blocks, shortest horizon first.
const SUMMARY_BLOCKS: [&str; 3] = ["next_1_hours", "next_6_hours", "next_12_hours"];

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl WeatherClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_FORECAST_URL.to_string(),
            user_agent: user_agent.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Root of the Locationforecast API; requests go to `<base>/compact`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
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

    /// Fetch the current temperature and condition summary for a coordinate.
    pub async fn get_weather_for_coordinates(
        &self,
        query: &CoordinateQuery,
    ) -> Result<WeatherInfo, ApiClientError> {
        let lat = round_coordinate(query.latitude);
        let lon = round_coordinate(query.longitude);

        let mut params = vec![("lat", lat.to_string()), ("lon", lon.to_string())];
        if let Some(altitude) = query.altitude {
            params.push(("altitude", (altitude.round_ties_even() as i64).to_string()));
        }

        let url = format!("{}/compact", self.base_url);
        tracing::debug!(%url, lat, lon, altitude = ?query.altitude, "forecast request");

        let request = self.http.get(&url).query(&params);
        let request = http::decorate(request, &self.user_agent, self.timeout);
        let response = http::send(Upstream::Forecast, request).await?;
        let payload = http::handle_response(Upstream::Forecast, response).await?;

        let (temperature_c, summary) = read_forecast(payload)?;

        let city = match query.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("({lat:.4}, {lon:.4})"),
        };

        Ok(WeatherInfo { city, temperature_c, summary })
    }
}

#[async_trait]
impl ForecastProvider for WeatherClient {
    async fn get_weather_for_coordinates(
        &self,
        query: &CoordinateQuery,
    ) -> Result<WeatherInfo, ApiClientError> {
        WeatherClient::get_weather_for_coordinates(self, query).await
    }
}

#[derive(Debug, Deserialize)]
struct MetForecast {
    properties: MetProperties,
}

#[derive(Debug, Deserialize)]
struct MetProperties {
    timeseries: Vec<MetTimeStep>,
}

#[derive(Debug, Deserialize)]
struct MetTimeStep {
    data: MetData,
}

#[derive(Debug, Deserialize)]
struct MetData {
    instant: MetInstant,
    // Summary blocks stay untyped: a malformed one is skipped, not fatal.
    #[serde(flatten)]
    periods: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MetInstant {
    details: MetDetails,
}

#[derive(Debug, Deserialize)]
struct MetDetails {
    #[serde(deserialize_with = "number_or_numeric_string")]
    air_temperature: f64,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("not a number: {text:?}"))),
    }
}

/// Extract the temperature and summary from the first time step.
fn read_forecast(payload: Value) -> Result<(f64, String), ApiClientError> {
    let forecast: MetForecast = serde_json::from_value(payload).map_err(|err| {
        ApiClientError::invalid(Upstream::Forecast, format!("unexpected forecast payload: {err}"))
    })?;

    let first = forecast
        .properties
        .timeseries
        .into_iter()
        .next()
        .ok_or_else(|| ApiClientError::invalid(Upstream::Forecast, "no timeseries data"))?;

    let summary = SUMMARY_BLOCKS
        .iter()
        .find_map(|key| symbol_code(&first.data.periods, key))
        .map(|code| symbol_to_text(&code))
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    Ok((first.data.instant.details.air_temperature, summary))
}

fn symbol_code(periods: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    let block = periods.get(key).filter(|block| !block.is_null())?;

    let code = match block.get("summary").and_then(|summary| summary.get("symbol_code")) {
        Some(Value::String(code)) if !code.is_empty() => Some(code.clone()),
        // Numeric codes are read as their text form; zero counts as absent.
        Some(Value::Number(code)) if code.as_f64() != Some(0.0) => Some(code.to_string()),
        _ => None,
    };

    if code.is_none() {
        tracing::warn!(block = key, "forecast block has no usable symbol code, skipping");
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::new("city-weather-tests/0.1 test@example.com").with_base_url(server.uri())
    }

    fn forecast_with(data: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": {
                "timeseries": [
                    { "time": "2025-01-01T12:00:00Z", "data": data }
                ]
            }
        })
    }

    async fn mount(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/compact"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn coordinates_are_rounded_before_sending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .and(query_param("lat", "59.3294"))
            .and(query_param("lon", "18.0687"))
            .and(query_param_is_missing("altitude"))
            .and(header("user-agent", "city-weather-tests/0.1 test@example.com"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_with(json!({
                "instant": { "details": { "air_temperature": 5.7 } }
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(59.32938, 18.06871))
            .await
            .unwrap();

        assert_eq!(info.city, "(59.3294, 18.0687)");
        assert_eq!(info.temperature_c, 5.7);
        assert_eq!(info.summary, NO_SUMMARY);
    }

    #[tokio::test]
    async fn altitude_is_rounded_to_whole_metres() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .and(query_param("altitude", "91"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_with(json!({
                "instant": { "details": { "air_temperature": -1.0 } }
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let query = CoordinateQuery::new(60.0, 11.0).with_altitude(90.6).with_label("Oslo");
        let info = client_for(&server).get_weather_for_coordinates(&query).await.unwrap();

        assert_eq!(info.city, "Oslo");
    }

    #[tokio::test]
    async fn altitude_halfway_rounds_to_even() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .and(query_param("altitude", "90"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_with(json!({
                "instant": { "details": { "air_temperature": -1.0 } }
            }))))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .and(query_param("altitude", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_with(json!({
                "instant": { "details": { "air_temperature": 4.0 } }
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        let high = CoordinateQuery::new(60.0, 11.0).with_altitude(90.5);
        assert_eq!(client.get_weather_for_coordinates(&high).await.unwrap().temperature_c, -1.0);

        let low = CoordinateQuery::new(60.0, 11.0).with_altitude(2.5);
        assert_eq!(client.get_weather_for_coordinates(&low).await.unwrap().temperature_c, 4.0);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let server = MockServer::start().await;
        mount(&server, forecast_with(json!({ "instant": { "details": { "air_temperature": 1.0 } } })))
            .await;

        let client = WeatherClient::new("t").with_base_url(format!("{}/", server.uri()));
        assert!(!client.base_url().ends_with('/'));

        let info = client.get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0)).await;
        assert!(info.is_ok());
    }

    #[tokio::test]
    async fn medium_range_block_used_when_short_range_absent() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({
                "instant": { "details": { "air_temperature": 3.2 } },
                "next_6_hours": { "summary": { "symbol_code": "partlycloudy_day" } },
                "next_12_hours": { "summary": { "symbol_code": "rain" } }
            })),
        )
        .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap();

        assert_eq!(info.summary, "Partly cloudy");
    }

    #[tokio::test]
    async fn short_range_block_wins() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({
                "instant": { "details": { "air_temperature": 3.2 } },
                "next_1_hours": { "summary": { "symbol_code": "lightsnow" } },
                "next_6_hours": { "summary": { "symbol_code": "partlycloudy_day" } }
            })),
        )
        .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap();

        assert_eq!(info.summary, "Light snow");
    }

    #[tokio::test]
    async fn malformed_block_is_skipped() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({
                "instant": { "details": { "air_temperature": 3.2 } },
                "next_1_hours": { "details": { "precipitation_amount": 0.0 } },
                "next_6_hours": "garbage",
                "next_12_hours": { "summary": { "symbol_code": "sleet_showers_night" } }
            })),
        )
        .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap();

        assert_eq!(info.summary, "Sleet showers");
    }

    #[tokio::test]
    async fn missing_timeseries_is_invalid_payload() {
        let server = MockServer::start().await;
        mount(&server, json!({ "properties": {} })).await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::InvalidPayload { upstream: Upstream::Forecast, .. }));
        assert!(err.to_string().contains("timeseries"));
    }

    #[tokio::test]
    async fn empty_timeseries_is_invalid_payload() {
        let server = MockServer::start().await;
        mount(&server, json!({ "properties": { "timeseries": [] } })).await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no timeseries data"));
    }

    #[tokio::test]
    async fn missing_air_temperature_is_invalid_payload() {
        let server = MockServer::start().await;
        mount(&server, forecast_with(json!({ "instant": { "details": { "wind_speed": 4.1 } } })))
            .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::InvalidPayload { .. }));
        assert!(err.to_string().contains("air_temperature"));
    }

    #[tokio::test]
    async fn mistyped_air_temperature_is_invalid_payload() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({ "instant": { "details": { "air_temperature": [1, 2] } } })),
        )
        .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn service_unavailable_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compact"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::Decode { upstream: Upstream::Forecast, .. }));
    }

    #[tokio::test]
    async fn empty_label_falls_back_to_coordinates() {
        let server = MockServer::start().await;
        mount(&server, forecast_with(json!({ "instant": { "details": { "air_temperature": 0.5 } } })))
            .await;

        let query = CoordinateQuery::new(-33.86781, 151.20929).with_label("");
        let info = client_for(&server).get_weather_for_coordinates(&query).await.unwrap();

        assert_eq!(info.city, "(-33.8678, 151.2093)");
    }

    #[tokio::test]
    async fn missing_instant_details_fails_even_with_summary() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({
                "instant": {},
                "next_1_hours": { "summary": { "symbol_code": "partlycloudy_day" } }
            })),
        )
        .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::InvalidPayload { upstream: Upstream::Forecast, .. }));
        assert!(err.to_string().contains("details"));
    }

    #[tokio::test]
    async fn numeric_string_temperature_is_accepted() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({ "instant": { "details": { "air_temperature": " 5.7" } } })),
        )
        .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap();

        assert_eq!(info.temperature_c, 5.7);
    }

    #[tokio::test]
    async fn non_numeric_string_temperature_is_invalid_payload() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({ "instant": { "details": { "air_temperature": "mild" } } })),
        )
        .await;

        let err = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::InvalidPayload { .. }));
        assert!(err.to_string().contains("\"mild\""));
    }

    #[tokio::test]
    async fn numeric_symbol_code_is_prettified() {
        let server = MockServer::start().await;
        mount(
            &server,
            forecast_with(json!({
                "instant": { "details": { "air_temperature": 1.0 } },
                "next_1_hours": { "summary": { "symbol_code": 0 } },
                "next_6_hours": { "summary": { "symbol_code": 42 } }
            })),
        )
        .await;

        let info = client_for(&server)
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap();

        assert_eq!(info.summary, "42");
    }

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        // Nothing listens on the discard port locally.
        let client = WeatherClient::new("city-weather-tests/0.1")
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));

        let err = client
            .get_weather_for_coordinates(&CoordinateQuery::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiClientError::Transport { upstream: Upstream::Forecast, .. }));
    }
}
