//! Core library for the `city-weather` CLI.
//!
//! This crate defines:
//! - A geocoding client (OpenStreetMap Nominatim)
//! - A point-forecast client (MET Norway Locationforecast)
//! - [`WeatherService`], which chains the two: city name in, current weather out
//! - Configuration & persistence of client settings
//!
//! Every remote failure is reported as an [`ApiClientError`].

pub mod config;
pub mod error;
mod http;
pub mod model;
pub mod provider;
pub mod service;
pub mod symbol;

pub use config::Config;
pub use error::{ApiClientError, Upstream};
pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use model::{CoordinateQuery, GeoLocation, WeatherInfo};
pub use provider::{ForecastProvider, Geocoder, GeocodingClient, WeatherClient};
pub use service::WeatherService;
