use std::fmt::Debug;

use async_trait::async_trait;

use crate::{ApiClientError, CoordinateQuery, GeoLocation, WeatherInfo};

pub mod met;
pub mod nominatim;

pub use met::{DEFAULT_FORECAST_URL, WeatherClient};
pub use nominatim::{DEFAULT_GEOCODING_URL, GeocodingClient};

/// Resolves free text into a place.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode_city(&self, query: &str) -> Result<GeoLocation, ApiClientError>;
}

/// Resolves a coordinate into current conditions.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn get_weather_for_coordinates(
        &self,
        query: &CoordinateQuery,
    ) -> Result<WeatherInfo, ApiClientError>;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Box<T> {
    async fn geocode_city(&self, query: &str) -> Result<GeoLocation, ApiClientError> {
        (**self).geocode_city(query).await
    }
}

#[async_trait]
impl<T: ForecastProvider + ?Sized> ForecastProvider for Box<T> {
    async fn get_weather_for_coordinates(
        &self,
        query: &CoordinateQuery,
    ) -> Result<WeatherInfo, ApiClientError> {
        (**self).get_weather_for_coordinates(query).await
    }
}
