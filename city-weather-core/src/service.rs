use crate::{
    ApiClientError, CoordinateQuery, WeatherInfo,
    provider::{ForecastProvider, Geocoder},
};

/// City name in, current weather out.
///
/// Geocodes the name, then asks the forecast provider about the resolved
/// coordinate. Errors from either step are returned untouched.
#[derive(Debug)]
pub struct WeatherService {
    geocoder: Box<dyn Geocoder>,
    forecast: Box<dyn ForecastProvider>,
}

impl WeatherService {
    pub fn new(
        geocoder: impl Geocoder + 'static,
        forecast: impl ForecastProvider + 'static,
    ) -> Self {
        Self { geocoder: Box::new(geocoder), forecast: Box::new(forecast) }
    }

    pub async fn get_weather_for_city(&self, city: &str) -> Result<WeatherInfo, ApiClientError> {
        let location = self.geocoder.geocode_city(city).await?;

        let query = CoordinateQuery::new(location.latitude, location.longitude)
            .with_label(location.display_name);

        self.forecast.get_weather_for_coordinates(&query).await
    }
}
