use crate::{
    CityRecord, Config, WeatherSnapshot,
    error::{CityError, WeatherError},
    provider::{opendatasoft::OpenDataSoftCities, openweather::OpenWeatherClient},
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod opendatasoft;
pub mod openweather;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Paged, free-text search over the city dataset.
#[async_trait]
pub trait CitySource: Send + Sync + Debug {
    /// Fetch up to `rows` records matching `query`, starting at the zero-based `start` row.
    async fn fetch_page(
        &self,
        query: &str,
        start: usize,
        rows: usize,
    ) -> Result<Vec<CityRecord>, CityError>;
}

/// Current-weather lookup keyed by a human-readable city name.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;
}

pub(crate) fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("cityweather/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Construct the city search client from config.
pub fn city_source_from_config(config: &Config) -> anyhow::Result<OpenDataSoftCities> {
    OpenDataSoftCities::new(config.cities_url(), config.cities_dataset())
}

/// Construct the weather client from config.
pub fn weather_source_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `cityweather configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    OpenWeatherClient::new(config.openweather_url(), api_key)
}
