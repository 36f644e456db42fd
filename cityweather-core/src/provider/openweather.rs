use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::{WeatherError, truncate_body},
    model::WeatherSnapshot,
};

use super::{WeatherSource, http_client};

const CURRENT_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http: http_client().context("Failed to build HTTP client for OpenWeather")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
}

fn snapshot_from_body(city: &str, body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or(WeatherError::Malformed("weather[0]"))?;

    Ok(WeatherSnapshot {
        city: city.to_string(),
        condition_main: condition.main,
        condition_description: condition.description,
        temperature_kelvin: parsed.main.temp,
        humidity_percent: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        fetched_at: Utc::now(),
    })
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}{}", self.base_url, CURRENT_PATH);

        tracing::debug!(city, "fetching current weather");

        // Temperature stays in Kelvin: no `units` parameter.
        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound {
                city: city.to_string(),
            });
        }

        if !status.is_success() {
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        snapshot_from_body(city, &body)
    }
}
