use reqwest::StatusCode;

/// Failures talking to the city search service.
#[derive(Debug, thiserror::Error)]
pub enum CityError {
    #[error("Failed to send request to city search service: {0}")]
    Http(#[from] reqwest::Error),
    #[error("City search request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse city search JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures looking up the weather for a city.
///
/// `NotFound` is kept apart from transport and decoding problems so the
/// weather view can tell "no such city" from "the service is unreachable".
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("No weather data found for '{city}'")]
    NotFound { city: String },
    #[error("Failed to send request to OpenWeather: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OpenWeather request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse OpenWeather JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("OpenWeather response is missing {0}")]
    Malformed(&'static str),
}

impl WeatherError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::NotFound { .. })
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
