//! Weather View: one current-weather lookup per city name.

use crate::{error::WeatherError, model::WeatherSnapshot, provider::WeatherSource};

pub const CLOUDS_ILLUSTRATION: &str =
    "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/cloud_i3vdxq.png";
pub const NOT_FOUND_ILLUSTRATION: &str =
    "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/404_rr6ovr.png";

const ILLUSTRATIONS: &[(&str, &str)] = &[
    ("Clouds", CLOUDS_ILLUSTRATION),
    ("Clear", "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/clear_cfhskq.png"),
    ("Rain", "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/rain_g7yfpf.png"),
    ("Mist", "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/mist_t83gs4.png"),
    ("Snow", "https://res.cloudinary.com/dhik9tnvf/image/upload/v1725724007/snow_c13cs7.png"),
];

/// Illustration for a condition main-category. Exact match; anything else
/// gets the clouds picture.
pub fn illustration_for(condition_main: &str) -> &'static str {
    ILLUSTRATIONS
        .iter()
        .find(|(main, _)| *main == condition_main)
        .map(|(_, url)| *url)
        .unwrap_or(CLOUDS_ILLUSTRATION)
}

/// Background theme behind the weather card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Clear,
    Rain,
    Clouds,
    Default,
}

impl Backdrop {
    pub fn for_condition(condition_main: &str) -> Self {
        match condition_main.to_lowercase().as_str() {
            "clear" => Backdrop::Clear,
            "rain" => Backdrop::Rain,
            "clouds" => Backdrop::Clouds,
            _ => Backdrop::Default,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Backdrop::Clear => "bg-blue-300",
            Backdrop::Rain => "bg-gray-700",
            Backdrop::Clouds => "bg-gray-400",
            Backdrop::Default => "bg-gray-200",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherState {
    Loading,
    Loaded(WeatherSnapshot),
    /// The service does not know the city.
    NotFound,
    /// The lookup failed for another reason (network, status, bad payload).
    Failed(String),
}

/// Identifies one issued lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct WeatherView {
    city: String,
    state: WeatherState,
    generation: u64,
}

impl WeatherView {
    /// A view for `city`, already in `Loading`. Pair with [`WeatherView::navigate`]
    /// or [`WeatherView::load`] to issue the lookup.
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: WeatherState::Loading,
            generation: 0,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match &self.state {
            WeatherState::Loaded(snap) => Some(snap),
            _ => None,
        }
    }

    pub fn backdrop(&self) -> Backdrop {
        self.snapshot()
            .map(|s| Backdrop::for_condition(&s.condition_main))
            .unwrap_or(Backdrop::Default)
    }

    /// Illustration for the current state, if there is anything to show.
    pub fn illustration(&self) -> Option<&'static str> {
        match &self.state {
            WeatherState::Loaded(snap) => Some(illustration_for(&snap.condition_main)),
            WeatherState::NotFound => Some(NOT_FOUND_ILLUSTRATION),
            _ => None,
        }
    }

    /// Enter `Loading` for `city`, discarding everything known about the
    /// previous city.
    pub fn navigate(&mut self, city: impl Into<String>) -> LookupTicket {
        self.city = city.into();
        self.state = WeatherState::Loading;
        self.generation += 1;
        LookupTicket {
            generation: self.generation,
            city: self.city.clone(),
        }
    }

    /// Returns `false` when the ticket was superseded and the result dropped.
    pub fn apply(
        &mut self,
        ticket: &LookupTicket,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(city = %ticket.city, current = %self.city, "dropping stale weather response");
            return false;
        }

        self.state = match result {
            Ok(snap) => WeatherState::Loaded(snap),
            Err(WeatherError::NotFound { .. }) => WeatherState::NotFound,
            Err(err) => {
                tracing::warn!(city = %ticket.city, error = %err, "weather lookup failed");
                WeatherState::Failed(err.to_string())
            }
        };
        true
    }

    /// Look up the weather for the view's current city.
    pub async fn load<S>(&mut self, source: &S) -> &WeatherState
    where
        S: WeatherSource + ?Sized,
    {
        let city = self.city.clone();
        self.load_city(source, city).await
    }

    pub async fn load_city<S>(&mut self, source: &S, city: impl Into<String>) -> &WeatherState
    where
        S: WeatherSource + ?Sized,
    {
        let ticket = self.navigate(city);
        let result = source.current(&ticket.city).await;
        self.apply(&ticket, result);
        &self.state
    }
}
