//! The two navigable locations and how they map to paths.

use anyhow::{Result, anyhow};

const WEATHER_PREFIX: &str = "/weather/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: the city listing.
    Cities,
    /// `/weather/<city>`: current weather for a city name.
    Weather { city: String },
}

impl Route {
    pub fn weather(city: impl Into<String>) -> Self {
        Route::Weather { city: city.into() }
    }

    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() || path == "/" {
            return Ok(Route::Cities);
        }

        let segment = path
            .strip_prefix(WEATHER_PREFIX)
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow!("Unknown route '{path}'. Expected '/' or '/weather/<city>'.")
            })?;

        let city = urlencoding::decode(segment)
            .map_err(|e| anyhow!("Route '{path}' is not valid UTF-8 after decoding: {e}"))?;

        Ok(Route::Weather {
            city: city.into_owned(),
        })
    }

    pub fn path(&self) -> String {
        match self {
            Route::Cities => "/".to_string(),
            Route::Weather { city } => format!("{WEATHER_PREFIX}{}", urlencoding::encode(city)),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of selecting a city in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Leave the current view for the destination.
    Replace(Route),
    /// Open the destination while the current view keeps its state.
    NewContext(Route),
}

impl Navigation {
    pub fn route(&self) -> &Route {
        match self {
            Navigation::Replace(r) | Navigation::NewContext(r) => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_paths_map_to_listing() {
        assert_eq!(Route::parse("/").unwrap(), Route::Cities);
        assert_eq!(Route::parse("").unwrap(), Route::Cities);
    }

    #[test]
    fn weather_path_decodes_city() {
        assert_eq!(Route::parse("/weather/Paris").unwrap(), Route::weather("Paris"));
        assert_eq!(
            Route::parse("/weather/New%20York/").unwrap(),
            Route::weather("New York")
        );
    }

    #[test]
    fn weather_path_encodes_city() {
        assert_eq!(Route::weather("São Paulo").path(), "/weather/S%C3%A3o%20Paulo");
        assert_eq!(Route::Cities.to_string(), "/");
    }

    #[test]
    fn encoded_path_parses_back() {
        let route = Route::weather("Saint-Étienne / Loire");
        assert_eq!(Route::parse(&route.path()).unwrap(), route);
    }

    #[test]
    fn unknown_paths_are_rejected() {
        let err = Route::parse("/forecast/Paris").unwrap_err();
        assert!(err.to_string().contains("Unknown route"));
        assert!(Route::parse("/weather/").is_err());
    }
}
