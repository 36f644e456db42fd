//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - Clients for the city search and weather lookup services
//! - The City Browser (search, paging, sorting) and Weather View state machines
//! - Routes connecting the two views
//!
//! Nothing here prints or prompts; `cityweather-cli` drives these types.

pub mod browser;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod route;
pub mod weather_view;

pub use browser::{CityBrowser, PAGE_SIZE, PageOutcome, PageTicket};
pub use config::Config;
pub use error::{CityError, WeatherError};
pub use model::{CityRecord, SortDirection, SortField, SortSpec, WeatherSnapshot, kelvin_to_celsius};
pub use provider::{CitySource, WeatherSource, city_source_from_config, weather_source_from_config};
pub use route::{Navigation, Route};
pub use weather_view::{Backdrop, LookupTicket, WeatherState, WeatherView};
