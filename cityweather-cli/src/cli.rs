use std::io::IsTerminal;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    CityBrowser, Config, PageOutcome, Route, SortField, WeatherView, city_source_from_config,
    weather_source_from_config,
};
use inquire::{Password, PasswordDisplayMode};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Browse cities and check their weather")]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Search cities and print them as a table.
    Cities {
        /// Free-text search; empty lists everything.
        #[arg(default_value = "")]
        query: String,

        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Column to sort by: name, country or timezone.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending.
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Show current weather for a city.
    Weather {
        /// City name, e.g. "Paris".
        city: String,
    },

    /// Open a route path such as "/" or "/weather/Paris".
    Open {
        path: String,
    },

    /// Interactive city browser.
    Browse {
        /// Initial search text.
        #[arg(long, default_value = "")]
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let color = std::io::stdout().is_terminal();

        match self.command {
            Command::Configure => configure(),
            Command::Cities {
                query,
                pages,
                sort,
                desc,
            } => {
                let sort = sort.as_deref().map(SortField::try_from).transpose()?;
                list_cities(&query, pages, sort, desc).await
            }
            Command::Weather { city } => show_weather(&city, color).await,
            Command::Open { path } => match Route::parse(&path)? {
                Route::Cities => list_cities("", 1, None, false).await,
                Route::Weather { city } => show_weather(&city, color).await,
            },
            Command::Browse { query } => {
                let config = Config::load()?;
                let cities = city_source_from_config(&config)?;
                let weather = weather_source_from_config(&config)?;
                interactive::browse(&cities, &weather, &query, color).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!(
        "Saved API key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn list_cities(
    query: &str,
    pages: usize,
    sort: Option<SortField>,
    desc: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let source = city_source_from_config(&config)?;

    let mut browser = CityBrowser::new();
    if browser.search(&source, query).await == PageOutcome::Failed {
        bail!("Could not fetch cities for '{query}'");
    }

    for _ in 1..pages {
        match browser.load_more(&source).await {
            None => break,
            Some(PageOutcome::Failed) => {
                eprintln!("Stopped paging after a failed request.");
                break;
            }
            Some(_) => {}
        }
    }

    if let Some(field) = sort {
        browser.sort_by(field);
        if desc {
            browser.sort_by(field);
        }
    }

    print!("{}", render::city_table(&browser));
    Ok(())
}

async fn show_weather(city: &str, color: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let source = weather_source_from_config(&config)?;

    let mut view = WeatherView::new(city);
    view.load(&source).await;
    print!("{}", render::weather_card(&view, color));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cities_with_sort() {
        let cli = Cli::try_parse_from([
            "cityweather", "cities", "par", "--pages", "3", "--sort", "country", "--desc",
        ])
        .expect("valid args");

        match cli.command {
            Command::Cities {
                query,
                pages,
                sort,
                desc,
            } => {
                assert_eq!(query, "par");
                assert_eq!(pages, 3);
                assert_eq!(sort.as_deref(), Some("country"));
                assert!(desc);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn desc_requires_sort() {
        assert!(Cli::try_parse_from(["cityweather", "cities", "--desc"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["cityweather", "weather", "Paris", "-v"]).expect("valid args");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Weather { city } if city == "Paris"));
    }
}
