//! Human-readable output for the two views.

use chrono::Local;
use cityweather_core::{Backdrop, CityBrowser, CityRecord, SortField, WeatherState, WeatherView};
use owo_colors::OwoColorize;

/// Column heading with the sort arrow when the column is the active key.
pub fn header_label(browser: &CityBrowser, field: SortField) -> String {
    match browser.sort_spec() {
        Some(spec) if spec.field == field => format!("{} {}", field.label(), spec.direction.arrow()),
        _ => field.label().to_string(),
    }
}

pub fn city_row(city: &CityRecord) -> String {
    format!("{} ({}, {})", city.name, city.country_name, city.timezone)
}

/// The loaded cities as a plain-text table in display order.
pub fn city_table(browser: &CityBrowser) -> String {
    let rows = browser.sorted();
    let headers: Vec<String> = SortField::all()
        .iter()
        .map(|f| header_label(browser, *f))
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, field) in SortField::all().iter().enumerate() {
            widths[i] = widths[i].max(field.value_of(row).chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.iter().map(String::as_str).collect()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');

    for row in &rows {
        let cells = SortField::all().iter().map(|f| f.value_of(row)).collect();
        out.push_str(&line(cells));
        out.push('\n');
    }

    if rows.is_empty() {
        out.push_str("(no cities)\n");
    }

    out
}

/// Upper-cases the first letter of every word.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn paint(text: &str, backdrop: Backdrop, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match backdrop {
        Backdrop::Clear => text.bright_blue().bold().to_string(),
        Backdrop::Rain => text.bright_black().bold().to_string(),
        Backdrop::Clouds => text.white().bold().to_string(),
        Backdrop::Default => text.bold().to_string(),
    }
}

pub fn weather_card(view: &WeatherView, color: bool) -> String {
    let backdrop = view.backdrop();
    let mut out = String::new();

    out.push_str(&paint(&format!("Weather in {}", view.city()), backdrop, color));
    out.push('\n');

    match view.state() {
        WeatherState::Loading => out.push_str("Loading...\n"),
        WeatherState::NotFound => {
            out.push_str("Sorry, Location not found!\n");
        }
        WeatherState::Failed(reason) => {
            out.push_str("Failed to fetch weather data\n");
            out.push_str(&format!("  {reason}\n"));
        }
        WeatherState::Loaded(snap) => {
            out.push_str(&format!("  {} °C\n", snap.temperature_celsius()));
            out.push_str(&format!("  {}\n", capitalize_words(&snap.condition_description)));
            out.push_str(&format!("  Humidity:   {}%\n", snap.humidity_percent));
            out.push_str(&format!("  Wind Speed: {} m/s\n", snap.wind_speed));
            out.push_str(&format!(
                "  Updated:    {}\n",
                snap.fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ));
        }
    }

    if let Some(url) = view.illustration() {
        out.push_str(&format!("  Image:      {url}\n"));
    }

    out
}
