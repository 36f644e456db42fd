use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const KELVIN_OFFSET: f64 = 273.15;

/// One row of the city dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    /// Opaque identifier, only used as a rendering key.
    pub record_id: String,
    pub name: String,
    pub country_name: String,
    pub timezone: String,
}

/// Columns the city table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Country,
    Timezone,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Country => "country",
            SortField::Timezone => "timezone",
        }
    }

    /// Column heading used by table renderers.
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Name => "City",
            SortField::Country => "Country",
            SortField::Timezone => "Timezone",
        }
    }

    pub const fn all() -> &'static [SortField] {
        &[SortField::Name, SortField::Country, SortField::Timezone]
    }

    pub fn value_of<'a>(&self, record: &'a CityRecord) -> &'a str {
        match self {
            SortField::Name => &record.name,
            SortField::Country => &record.country_name,
            SortField::Timezone => &record.timezone,
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SortField {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "name" | "city" => Ok(SortField::Name),
            "country" => Ok(SortField::Country),
            "timezone" => Ok(SortField::Timezone),
            _ => Err(anyhow::anyhow!(
                "Unknown sort field '{value}'. Supported fields: name, country, timezone."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Current conditions for one city, as returned by the weather service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    /// Main category, e.g. "Clear", "Rain", "Clouds".
    pub condition_main: String,
    pub condition_description: String,
    pub temperature_kelvin: f64,
    pub humidity_percent: u8,
    pub wind_speed: f64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn temperature_celsius(&self) -> i64 {
        kelvin_to_celsius(self.temperature_kelvin)
    }
}

/// Whole degrees Celsius, rounded half away from zero.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - KELVIN_OFFSET).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str, country: &str, tz: &str) -> CityRecord {
        CityRecord {
            record_id: format!("id-{name}"),
            name: name.to_string(),
            country_name: country.to_string(),
            timezone: tz.to_string(),
        }
    }

    #[test]
    fn kelvin_conversion_rounds() {
        assert_eq!(kelvin_to_celsius(300.15), 27);
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(263.0), -10);
    }

    #[test]
    fn sort_field_parses_aliases() {
        assert_eq!(SortField::try_from("City").unwrap(), SortField::Name);
        assert_eq!(SortField::try_from("TIMEZONE").unwrap(), SortField::Timezone);

        let err = SortField::try_from("population").unwrap_err();
        assert!(err.to_string().contains("Unknown sort field"));
    }

    #[test]
    fn sort_field_reads_matching_column() {
        let c = city("Paris", "France", "Europe/Paris");
        assert_eq!(SortField::Name.value_of(&c), "Paris");
        assert_eq!(SortField::Country.value_of(&c), "France");
        assert_eq!(SortField::Timezone.value_of(&c), "Europe/Paris");
    }

    #[test]
    fn direction_flip_is_an_involution() {
        let d = SortDirection::Ascending;
        assert_eq!(d.flipped(), SortDirection::Descending);
        assert_eq!(d.flipped().flipped(), d);
    }
}
