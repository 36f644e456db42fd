use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{CityError, truncate_body},
    model::CityRecord,
};

use super::{CitySource, http_client};

const SEARCH_PATH: &str = "/api/records/1.0/search/";

/// Client for the OpenDataSoft records search API.
#[derive(Debug, Clone)]
pub struct OpenDataSoftCities {
    base_url: String,
    dataset: String,
    http: Client,
}

impl OpenDataSoftCities {
    pub fn new(base_url: &str, dataset: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
            http: http_client().context("Failed to build HTTP client for city search")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OdsResponse {
    #[serde(default)]
    records: Vec<OdsRecord>,
}

#[derive(Debug, Deserialize)]
struct OdsRecord {
    #[serde(default)]
    recordid: String,
    #[serde(default)]
    fields: OdsFields,
}

#[derive(Debug, Default, Deserialize)]
struct OdsFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cou_name_en: String,
    #[serde(default)]
    timezone: String,
}

impl From<OdsRecord> for CityRecord {
    fn from(r: OdsRecord) -> Self {
        CityRecord {
            record_id: r.recordid,
            name: r.fields.name,
            country_name: r.fields.cou_name_en,
            timezone: r.fields.timezone,
        }
    }
}

#[async_trait]
impl CitySource for OpenDataSoftCities {
    async fn fetch_page(
        &self,
        query: &str,
        start: usize,
        rows: usize,
    ) -> Result<Vec<CityRecord>, CityError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let start = start.to_string();
        let rows = rows.to_string();

        tracing::debug!(query, start = %start, rows = %rows, "fetching city page");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("dataset", self.dataset.as_str()),
                ("q", query),
                ("start", start.as_str()),
                ("rows", rows.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(CityError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OdsResponse = serde_json::from_str(&body)?;

        Ok(parsed.records.into_iter().map(CityRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_become_empty_strings() {
        let parsed: OdsResponse = serde_json::from_str(
            r#"{"records":[{"recordid":"abc","fields":{"name":"Nowhere"}}]}"#,
        )
        .expect("valid payload");

        let cities: Vec<CityRecord> = parsed.records.into_iter().map(CityRecord::from).collect();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].record_id, "abc");
        assert_eq!(cities[0].name, "Nowhere");
        assert_eq!(cities[0].country_name, "");
        assert_eq!(cities[0].timezone, "");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let src = OpenDataSoftCities::new("http://localhost:1234/", "ds").expect("client");
        assert_eq!(src.base_url, "http://localhost:1234");
    }
}
