//! Client for the [World Air Quality Index](https://aqicn.org/json-api/doc/) API.
//!
//! Provides the two calls the sampler needs: the stations inside a bounding box
//! (`/map/bounds`) and the live feed of a single station (`/feed/@{uid}/`).

mod types;

use std::time::Duration;

use pm25_core::{AirQualitySource, BoundingBox, Credential, Station, StationId};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{BoundsEntry, Envelope, Feed};

pub const DEFAULT_BASE_URL: &str = "https://api.waqi.info/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum WaqiError {
    #[error("{url} is not a valid url: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("could not build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("WAQI API error: {message}")]
    Api { message: String },
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("station {station} reports no PM2.5 reading")]
    MissingPm25 { station: StationId },
}

#[derive(Debug, Clone)]
pub struct WaqiOptions {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for WaqiOptions {
    fn default() -> Self {
        WaqiOptions {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaqiClient {
    inner: reqwest::Client,
    base: Url,
    token: Credential,
}

impl WaqiClient {
    pub fn new(token: Credential, options: &WaqiOptions) -> Result<Self, WaqiError> {
        // Relative joins would drop the last path segment otherwise
        let mut base = options.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| WaqiError::InvalidBaseUrl {
            url: options.base_url.clone(),
            message: e.to_string(),
        })?;

        let inner = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(WaqiError::Client)?;

        Ok(WaqiClient { inner, base, token })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WaqiError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| WaqiError::InvalidBaseUrl {
                url: format!("{}{}", self.base, path),
                message: e.to_string(),
            })?;
        let http_error = |source: reqwest::Error| WaqiError::Http {
            endpoint: path.to_string(),
            source,
        };

        tracing::debug!("GET {}", url);
        let envelope: Envelope = self
            .inner
            .get(url)
            .query(&[("token", self.token.expose())])
            .query(query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?
            .json::<Envelope>()
            .await
            .map_err(http_error)?;

        if envelope.status != "ok" {
            let message = match envelope.data {
                serde_json::Value::String(message) => message,
                other => other.to_string(),
            };
            return Err(WaqiError::Api { message });
        }
        Ok(serde_json::from_value(envelope.data)?)
    }

    /// Stations located inside `area`, in API order.
    pub async fn stations(&self, area: &BoundingBox) -> Result<Vec<Station>, WaqiError> {
        let latlng = area.to_string();
        let entries: Vec<BoundsEntry> = self.get("map/bounds", &[("latlng", latlng.as_str())]).await?;
        Ok(entries
            .into_iter()
            .map(|entry| Station::new(entry.uid, entry.station.name))
            .collect())
    }

    /// Current PM2.5 value reported by one station.
    pub async fn pm25(&self, station: &StationId) -> Result<f64, WaqiError> {
        let feed: Feed = self.get(&format!("feed/@{station}/"), &[]).await?;
        feed.iaqi
            .pm25
            .map(|measurement| measurement.v)
            .ok_or_else(|| WaqiError::MissingPm25 {
                station: station.clone(),
            })
    }
}

impl AirQualitySource for WaqiClient {
    type Error = WaqiError;

    async fn list_stations(&self, area: &BoundingBox) -> Result<Vec<Station>, WaqiError> {
        self.stations(area).await
    }

    async fn current_pm25(&self, station: &StationId) -> Result<f64, WaqiError> {
        self.pm25(station).await
    }
}
