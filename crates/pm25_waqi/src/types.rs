//! Wire types of the WAQI JSON API.
//!
//! Every response is wrapped in `{"status": "ok" | "error", "data": ...}`. On
//! error, `data` is a message string.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One entry of `/map/bounds`.
#[derive(Debug, Deserialize)]
pub(crate) struct BoundsEntry {
    pub uid: i64,
    pub station: BoundsStation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BoundsStation {
    pub name: String,
}

/// The `data` object of `/feed/@{uid}/`.
#[derive(Debug, Deserialize)]
pub(crate) struct Feed {
    #[serde(default)]
    pub iaqi: Iaqi,
}

/// Individual air quality indexes, keyed by pollutant.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Iaqi {
    pub pm25: Option<Measurement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Measurement {
    pub v: f64,
}
