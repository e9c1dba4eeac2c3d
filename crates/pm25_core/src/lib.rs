//! PM2.5 regional averaging.
//!
//! A [`Sampler`] polls every monitoring station inside a [`BoundingBox`] at a
//! fixed cadence, keeps a running average per station and reports the mean of
//! those averages for the whole region.

mod credential;
mod models;
mod sampler;
mod source;

pub use crate::credential::{Credential, TOKEN_ENV_VAR};
pub use crate::models::*;
pub use crate::sampler::Sampler;
pub use crate::source::{AirQualitySource, Pacer, TokioPacer};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing credential: pass a token explicitly or set the `{var}` environment variable")]
    MissingCredential { var: &'static str },
}

#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("invalid parameter `{name}`: {value} is out of range")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("no monitoring stations found in area {area}")]
    NoStations { area: BoundingBox },
    #[error("could not list the stations in area {area}: {source}")]
    StationQuery {
        area: BoundingBox,
        #[source]
        source: BoxError,
    },
    #[error(
        "upstream degraded: {failures} of {planned} planned requests failed (failure threshold {threshold})"
    )]
    UpstreamDegraded {
        failures: u64,
        planned: u64,
        threshold: f64,
    },
}

impl SamplingError {
    /// True for errors caused by the caller's input rather than the data source.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SamplingError::InvalidParameter { .. })
    }
}
