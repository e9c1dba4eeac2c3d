use std::future::Future;
use std::time::Duration;

use crate::{BoundingBox, Station, StationId};

/// A provider of air-quality monitoring stations and their live readings.
pub trait AirQualitySource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every station located inside `area`.
    ///
    /// The order is kept for the whole run and determines the order of the
    /// resulting averages.
    fn list_stations(
        &self,
        area: &BoundingBox,
    ) -> impl Future<Output = Result<Vec<Station>, Self::Error>> + Send;

    /// Current PM2.5 concentration of one station, in µg/m³.
    fn current_pm25(
        &self,
        station: &StationId,
    ) -> impl Future<Output = Result<f64, Self::Error>> + Send;
}

/// Waits between two sampling rounds.
pub trait Pacer {
    fn pause(&self, period: Duration) -> impl Future<Output = ()> + Send;
}

/// Real wall-clock pacing on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}
