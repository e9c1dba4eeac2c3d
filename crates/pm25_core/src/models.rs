use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SamplingError;

/// A rectangle given by two corner points, in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub lat1: f64,
    pub lng1: f64,
    pub lat2: f64,
    pub lng2: f64,
}

impl BoundingBox {
    pub fn new(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Self {
        BoundingBox {
            lat1,
            lng1,
            lat2,
            lng2,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.lat1, self.lng1, self.lat2, self.lng2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for StationId {
    fn from(uid: i64) -> Self {
        StationId(uid.to_string())
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> Self {
        StationId(id.to_string())
    }
}

impl From<String> for StationId {
    fn from(id: String) -> Self {
        StationId(id)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
}

impl Station {
    pub fn new(id: impl Into<StationId>, name: impl Into<String>) -> Self {
        Station {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn label(&self, key_by: KeyBy) -> &str {
        match key_by {
            KeyBy::StationName => &self.name,
            KeyBy::StationId => self.id.as_str(),
        }
    }
}

/// Which station attribute labels the entries of a [`RunResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyBy {
    #[default]
    #[serde(rename = "name")]
    StationName,
    #[serde(rename = "id")]
    StationId,
}

/// How often and for how long the stations of an area are polled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    total_samples: u64,
    interval: Duration,
}

impl SamplingPlan {
    pub const DEFAULT_FREQUENCY: f64 = 5.0;
    pub const DEFAULT_DURATION: f64 = 1.0;
    /// Upper bound on the number of rounds of a single run.
    pub const MAX_SAMPLES: u64 = u32::MAX as u64;

    /// `frequency` is in samples per minute, `duration` in minutes.
    /// Both must be finite and strictly positive, the pause between rounds must
    /// fit in a [`Duration`] and the round count must not exceed [`Self::MAX_SAMPLES`].
    pub fn new(frequency: f64, duration: f64) -> Result<Self, SamplingError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SamplingError::InvalidParameter {
                name: "frequency",
                value: frequency,
            });
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SamplingError::InvalidParameter {
                name: "duration",
                value: duration,
            });
        }
        let interval = Duration::try_from_secs_f64(60.0 / frequency).map_err(|_| {
            SamplingError::InvalidParameter {
                name: "frequency",
                value: frequency,
            }
        })?;
        let rounds = (frequency * duration).round();
        if !(rounds <= Self::MAX_SAMPLES as f64) {
            return Err(SamplingError::InvalidParameter {
                name: "frequency * duration",
                value: frequency * duration,
            });
        }
        Ok(SamplingPlan {
            total_samples: (rounds as u64).max(1),
            interval,
        })
    }

    /// Number of sampling rounds, never less than one.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Delay between two consecutive rounds.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SamplingPlan {
    fn default() -> Self {
        SamplingPlan {
            total_samples: (Self::DEFAULT_FREQUENCY * Self::DEFAULT_DURATION) as u64,
            interval: Duration::from_secs_f64(60.0 / Self::DEFAULT_FREQUENCY),
        }
    }
}

/// Fraction of planned requests allowed to fail before a run is abandoned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureThreshold(f64);

impl FailureThreshold {
    pub const DEFAULT_RATIO: f64 = 0.01;

    pub fn new(ratio: f64) -> Result<Self, SamplingError> {
        if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
            return Err(SamplingError::InvalidParameter {
                name: "failure_threshold",
                value: ratio,
            });
        }
        Ok(FailureThreshold(ratio))
    }

    pub fn ratio(&self) -> f64 {
        self.0
    }

    /// Returns true once `failures` reaches the allowed share of `planned`.
    pub fn trips(&self, failures: u64, planned: u64) -> bool {
        failures as f64 >= self.0 * planned as f64
    }
}

impl Default for FailureThreshold {
    fn default() -> Self {
        FailureThreshold(Self::DEFAULT_RATIO)
    }
}

/// Running totals for one station over a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationAccumulator {
    pub sum: f64,
    pub successes: u32,
}

impl StationAccumulator {
    pub fn add_reading(&mut self, reading: f64) {
        self.sum += reading;
        self.successes += 1;
    }

    /// Mean of the successful readings, if there were any.
    pub fn average(&self) -> Option<f64> {
        (self.successes > 0).then(|| self.sum / self.successes as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAverage {
    pub label: String,
    pub average: f64,
    /// Number of successful readings behind `average`.
    pub samples: u32,
}

/// Outcome of a completed run.
///
/// Stations keep the order in which the data source listed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    stations: Vec<StationAverage>,
    regional_average: f64,
}

impl RunResult {
    pub(crate) fn new(stations: Vec<StationAverage>) -> Self {
        let regional_average =
            stations.iter().map(|s| s.average).sum::<f64>() / stations.len() as f64;
        RunResult {
            stations,
            regional_average,
        }
    }

    pub fn stations(&self) -> &[StationAverage] {
        &self.stations
    }

    /// Mean of the per-station averages.
    pub fn regional_average(&self) -> f64 {
        self.regional_average
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.stations
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.average)
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.stations
            .iter()
            .map(|s| (s.label.clone(), s.average))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_total_samples_rounds_and_floors_to_one() {
        let cases = [
            (5.0, 1.0, 5),
            (1.0, 1.0, 1),
            (2.0, 1.0, 2),
            (8.0, 2.0, 16),
            (1.0, 2.5, 3),
            (1.0, 2.4, 2),
            (0.1, 1.0, 1),
            (0.5, 0.5, 1),
            (30.0, 1.0, 30),
        ];

        for (frequency, duration, expected) in cases {
            let plan = SamplingPlan::new(frequency, duration).unwrap();
            assert_eq!(
                plan.total_samples(),
                expected,
                "frequency {frequency}, duration {duration}"
            );
            assert!(plan.total_samples() >= 1);
        }
    }

    #[test]
    fn test_interval() {
        let plan = SamplingPlan::new(2.0, 1.0).unwrap();
        assert_eq!(plan.interval(), Duration::from_secs(30));

        let plan = SamplingPlan::new(0.5, 4.0).unwrap();
        assert_eq!(plan.interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_plan_rejects_non_positive_values() {
        for (frequency, duration) in [
            (0.0, 1.0),
            (-1.0, 1.0),
            (f64::NAN, 1.0),
            (1.0, 0.0),
            (1.0, -1.0),
            (1.0, f64::INFINITY),
        ] {
            match SamplingPlan::new(frequency, duration) {
                Err(SamplingError::InvalidParameter { .. }) => {}
                other => panic!("Expected InvalidParameter error, got {other:?}"),
            }
        }

        match SamplingPlan::new(1.0, -1.0) {
            Err(SamplingError::InvalidParameter { name, value }) => {
                assert_eq!(name, "duration");
                assert_eq!(value, -1.0);
            }
            _ => panic!("Expected InvalidParameter error"),
        }
    }

    #[test]
    fn test_plan_rejects_unrepresentable_values() {
        // The pause between rounds would not fit in a Duration
        match SamplingPlan::new(1e-20, 1.0) {
            Err(SamplingError::InvalidParameter { name, value }) => {
                assert_eq!(name, "frequency");
                assert_eq!(value, 1e-20);
            }
            other => panic!("Expected InvalidParameter error, got {other:?}"),
        }

        // Too many rounds to plan
        match SamplingPlan::new(1e300, 1.0) {
            Err(SamplingError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "frequency * duration")
            }
            other => panic!("Expected InvalidParameter error, got {other:?}"),
        }

        // The largest round count is still accepted
        let plan = SamplingPlan::new(SamplingPlan::MAX_SAMPLES as f64, 1.0).unwrap();
        assert_eq!(plan.total_samples(), SamplingPlan::MAX_SAMPLES);

        // Slow but representable plans are fine
        let plan = SamplingPlan::new(0.25, 1.0).unwrap();
        assert_eq!(plan.total_samples(), 1);
        assert_eq!(plan.interval(), Duration::from_secs(240));
    }

    #[test]
    fn test_default_plan() {
        let plan = SamplingPlan::default();
        assert_eq!(plan, SamplingPlan::new(5.0, 1.0).unwrap());
        assert_eq!(plan.interval(), Duration::from_secs(12));
    }

    #[test]
    fn test_failure_threshold() {
        let threshold = FailureThreshold::default();

        // 120 planned requests allow a single failure
        assert!(!threshold.trips(0, 120));
        assert!(!threshold.trips(1, 120));
        assert!(threshold.trips(2, 120));

        // Exactly 1% trips
        assert!(threshold.trips(1, 100));

        // With few requests any failure trips
        assert!(threshold.trips(1, 2));

        assert!(FailureThreshold::new(0.0).is_err());
        assert!(FailureThreshold::new(1.5).is_err());
        assert!(FailureThreshold::new(f64::NAN).is_err());
        assert_eq!(FailureThreshold::new(1.0).unwrap().ratio(), 1.0);
    }

    #[test]
    fn test_accumulator() {
        let mut acc = StationAccumulator::default();
        assert_eq!(acc.average(), None);

        acc.add_reading(10.0);
        acc.add_reading(13.0);
        assert_eq!(acc.successes, 2);
        assert_eq!(acc.average(), Some(11.5));
    }

    #[test]
    fn test_station_label() {
        let station = Station::new(1437_i64, "Beijing US Embassy");
        assert_eq!(station.label(KeyBy::StationName), "Beijing US Embassy");
        assert_eq!(station.label(KeyBy::StationId), "1437");
    }

    #[test]
    fn test_bounding_box_display() {
        let area = BoundingBox::new(39.0, 116.0, 41.0, 116.04);
        assert_eq!(area.to_string(), "39,116,41,116.04");
    }

    #[test]
    fn test_run_result_is_mean_of_station_averages() {
        let result = RunResult::new(vec![
            StationAverage {
                label: "A".into(),
                average: 10.0,
                samples: 1,
            },
            StationAverage {
                label: "B".into(),
                average: 20.0,
                samples: 3,
            },
        ]);

        assert_eq!(result.regional_average(), 15.0);
        assert_eq!(result.get("B"), Some(20.0));
        assert_eq!(result.get("C"), None);
        assert_eq!(result.to_map().len(), 2);
    }
}
