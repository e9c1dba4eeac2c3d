use crate::{
    AirQualitySource, BoundingBox, FailureThreshold, KeyBy, Pacer, RunResult, SamplingError,
    SamplingPlan, StationAccumulator, StationAverage, TokioPacer,
};

/// Polls the stations of one area and averages their PM2.5 readings.
#[derive(Debug)]
pub struct Sampler<S, P = TokioPacer> {
    area: BoundingBox,
    source: S,
    pacer: P,
    threshold: FailureThreshold,
}

impl<S> Sampler<S, TokioPacer>
where
    S: AirQualitySource,
{
    pub fn new(area: BoundingBox, source: S) -> Self {
        Sampler {
            area,
            source,
            pacer: TokioPacer,
            threshold: FailureThreshold::default(),
        }
    }
}

impl<S, P> Sampler<S, P>
where
    S: AirQualitySource,
    P: Pacer,
{
    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> Sampler<S, Q> {
        Sampler {
            area: self.area,
            source: self.source,
            pacer,
            threshold: self.threshold,
        }
    }

    pub fn with_failure_threshold(mut self, threshold: FailureThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sample every station `frequency` times per minute for `duration` minutes.
    ///
    /// Parameters are validated before the data source is contacted. The run is
    /// abandoned with [`SamplingError::UpstreamDegraded`] as soon as the failed
    /// requests reach the failure threshold.
    pub async fn run(
        &self,
        frequency: f64,
        duration: f64,
        key_by: KeyBy,
    ) -> Result<RunResult, SamplingError> {
        let plan = SamplingPlan::new(frequency, duration)?;
        self.run_plan(plan, key_by).await
    }

    /// Mean of the per-station averages only.
    pub async fn region_average(&self, frequency: f64, duration: f64) -> Result<f64, SamplingError> {
        let result = self.run(frequency, duration, KeyBy::default()).await?;
        Ok(result.regional_average())
    }

    pub async fn run_plan(
        &self,
        plan: SamplingPlan,
        key_by: KeyBy,
    ) -> Result<RunResult, SamplingError> {
        let stations = self
            .source
            .list_stations(&self.area)
            .await
            .map_err(|e| SamplingError::StationQuery {
                area: self.area,
                source: Box::new(e),
            })?;
        if stations.is_empty() {
            return Err(SamplingError::NoStations { area: self.area });
        }

        let total_samples = plan.total_samples();
        let planned = total_samples.saturating_mul(stations.len() as u64);
        let mut accumulators = vec![StationAccumulator::default(); stations.len()];
        let mut failures = 0u64;

        tracing::info!(
            "Sampling {} stations in {}: {} rounds every {:?}",
            stations.len(),
            self.area,
            total_samples,
            plan.interval()
        );

        for round in 0..total_samples {
            if round > 0 {
                self.pacer.pause(plan.interval()).await;
            }

            for (station, accumulator) in stations.iter().zip(accumulators.iter_mut()) {
                match self.source.current_pm25(&station.id).await {
                    Ok(reading) => accumulator.add_reading(reading),
                    Err(error) => {
                        failures += 1;
                        tracing::warn!(
                            "Reading station {} ({}) failed: {}",
                            station.id,
                            station.name,
                            error
                        );
                        if self.threshold.trips(failures, planned) {
                            tracing::error!(
                                "Aborting run after {} failed requests out of {} planned",
                                failures,
                                planned
                            );
                            return Err(SamplingError::UpstreamDegraded {
                                failures,
                                planned,
                                threshold: self.threshold.ratio(),
                            });
                        }
                    }
                }
            }
            tracing::debug!("Round {}/{} done: {:?}", round + 1, total_samples, accumulators);
        }

        // The threshold ratio is at most 1, so at least one reading succeeded.
        let averages = stations
            .iter()
            .zip(&accumulators)
            .filter_map(|(station, accumulator)| match accumulator.average() {
                Some(average) => Some(StationAverage {
                    label: station.label(key_by).to_string(),
                    average,
                    samples: accumulator.successes,
                }),
                None => {
                    tracing::warn!("Station {} returned no reading, skipping it", station.name);
                    None
                }
            })
            .collect();

        let result = RunResult::new(averages);
        tracing::info!(
            "Run complete with {} failed requests, regional average {:.2}",
            failures,
            result.regional_average()
        );
        Ok(result)
    }
}
