use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::azimuth::normalize_degrees;
use crate::config::EngineConfig;
use crate::shadow_geometry::compute_shadow_length;
use crate::sun_position::SunCalculator;
use crate::types::*;

/// Whether a structure's shadow falls on the given side of the path.
///
/// The boundary differences 90° and 270° belong to the right side so the two
/// sides partition every possible difference.
pub fn is_shadow_on_path(sun_azimuth_deg: f64, facade_azimuth_deg: f64, side: PathSide) -> bool {
    let diff = (normalize_degrees(sun_azimuth_deg) - normalize_degrees(facade_azimuth_deg)).abs();
    match side {
        PathSide::Left => diff > 90.0 && diff < 270.0,
        PathSide::Right => diff <= 90.0 || diff >= 270.0,
    }
}

/// Contribution of one pair of consecutive structures.
#[derive(Debug, Clone, Copy)]
struct SegmentOutcome {
    segment_meters: f64,
    covered_meters: f64,
}

fn check_threshold(threshold_meters: f64) -> Result<f64> {
    if threshold_meters.is_finite() && threshold_meters >= 0.0 {
        Ok(threshold_meters)
    } else {
        Err(ShadowError::InvalidThreshold(threshold_meters))
    }
}

fn check_record(record: &StructureRecord) -> Result<()> {
    check_height(record.height_meters)?;
    if !record.facade_azimuth_deg.is_finite() {
        return Err(ShadowError::InvalidAzimuth(record.facade_azimuth_deg));
    }
    let distance = record.distance_from_route_start_meters;
    if !(distance.is_finite() && distance >= 0.0) {
        return Err(ShadowError::InvalidDistance(distance));
    }
    Ok(())
}

fn evaluate_segment(
    index: usize,
    current: &StructureRecord,
    next: &StructureRecord,
    position: &SolarPosition,
    threshold_meters: f64,
) -> Result<SegmentOutcome> {
    let segment_meters =
        next.distance_from_route_start_meters - current.distance_from_route_start_meters;
    if segment_meters < 0.0 {
        return Err(ShadowError::MalformedSequence {
            index: index + 1,
            previous_meters: current.distance_from_route_start_meters,
            next_meters: next.distance_from_route_start_meters,
        });
    }

    let shadow = compute_shadow_length(current.height_meters, position.elevation_deg)?;
    let covers = shadow.covers(threshold_meters);
    let aligned = is_shadow_on_path(
        position.azimuth_deg,
        current.facade_azimuth_deg,
        current.path_side,
    );

    Ok(SegmentOutcome {
        segment_meters,
        covered_meters: if covers && aligned { segment_meters } else { 0.0 },
    })
}

fn check_position(position: &SolarPosition) -> Result<()> {
    if !position.elevation_deg.is_finite() {
        return Err(ShadowError::InvalidElevation(position.elevation_deg));
    }
    if !position.azimuth_deg.is_finite() {
        return Err(ShadowError::InvalidAzimuth(position.azimuth_deg));
    }
    Ok(())
}

fn validate_inputs(
    records: &[StructureRecord],
    position: &SolarPosition,
    threshold_meters: f64,
) -> Result<()> {
    check_threshold(threshold_meters)?;
    check_position(position)?;
    records.iter().try_for_each(check_record)
}

/// Left-to-right sum of segment outcomes, stopping at the first failure.
fn accumulate<I>(outcomes: I) -> Result<CoverageResult>
where
    I: IntoIterator<Item = Result<SegmentOutcome>>,
{
    let (covered, total) = outcomes
        .into_iter()
        .try_fold((0.0_f64, 0.0_f64), |(covered, total), outcome| {
            outcome.map(|o| (covered + o.covered_meters, total + o.segment_meters))
        })?;
    Ok(CoverageResult::from_distances(covered, total))
}

/// Fraction of the route between the first and last structure that lies in
/// a shadow reaching across the path.
///
/// `records` must be sorted by distance from the route start. A decreasing
/// distance is reported as [`ShadowError::MalformedSequence`]. Fewer than two
/// records give an all-zero result.
pub fn compute_coverage(
    records: &[StructureRecord],
    position: &SolarPosition,
    threshold_meters: f64,
) -> Result<CoverageResult> {
    validate_inputs(records, position, threshold_meters)?;
    if records.len() < 2 {
        return Ok(CoverageResult::default());
    }

    accumulate(
        records
            .windows(2)
            .enumerate()
            .map(|(i, pair)| evaluate_segment(i, &pair[0], &pair[1], position, threshold_meters)),
    )
}

/// Same as [`compute_coverage`], evaluating segments on the rayon pool.
///
/// Segment outcomes are collected in route order and summed sequentially, so
/// the result is bit-identical to the sequential version.
pub fn compute_coverage_parallel(
    records: &[StructureRecord],
    position: &SolarPosition,
    threshold_meters: f64,
) -> Result<CoverageResult> {
    validate_inputs(records, position, threshold_meters)?;
    if records.len() < 2 {
        return Ok(CoverageResult::default());
    }

    let outcomes: Vec<Result<SegmentOutcome>> = records
        .par_windows(2)
        .enumerate()
        .map(|(i, pair)| evaluate_segment(i, &pair[0], &pair[1], position, threshold_meters))
        .collect();

    accumulate(outcomes)
}

/// Sizes the global rayon pool. Only the first call in a process has an
/// effect; later calls keep the existing pool.
pub fn configure_thread_pool(cpu_cores: usize) {
    debug!(cpu_cores, "configuring rayon thread pool");
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cpu_cores)
        .build_global()
    {
        warn!("failed to configure rayon thread pool: {}", e);
    }
}

/// Highest-coverage sample, the earliest one on ties.
pub fn best_sample(samples: &[CoverageSample]) -> Option<&CoverageSample> {
    samples.iter().fold(None, |best: Option<&CoverageSample>, sample| match best {
        Some(b) if b.result.coverage_percent >= sample.result.coverage_percent => Some(b),
        _ => Some(sample),
    })
}

pub struct ShadowEngine {
    config: EngineConfig,
}

impl ShadowEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if config.parallel {
            configure_thread_pool(config.get_cpu_cores());
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculate_coverage(
        &self,
        records: &[StructureRecord],
        position: &SolarPosition,
    ) -> Result<CoverageResult> {
        let threshold = self.config.path_width_meters;
        let result = if self.config.parallel {
            compute_coverage_parallel(records, position, threshold)?
        } else {
            compute_coverage(records, position, threshold)?
        };

        debug!(
            structures = records.len(),
            elevation = position.elevation_deg,
            azimuth = position.azimuth_deg,
            covered = result.covered_distance_meters,
            total = result.total_distance_meters,
            "coverage computed"
        );
        Ok(result)
    }

    /// Solar times from `start_solar_time` to `end_solar_time` inclusive,
    /// spaced by the configured hour interval.
    fn generate_solar_times(&self, start_solar_time: f64, end_solar_time: f64) -> Vec<f64> {
        let interval = self.config.hour_interval;
        let count = ((end_solar_time - start_solar_time) / interval + 1e-9).floor() as usize + 1;

        (0..count)
            .map(|step| start_solar_time + step as f64 * interval)
            .filter(|&t| t < 24.0)
            .collect()
    }

    /// Coverage sampled through one day, one sample per configured interval.
    ///
    /// Samples with the sun below the horizon are kept and report zero
    /// coverage.
    pub fn coverage_timeline(
        &self,
        records: &[StructureRecord],
        latitude: f64,
        day_of_year: u32,
        start_solar_time: f64,
        end_solar_time: f64,
    ) -> Result<Vec<CoverageSample>> {
        let sun = SunCalculator::new(latitude)?;
        TimeContext::new(day_of_year, start_solar_time)?;
        TimeContext::new(day_of_year, end_solar_time)?;
        if end_solar_time < start_solar_time {
            return Err(ShadowError::Config(format!(
                "timeline ends at {} h before it starts at {} h",
                end_solar_time, start_solar_time
            )));
        }

        let solar_times = self.generate_solar_times(start_solar_time, end_solar_time);
        info!(
            samples = solar_times.len(),
            day_of_year, "calculating coverage timeline"
        );

        let pb = if self.config.show_progress {
            ProgressBar::new(solar_times.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut samples = Vec::with_capacity(solar_times.len());
        for solar_time in solar_times {
            let time = TimeContext::new(day_of_year, solar_time)?;
            let position = sun.position(&time)?;
            let result = self.calculate_coverage(records, &position)?;
            samples.push(CoverageSample {
                solar_time,
                position,
                result,
            });
            pb.inc(1);
        }

        pb.finish_with_message("coverage timeline complete");
        Ok(samples)
    }
}
