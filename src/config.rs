use std::path::Path;

use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::route::{discover_structures, records_on_side, KnownStructure, StaticStructureSource};
use crate::types::*;

/// Width of a typical pedestrian path. A shadow shorter than this does not
/// shade the walker.
pub const DEFAULT_PATH_WIDTH_METERS: f64 = 2.0;
pub const DEFAULT_BUILDING_SETBACK_METERS: f64 = 5.0;
pub const DEFAULT_PROBE_RADIUS_METERS: f64 = 15.0;
/// Shortest spacing between timeline samples, one minute.
pub const MIN_HOUR_INTERVAL: f64 = 1.0 / 60.0;

fn default_path_width() -> f64 {
    DEFAULT_PATH_WIDTH_METERS
}

fn default_setback() -> f64 {
    DEFAULT_BUILDING_SETBACK_METERS
}

fn default_probe_radius() -> f64 {
    DEFAULT_PROBE_RADIUS_METERS
}

fn default_hour_interval() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum shadow length that counts as covering the path.
    #[serde(default = "default_path_width")]
    pub path_width_meters: f64,
    /// Distance from the path edge to the structure frontage.
    #[serde(default = "default_setback")]
    pub building_setback_meters: f64,
    #[serde(default = "default_probe_radius")]
    pub probe_radius_meters: f64,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub cpu_cores: Option<usize>,
    #[serde(default = "default_hour_interval")]
    pub hour_interval: f64,
    #[serde(default)]
    pub show_progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path_width_meters: DEFAULT_PATH_WIDTH_METERS,
            building_setback_meters: DEFAULT_BUILDING_SETBACK_METERS,
            probe_radius_meters: DEFAULT_PROBE_RADIUS_METERS,
            parallel: false,
            cpu_cores: None,
            hour_interval: default_hour_interval(),
            show_progress: false,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.path_width_meters.is_finite() && self.path_width_meters >= 0.0) {
            return Err(ShadowError::InvalidThreshold(self.path_width_meters));
        }
        if !(self.building_setback_meters.is_finite() && self.building_setback_meters >= 0.0) {
            return Err(ShadowError::Config(format!(
                "building setback must be non-negative, got {}",
                self.building_setback_meters
            )));
        }
        if !(self.probe_radius_meters.is_finite() && self.probe_radius_meters > 0.0) {
            return Err(ShadowError::Config(format!(
                "probe radius must be positive, got {}",
                self.probe_radius_meters
            )));
        }
        if !(self.hour_interval.is_finite() && self.hour_interval >= MIN_HOUR_INTERVAL) {
            return Err(ShadowError::Config(format!(
                "hour interval must be at least {} h, got {}",
                MIN_HOUR_INTERVAL, self.hour_interval
            )));
        }
        if self.cpu_cores == Some(0) {
            return Err(ShadowError::Config("cpu_cores must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn get_cpu_cores(&self) -> usize {
        self.cpu_cores.unwrap_or_else(num_cpus::get)
    }
}

/// A coverage request as read from a JSON file.
///
/// The moment is either an explicit `time` or a local `datetime` interpreted
/// in `timezone` (UTC when absent). Structures are either listed directly or
/// discovered along `route` among `known_structures`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub location: GeoPoint,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub time: Option<TimeContext>,
    #[serde(default)]
    pub structures: Vec<StructureRecord>,
    #[serde(default)]
    pub route: Vec<GeoPoint>,
    #[serde(default)]
    pub known_structures: Vec<KnownStructure>,
    #[serde(default)]
    pub side: Option<PathSide>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&content)?;
        scenario.engine.validate()?;
        Ok(scenario)
    }

    pub fn time_context(&self) -> Result<TimeContext> {
        if let Some(time) = self.time {
            time.validate()?;
            return Ok(time);
        }

        let datetime = self.datetime.as_deref().ok_or_else(|| {
            ShadowError::Config("scenario needs either `time` or `datetime`".to_string())
        })?;
        let naive = NaiveDateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M"))
            .map_err(|e| ShadowError::Config(format!("invalid datetime '{}': {}", datetime, e)))?;

        let tz: Tz = match self.timezone.as_deref() {
            Some(name) => name
                .parse()
                .map_err(|e| ShadowError::Config(format!("unknown timezone '{}': {}", name, e)))?,
            None => Tz::UTC,
        };
        let local = tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
            ShadowError::Config(format!("datetime '{}' does not exist in {:?}", datetime, tz))
        })?;

        TimeContext::from_local_datetime(&local, self.location.longitude)
    }

    /// Structure records for the scenario, restricted to `side` when set.
    ///
    /// Without a `side`, discovered left and right structures share route
    /// distances. A left record followed by a right one at the same vertex
    /// spans zero metres, so such a sequence mostly reflects the right side.
    pub fn structure_records(&self) -> Result<Vec<StructureRecord>> {
        let records = if !self.structures.is_empty() {
            self.structures.clone()
        } else if self.route.len() >= 2 {
            let source = StaticStructureSource::new(
                self.known_structures.clone(),
                self.engine.probe_radius_meters,
            );
            discover_structures(&self.route, &source, &self.engine)?
        } else {
            Vec::new()
        };

        Ok(match self.side {
            Some(side) => records_on_side(&records, side),
            None => {
                if has_mixed_sides(&records) {
                    warn!("structures on both sides of the path; set `side` to evaluate one side");
                }
                records
            }
        })
    }
}

/// Whether the records lie on both sides of the path.
pub fn has_mixed_sides(records: &[StructureRecord]) -> bool {
    records
        .split_first()
        .map(|(first, rest)| rest.iter().any(|r| r.path_side != first.path_side))
        .unwrap_or(false)
}
