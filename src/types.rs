use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, ShadowError>;

/// A geographic point in degrees. No datum correction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoPoint> for geo_types::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo_types::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo_types::Point<f64>> for GeoPoint {
    fn from(p: geo_types::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

/// Day of year plus local apparent solar time in decimal hours.
///
/// Built through [`TimeContext::new`] or
/// [`TimeContext::from_local_datetime`], both of which
/// reject out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeContext {
    pub day_of_year: u32,
    pub solar_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    pub declination_deg: f64,
    pub hour_angle_deg: f64,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

impl SolarPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

/// Outcome of the shadow length computation.
///
/// `NoShadow` means the sun is at or below the horizon. It never counts as
/// covering a path, whatever the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "meters", rename_all = "snake_case")]
pub enum ShadowLength {
    Length(f64),
    NoShadow,
}

impl ShadowLength {
    pub fn meters(&self) -> Option<f64> {
        match self {
            ShadowLength::Length(m) => Some(*m),
            ShadowLength::NoShadow => None,
        }
    }

    pub fn covers(&self, threshold_meters: f64) -> bool {
        matches!(self, ShadowLength::Length(m) if *m >= threshold_meters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub height_meters: f64,
    pub facade_azimuth_deg: f64,
    pub path_side: PathSide,
    pub distance_from_route_start_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageResult {
    pub covered_distance_meters: f64,
    pub total_distance_meters: f64,
    pub coverage_percent: f64,
}

impl CoverageResult {
    pub fn from_distances(covered_distance_meters: f64, total_distance_meters: f64) -> Self {
        let coverage_percent = if total_distance_meters > 0.0 {
            100.0 * covered_distance_meters / total_distance_meters
        } else {
            0.0
        };
        Self {
            covered_distance_meters,
            total_distance_meters,
            coverage_percent,
        }
    }

    /// Percentage rounded to two decimals, the precision route summaries show.
    pub fn rounded_percent(&self) -> f64 {
        (self.coverage_percent * 100.0).round() / 100.0
    }
}

/// One point of a coverage timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageSample {
    pub solar_time: f64,
    pub position: SolarPosition,
    pub result: CoverageResult,
}

#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("invalid latitude {0}° (must be between -90° and +90°)")]
    InvalidLatitude(f64),
    #[error("invalid longitude {0}° (must be between -180° and +180°)")]
    InvalidLongitude(f64),
    #[error("invalid day of year {0} (must be between 1 and 366)")]
    InvalidDayOfYear(u32),
    #[error("invalid solar time {0} h (must be in [0, 24))")]
    InvalidSolarTime(f64),
    #[error("invalid solar elevation {0}°")]
    InvalidElevation(f64),
    #[error("invalid structure height {0} m (must be finite and non-negative)")]
    InvalidHeight(f64),
    #[error("invalid facade azimuth {0}°")]
    InvalidAzimuth(f64),
    #[error("invalid distance {0} m (must be finite and non-negative)")]
    InvalidDistance(f64),
    #[error("invalid shadow threshold {0} m (must be finite and non-negative)")]
    InvalidThreshold(f64),
    #[error(
        "structure sequence not sorted by distance: record {index} at {next_meters} m follows {previous_meters} m"
    )]
    MalformedSequence {
        index: usize,
        previous_meters: f64,
        next_meters: f64,
    },
}

pub(crate) fn check_latitude(latitude: f64) -> Result<f64> {
    if latitude.is_finite() && (-90.0..=90.0).contains(&latitude) {
        Ok(latitude)
    } else {
        Err(ShadowError::InvalidLatitude(latitude))
    }
}

pub(crate) fn check_longitude(longitude: f64) -> Result<f64> {
    if longitude.is_finite() && (-180.0..=180.0).contains(&longitude) {
        Ok(longitude)
    } else {
        Err(ShadowError::InvalidLongitude(longitude))
    }
}

pub(crate) fn check_height(height_meters: f64) -> Result<f64> {
    if height_meters.is_finite() && height_meters >= 0.0 {
        Ok(height_meters)
    } else {
        Err(ShadowError::InvalidHeight(height_meters))
    }
}
