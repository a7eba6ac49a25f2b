//! Turning a route polyline into an ordered sequence of structure records.
//!
//! Structures are found by probing points offset to either side of each
//! route segment. Where a probe finds nothing, no record is produced.

use std::collections::HashMap;

use geo::HaversineDistance;
use geo_types::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::azimuth::{compute_azimuth, offset_point};
use crate::config::EngineConfig;
use crate::types::*;

/// Height assumed for a structure without height or level information.
pub const DEFAULT_STRUCTURE_HEIGHT_METERS: f64 = 10.0;
pub const METERS_PER_LEVEL: f64 = 3.0;

/// Attributes of a structure found near a probed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub height_meters: f64,
    #[serde(default = "unknown_kind")]
    pub kind: String,
}

fn unknown_kind() -> String {
    "unknown".to_string()
}

impl StructureInfo {
    /// Builds structure attributes from map tags.
    ///
    /// Height comes from `height`, then `building:levels` at three metres per
    /// level, then [`DEFAULT_STRUCTURE_HEIGHT_METERS`].
    pub fn from_tags(tags: &HashMap<String, String>) -> Self {
        let height_meters = tags
            .get("height")
            .and_then(|h| leading_number(h))
            .or_else(|| {
                tags.get("building:levels")
                    .and_then(|l| leading_number(l))
                    .map(|levels| levels * METERS_PER_LEVEL)
            })
            .unwrap_or(DEFAULT_STRUCTURE_HEIGHT_METERS);

        let kind = tags
            .get("building:type")
            .or_else(|| tags.get("building"))
            .cloned()
            .unwrap_or_else(unknown_kind);

        Self {
            height_meters,
            kind,
        }
    }
}

/// Parses the numeric prefix of a tag value such as `"12.5 m"`.
fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lookup of structures near a point, typically backed by a geospatial
/// data service.
pub trait StructureSource {
    fn probe(&self, point: GeoPoint) -> Option<StructureInfo>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownStructure {
    pub location: GeoPoint,
    #[serde(flatten)]
    pub info: StructureInfo,
}

/// In-memory structure source answering with the nearest known structure
/// within a radius.
#[derive(Debug, Clone)]
pub struct StaticStructureSource {
    structures: Vec<KnownStructure>,
    radius_meters: f64,
}

impl StaticStructureSource {
    pub fn new(structures: Vec<KnownStructure>, radius_meters: f64) -> Self {
        Self {
            structures,
            radius_meters,
        }
    }
}

impl StructureSource for StaticStructureSource {
    fn probe(&self, point: GeoPoint) -> Option<StructureInfo> {
        self.structures
            .iter()
            .map(|s| (distance_meters(point, s.location), s))
            .filter(|(d, _)| *d <= self.radius_meters)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, s)| s.info.clone())
    }
}

pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    Point::from(a).haversine_distance(&Point::from(b))
}

/// Distance from the route start to each vertex of the polyline.
pub fn cumulative_distances(route: &[GeoPoint]) -> Vec<f64> {
    let mut total = 0.0;
    let mut distances = Vec::with_capacity(route.len());
    if let Some(first) = route.first() {
        distances.push(0.0);
        let mut previous = *first;
        for &point in &route[1..] {
            total += distance_meters(previous, point);
            distances.push(total);
            previous = point;
        }
    }
    distances
}

pub fn route_length_meters(route: &[GeoPoint]) -> f64 {
    cumulative_distances(route).last().copied().unwrap_or(0.0)
}

fn check_point(point: &GeoPoint) -> Result<()> {
    check_latitude(point.latitude)?;
    check_longitude(point.longitude)?;
    Ok(())
}

/// Probes both sides of every route segment and returns the structures found,
/// ordered by distance from the route start.
///
/// Each record carries the distance of the segment start, where the probe is
/// taken, and the segment bearing as facade azimuth. At equal distances the
/// left structure precedes the right one.
pub fn discover_structures<S: StructureSource + ?Sized>(
    route: &[GeoPoint],
    source: &S,
    config: &EngineConfig,
) -> Result<Vec<StructureRecord>> {
    route.iter().try_for_each(check_point)?;

    let offset_meters = config.path_width_meters + config.building_setback_meters;
    let distances = cumulative_distances(route);
    let mut records = Vec::new();

    for (i, segment) in route.windows(2).enumerate() {
        let (start, end) = (segment[0], segment[1]);
        let facade_azimuth = compute_azimuth(start, end);

        for side in [PathSide::Left, PathSide::Right] {
            let probe = offset_point(start, end, side, offset_meters);
            match source.probe(probe) {
                Some(info) => records.push(StructureRecord {
                    height_meters: check_height(info.height_meters)?,
                    facade_azimuth_deg: facade_azimuth,
                    path_side: side,
                    distance_from_route_start_meters: distances[i],
                }),
                None => debug!(segment = i, ?side, "no structure at probe point"),
            }
        }
    }

    debug!(
        segments = route.len().saturating_sub(1),
        found = records.len(),
        "structure discovery finished"
    );
    Ok(records)
}

/// Records lying on one side of the path, order preserved.
pub fn records_on_side(records: &[StructureRecord], side: PathSide) -> Vec<StructureRecord> {
    records
        .iter()
        .filter(|r| r.path_side == side)
        .copied()
        .collect()
}
