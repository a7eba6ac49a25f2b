use std::collections::HashMap;

use shade_route::azimuth::{offset_point, METERS_PER_DEGREE};
use shade_route::config::EngineConfig;
use shade_route::coverage::compute_coverage;
use shade_route::route::*;
use shade_route::types::*;

macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $tol,
            "assert_approx failed: left={}, right={}, diff={}, tol={}",
            l, r, (l - r).abs(), $tol
        );
    };
}

/// Three points heading due north, about 111 m apart.
fn north_route() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(40.0, -74.0),
        GeoPoint::new(40.001, -74.0),
        GeoPoint::new(40.002, -74.0),
    ]
}

fn config() -> EngineConfig {
    EngineConfig {
        probe_radius_meters: 3.0,
        ..EngineConfig::default()
    }
}

fn known(location: GeoPoint, height: f64) -> KnownStructure {
    KnownStructure {
        location,
        info: StructureInfo {
            height_meters: height,
            kind: "residential".to_string(),
        },
    }
}

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Distances ──

#[test]
fn test_cumulative_distances_along_meridian() {
    let distances = cumulative_distances(&north_route());
    assert_eq!(distances.len(), 3);
    assert_eq!(distances[0], 0.0);
    assert_approx!(distances[1], 111.2, 0.5);
    assert_approx!(distances[2], 2.0 * distances[1], 1e-6);
    assert_approx!(route_length_meters(&north_route()), distances[2], 1e-12);
}

#[test]
fn test_single_point_route_has_zero_length() {
    let route = [GeoPoint::new(1.0, 1.0)];
    assert_eq!(cumulative_distances(&route), vec![0.0]);
    assert_eq!(route_length_meters(&route), 0.0);
}

// ── Tag interpretation ──

#[test]
fn test_height_from_height_tag() {
    let info = StructureInfo::from_tags(&tags(&[("height", "15"), ("building:levels", "9")]));
    assert_eq!(info.height_meters, 15.0);
}

#[test]
fn test_height_from_levels() {
    let info = StructureInfo::from_tags(&tags(&[("building:levels", "4"), ("building", "yes")]));
    assert_eq!(info.height_meters, 12.0);
    assert_eq!(info.kind, "yes");
}

#[test]
fn test_height_defaults_when_untagged() {
    let info = StructureInfo::from_tags(&tags(&[("height", "unknown")]));
    assert_eq!(info.height_meters, DEFAULT_STRUCTURE_HEIGHT_METERS);
    assert_eq!(info.kind, "unknown");
}

#[test]
fn test_kind_prefers_building_type() {
    let info = StructureInfo::from_tags(&tags(&[("building:type", "office"), ("building", "yes")]));
    assert_eq!(info.kind, "office");
}

// ── Static source ──

#[test]
fn test_static_source_returns_nearest_within_radius() {
    let here = GeoPoint::new(40.0, -74.0);
    let near = GeoPoint::new(40.0 + 1.0 / METERS_PER_DEGREE, -74.0);
    let nearer = GeoPoint::new(40.0 + 0.5 / METERS_PER_DEGREE, -74.0);
    let source = StaticStructureSource::new(vec![known(near, 10.0), known(nearer, 20.0)], 3.0);

    assert_eq!(source.probe(here).unwrap().height_meters, 20.0);
    assert!(source.probe(GeoPoint::new(41.0, -74.0)).is_none());
}

// ── Discovery ──

#[test]
fn test_discovery_without_structures_is_empty() {
    let source = StaticStructureSource::new(Vec::new(), 3.0);
    let records = discover_structures(&north_route(), &source, &config()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_discovery_probes_each_side() {
    let route = north_route();
    let offset = 2.0 + 5.0;
    let left_of_first = offset_point(route[0], route[1], PathSide::Left, offset);
    let right_of_second = offset_point(route[1], route[2], PathSide::Right, offset);
    let source = StaticStructureSource::new(
        vec![known(left_of_first, 18.0), known(right_of_second, 9.0)],
        3.0,
    );

    let records = discover_structures(&route, &source, &config()).unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].path_side, PathSide::Left);
    assert_eq!(records[0].height_meters, 18.0);
    assert_eq!(records[0].distance_from_route_start_meters, 0.0);
    assert_approx!(records[0].facade_azimuth_deg, 0.0, 1e-9);

    assert_eq!(records[1].path_side, PathSide::Right);
    assert_eq!(records[1].height_meters, 9.0);
    assert_approx!(records[1].distance_from_route_start_meters, 111.2, 0.5);
}

#[test]
fn test_discovered_records_are_sorted_and_usable() {
    let route = north_route();
    let offset = 7.0;
    let mut structures = Vec::new();
    for segment in route.windows(2) {
        for side in [PathSide::Left, PathSide::Right] {
            structures.push(known(offset_point(segment[0], segment[1], side, offset), 12.0));
        }
    }
    let source = StaticStructureSource::new(structures, 3.0);
    let records = discover_structures(&route, &source, &config()).unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].path_side, PathSide::Left);
    assert_eq!(records[1].path_side, PathSide::Right);
    for pair in records.windows(2) {
        assert!(
            pair[0].distance_from_route_start_meters <= pair[1].distance_from_route_start_meters
        );
    }

    let right = records_on_side(&records, PathSide::Right);
    assert_eq!(right.len(), 2);
    let position = SolarPosition {
        declination_deg: 0.0,
        hour_angle_deg: 0.0,
        elevation_deg: 30.0,
        azimuth_deg: 0.0,
    };
    let result = compute_coverage(&right, &position, 2.0).unwrap();
    assert_approx!(result.coverage_percent, 100.0, 1e-9);
}

struct BrokenSource;

impl StructureSource for BrokenSource {
    fn probe(&self, _point: GeoPoint) -> Option<StructureInfo> {
        Some(StructureInfo {
            height_meters: -4.0,
            kind: "unknown".to_string(),
        })
    }
}

#[test]
fn test_invalid_probed_height_is_an_error() {
    assert!(matches!(
        discover_structures(&north_route(), &BrokenSource, &config()),
        Err(ShadowError::InvalidHeight(_))
    ));
}

#[test]
fn test_invalid_route_point_is_an_error() {
    let route = vec![GeoPoint::new(95.0, 0.0), GeoPoint::new(40.0, 0.0)];
    let source = StaticStructureSource::new(Vec::new(), 3.0);
    assert!(matches!(
        discover_structures(&route, &source, &config()),
        Err(ShadowError::InvalidLatitude(_))
    ));
}

#[test]
fn test_known_structure_json_is_flat() {
    let s: KnownStructure = serde_json::from_str(
        r#"{"location": {"latitude": 1.0, "longitude": 2.0}, "height_meters": 12.0}"#,
    )
    .unwrap();
    assert_eq!(s.info.height_meters, 12.0);
    assert_eq!(s.info.kind, "unknown");
}
