//! Bearings between geographic points.
//!
//! All bearings are compass degrees (0 = north, clockwise) computed in plain
//! latitude/longitude degree space. This equirectangular shortcut is only
//! meant for the sub-kilometre segments of a walking route.

use crate::types::{GeoPoint, PathSide};

/// Approximate length of one degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Bearing from `start` to `end`, in `[0, 360)`.
pub fn compute_azimuth(start: GeoPoint, end: GeoPoint) -> f64 {
    let delta_lon = end.longitude - start.longitude;
    let delta_lat = end.latitude - start.latitude;
    normalize_degrees(delta_lon.atan2(delta_lat).to_degrees())
}

/// Bearing rotated a quarter turn toward `side` of travel.
pub fn perpendicular_bearing(bearing: f64, side: PathSide) -> f64 {
    match side {
        PathSide::Left => normalize_degrees(bearing - 90.0),
        PathSide::Right => normalize_degrees(bearing + 90.0),
    }
}

/// Point reached by moving `meters` from `origin` along `bearing`.
pub fn destination_point(origin: GeoPoint, bearing: f64, meters: f64) -> GeoPoint {
    let offset = meters / METERS_PER_DEGREE;
    let bearing_rad = bearing.to_radians();
    GeoPoint::new(
        origin.latitude + offset * bearing_rad.cos(),
        origin.longitude + offset * bearing_rad.sin(),
    )
}

/// Point `meters` away from `start`, perpendicular to the segment
/// `start -> end`, on the given side of travel.
pub fn offset_point(start: GeoPoint, end: GeoPoint, side: PathSide, meters: f64) -> GeoPoint {
    let bearing = perpendicular_bearing(compute_azimuth(start, end), side);
    destination_point(start, bearing, meters)
}
