use crate::azimuth::{destination_point, normalize_degrees};
use crate::types::*;

/// Length of the shadow a structure of `height_meters` casts on flat ground.
///
/// Returns [`ShadowLength::NoShadow`] when the sun is at or below the horizon
/// and a zero length when it is directly overhead.
pub fn compute_shadow_length(height_meters: f64, elevation_deg: f64) -> Result<ShadowLength> {
    let height = check_height(height_meters)?;

    if elevation_deg.is_nan() {
        return Err(ShadowError::InvalidElevation(elevation_deg));
    }
    if elevation_deg <= 0.0 {
        return Ok(ShadowLength::NoShadow);
    }
    if elevation_deg >= 90.0 {
        return Ok(ShadowLength::Length(0.0));
    }

    Ok(ShadowLength::Length(height / elevation_deg.to_radians().tan()))
}

/// Direction the shadow points, opposite the sun.
pub fn shadow_azimuth(sun_azimuth_deg: f64) -> f64 {
    normalize_degrees(sun_azimuth_deg + 180.0)
}

/// Far end of a shadow of `length_meters` cast from `origin`.
pub fn shadow_tip(origin: GeoPoint, length_meters: f64, sun_azimuth_deg: f64) -> GeoPoint {
    destination_point(origin, shadow_azimuth(sun_azimuth_deg), length_meters)
}
