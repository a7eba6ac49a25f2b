use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeZone, Timelike};

use crate::azimuth::normalize_degrees;
use crate::types::*;

pub const AXIAL_TILT_DEG: f64 = 23.44;
pub const DEGREES_PER_HOUR: f64 = 15.0;
/// Day of year of the vernal equinox used by the declination approximation.
const EQUINOX_DAY: f64 = 81.0;

impl TimeContext {
    pub fn new(day_of_year: u32, solar_time: f64) -> Result<Self> {
        let time = Self {
            day_of_year,
            solar_time,
        };
        time.validate()?;
        Ok(time)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=366).contains(&self.day_of_year) {
            return Err(ShadowError::InvalidDayOfYear(self.day_of_year));
        }
        if !(self.solar_time.is_finite() && (0.0..24.0).contains(&self.solar_time)) {
            return Err(ShadowError::InvalidSolarTime(self.solar_time));
        }
        Ok(())
    }

    /// Converts a wall-clock time into local apparent solar time.
    ///
    /// Solar time is clock time shifted by four minutes per degree between the
    /// longitude and the meridian of the datetime's UTC offset. The equation of
    /// time is ignored. When the shift crosses midnight the day of year moves
    /// with it.
    pub fn from_local_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>, longitude: f64) -> Result<Self> {
        let longitude = check_longitude(longitude)?;
        let offset_hours = datetime.offset().fix().local_minus_utc() as f64 / 3600.0;
        let clock_hours = datetime.hour() as f64
            + datetime.minute() as f64 / 60.0
            + datetime.second() as f64 / 3600.0;

        let correction_minutes = 4.0 * (longitude - DEGREES_PER_HOUR * offset_hours);
        let raw = clock_hours + correction_minutes / 60.0;

        let mut solar_time = raw.rem_euclid(24.0);
        if solar_time >= 24.0 {
            solar_time = 0.0;
        }

        let year = datetime.year();
        let year_length = days_in_year(year) as i64;
        let mut day = datetime.ordinal() as i64 + raw.div_euclid(24.0) as i64;
        if day < 1 {
            day += days_in_year(year - 1) as i64;
        } else if day > year_length {
            day -= year_length;
        }

        Self::new(day as u32, solar_time)
    }
}

fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365)
}

/// Low-precision sun position for a fixed latitude.
///
/// Every call recomputes the position; nothing is cached.
#[derive(Debug, Clone, Copy)]
pub struct SunCalculator {
    latitude: f64,
}

impl SunCalculator {
    pub fn new(latitude: f64) -> Result<Self> {
        Ok(Self {
            latitude: check_latitude(latitude)?,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn position(&self, time: &TimeContext) -> Result<SolarPosition> {
        time.validate()?;

        let declination = solar_declination(time.day_of_year);
        let hour_angle = hour_angle(time.solar_time);

        let lat_rad = self.latitude.to_radians();
        let dec_rad = declination.to_radians();
        let hour_rad = hour_angle.to_radians();

        // Solar elevation
        let sin_elevation =
            lat_rad.sin() * dec_rad.sin() + lat_rad.cos() * dec_rad.cos() * hour_rad.cos();
        let elevation = sin_elevation.clamp(-1.0, 1.0).asin().to_degrees();

        // Solar azimuth
        let azimuth = hour_rad
            .sin()
            .atan2(hour_rad.cos() * lat_rad.sin() - dec_rad.tan() * lat_rad.cos());

        Ok(SolarPosition {
            declination_deg: declination,
            hour_angle_deg: hour_angle,
            elevation_deg: elevation,
            azimuth_deg: normalize_degrees(azimuth.to_degrees()),
        })
    }
}

pub fn solar_declination(day_of_year: u32) -> f64 {
    AXIAL_TILT_DEG * ((360.0 / 365.0) * (day_of_year as f64 - EQUINOX_DAY)).to_radians().sin()
}

pub fn hour_angle(solar_time: f64) -> f64 {
    DEGREES_PER_HOUR * (solar_time - 12.0)
}

pub fn compute_solar_position(latitude: f64, time: &TimeContext) -> Result<SolarPosition> {
    SunCalculator::new(latitude)?.position(time)
}

/// Sun position at a location for a wall-clock datetime.
pub fn solar_position_at<Tz: TimeZone>(point: GeoPoint, datetime: &DateTime<Tz>) -> Result<SolarPosition> {
    let time = TimeContext::from_local_datetime(datetime, point.longitude)?;
    compute_solar_position(point.latitude, &time)
}
