//! Sunset times from the NOAA sunrise equation.
//!
//! Accurate to a minute or two away from the polar circles, which is far
//! inside the margin any `BUFFER_AFTER_SUNSET` adds.  No network or
//! ephemeris files are needed.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::app::ports::SunsetProvider;
use crate::config::Location;
use crate::error::SolarError;

/// Julian day of 2000-01-01 12:00 UTC.
const J2000: f64 = 2_451_545.0;
/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Axial tilt of the Earth, degrees.
const OBLIQUITY: f64 = 23.4397;
/// Solar altitude at apparent sunset: refraction plus the solar disc radius.
const SUNSET_ALTITUDE: f64 = -0.833;

#[derive(Debug, Clone, Copy)]
pub struct NoaaSunset {
    location: Location,
}

impl NoaaSunset {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Julian day of sunset on `date` at the configured longitude.
    fn sunset_julian(&self, date: NaiveDate) -> Result<f64, SolarError> {
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).ok_or(SolarError::OutOfRange(date))?;
        let n = (date - epoch).num_days() as f64;
        let lat = self.location.latitude.to_radians();

        // Mean solar noon, then solar anomaly and equation of the centre.
        let j_star = n - self.location.longitude / 360.0;
        let m = (357.5291 + 0.985_600_28 * j_star).rem_euclid(360.0);
        let m_rad = m.to_radians();
        let c = 1.9148 * m_rad.sin() + 0.0200 * (2.0 * m_rad).sin() + 0.0003 * (3.0 * m_rad).sin();
        let ecliptic = (m + c + 180.0 + 102.9372).rem_euclid(360.0).to_radians();
        let transit = J2000 + j_star + 0.0053 * m_rad.sin() - 0.0069 * (2.0 * ecliptic).sin();

        let sin_decl = ecliptic.sin() * OBLIQUITY.to_radians().sin();
        let cos_decl = (1.0 - sin_decl * sin_decl).sqrt();
        let cos_hour_angle =
            (SUNSET_ALTITUDE.to_radians().sin() - lat.sin() * sin_decl) / (lat.cos() * cos_decl);

        if !cos_hour_angle.is_finite() {
            return Err(SolarError::OutOfRange(date));
        }
        if cos_hour_angle < -1.0 {
            return Err(SolarError::MidnightSun(date));
        }
        if cos_hour_angle > 1.0 {
            return Err(SolarError::PolarNight(date));
        }
        Ok(transit + cos_hour_angle.acos().to_degrees() / 360.0)
    }
}

impl SunsetProvider for NoaaSunset {
    fn sunset(
        &self,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, SolarError> {
        let julian = self.sunset_julian(date)?;
        let unix_ms = ((julian - UNIX_EPOCH_JD) * 86_400_000.0).round() as i64;
        DateTime::<Utc>::from_timestamp_millis(unix_ms)
            .map(|utc| utc.with_timezone(&offset))
            .ok_or(SolarError::OutOfRange(date))
    }
}
