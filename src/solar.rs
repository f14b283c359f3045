//! Subsolar point from UTC time.
//!
//! Low-precision solar position (the USNO/NOAA almanac series), good to
//! roughly a degree between 1950 and 2050. That is plenty for drawing a
//! terminator wash on a map and nowhere near ephemeris grade.

use chrono::{DateTime, Utc};

/// Unix timestamp of the J2000.0 epoch (2000-01-01 12:00 UTC) in milliseconds.
const J2000_UNIX_MS: i64 = 946_728_000_000;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Geographic location where the sun is directly overhead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubsolarPoint {
    /// Degrees, always in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees, always in `(-180, 180]`.
    pub longitude: f64,
}

impl SubsolarPoint {
    /// The point on the opposite side of the globe (local solar midnight).
    pub fn antipode(&self) -> (f64, f64) {
        (-self.latitude, normalize_longitude(self.longitude + 180.0))
    }
}

/// Fold any longitude into `(-180, 180]`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = longitude.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Fractional days elapsed since J2000.0. Negative before the epoch.
pub fn days_since_j2000(instant: DateTime<Utc>) -> f64 {
    (instant.timestamp_millis() - J2000_UNIX_MS) as f64 / MS_PER_DAY
}

/// Greenwich Mean Sidereal Time in degrees, `[0, 360)`.
pub fn greenwich_mean_sidereal_time(days: f64) -> f64 {
    (280.46061837 + 360.98564736629 * days).rem_euclid(360.0)
}

/// Compute the subsolar point for `instant`.
///
/// Total over every representable instant; far from the epoch the result
/// drifts but stays inside the coordinate ranges.
pub fn subsolar_point(instant: DateTime<Utc>) -> SubsolarPoint {
    let days = days_since_j2000(instant);

    // Solar mean longitude (degrees)
    let mean_lon = (280.460 + 0.9856474 * days).rem_euclid(360.0);
    // Solar mean anomaly (degrees)
    let mean_anomaly = (357.528 + 0.9856003 * days).rem_euclid(360.0);
    let g = mean_anomaly.to_radians();

    // Ecliptic longitude (degrees)
    let ecliptic_lon = mean_lon + 1.915 * g.sin() + 0.020 * (2.0 * g).sin();
    // Obliquity of the ecliptic (degrees)
    let obliquity = 23.439 - 0.0000004 * days;

    let lambda = ecliptic_lon.to_radians();
    let epsilon = obliquity.to_radians();

    // Declination is the subsolar latitude. Clamp guards the asin domain
    // against a product that rounds a hair past 1.
    let declination = (epsilon.sin() * lambda.sin()).clamp(-1.0, 1.0).asin();

    let right_ascension = (epsilon.cos() * lambda.sin())
        .atan2(lambda.cos())
        .to_degrees()
        .rem_euclid(360.0);

    let gmst = greenwich_mean_sidereal_time(days);

    SubsolarPoint {
        latitude: declination.to_degrees(),
        longitude: normalize_longitude(right_ascension - gmst),
    }
}
