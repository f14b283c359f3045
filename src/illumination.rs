//! Day/night classification of a single geographic point.

use crate::solar::SubsolarPoint;

/// Cosine of the great-circle angle between an observer and the subsolar
/// point (spherical law of cosines). Equals the sine of the solar elevation
/// seen from the observer, ignoring refraction.
pub fn cos_solar_zenith(observer_lat: f64, observer_lon: f64, subsolar: &SubsolarPoint) -> f64 {
    let lat_obs = observer_lat.to_radians();
    let lat_sun = subsolar.latitude.to_radians();
    let delta_lon = (observer_lon - subsolar.longitude).to_radians();

    lat_obs.sin() * lat_sun.sin() + lat_obs.cos() * lat_sun.cos() * delta_lon.cos()
}

/// `true` when the sun is above the observer's horizon.
///
/// Binary on purpose: no twilight bands. Points exactly on the terminator
/// count as night.
pub fn is_daylight(observer_lat: f64, observer_lon: f64, subsolar: &SubsolarPoint) -> bool {
    cos_solar_zenith(observer_lat, observer_lon, subsolar) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: SubsolarPoint = SubsolarPoint { latitude: 0.0, longitude: 0.0 };

    #[test]
    fn test_subsolar_point_is_day_and_antipode_is_night() {
        for sun in [
            ORIGIN,
            SubsolarPoint { latitude: 23.44, longitude: -75.0 },
            SubsolarPoint { latitude: -17.2, longitude: 180.0 },
        ] {
            assert!(is_daylight(sun.latitude, sun.longitude, &sun));
            let (lat, lon) = sun.antipode();
            assert!(!is_daylight(lat, lon, &sun));
        }
    }

    #[test]
    fn test_quarter_circle_is_on_terminator() {
        assert!(cos_solar_zenith(0.0, 90.0, &ORIGIN).abs() < 1e-12);
        assert!(cos_solar_zenith(0.0, -90.0, &ORIGIN).abs() < 1e-12);
    }

    #[test]
    fn test_transition_across_terminator_is_monotonic() {
        assert!(is_daylight(0.0, 89.0, &ORIGIN));
        assert!(!is_daylight(0.0, 91.0, &ORIGIN));

        let mut last = f64::INFINITY;
        for lon in 0..=180 {
            let c = cos_solar_zenith(0.0, lon as f64, &ORIGIN);
            assert!(c <= last);
            last = c;
        }
    }

    #[test]
    fn test_origin_day_and_dateline_night() {
        assert!(is_daylight(0.0, 0.0, &ORIGIN));
        assert!(!is_daylight(0.0, 180.0, &ORIGIN));
    }

    #[test]
    fn test_polar_day_in_june() {
        let june = SubsolarPoint { latitude: 23.44, longitude: 0.0 };
        // North pole is lit all day, south pole dark all day.
        for lon in [-180.0, -90.0, 0.0, 90.0, 180.0] {
            assert!(is_daylight(89.0, lon, &june));
            assert!(!is_daylight(-89.0, lon, &june));
        }
    }
}
