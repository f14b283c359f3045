//! Web-Mercator coordinate conversion for the slippy map.
//!
//! World pixels follow the tile convention: origin at the north-west corner
//! of the world, x grows east, y grows south, and the world is
//! `256 · 2^zoom` pixels square. Zoom is continuous.

use std::f64::consts::PI;

use crate::solar::normalize_longitude;

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Mercator projection latitude limit (square world).
pub const MERCATOR_LAT_LIMIT: f64 = 85.0511;

/// Clamp latitude to valid Mercator projection range
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT)
}

/// Edge length of the whole world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Project a geographic position to world pixels at `zoom`.
/// Latitude is clamped to the Mercator limit first.
pub fn latlon_to_world_pixel(lat: f64, lon: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat_rad = clamp_latitude(lat).to_radians();

    let x = (normalize_longitude(lon) + 180.0) / 360.0 * size;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse projection. Any pixel maps to a valid coordinate: x wraps around
/// the antimeridian and y beyond the world edge approaches the poles.
pub fn world_pixel_to_latlon(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);

    let lon = normalize_longitude(x / size * 360.0 - 180.0);
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_size_doubles_per_zoom() {
        assert_eq!(world_size(0.0), 256.0);
        assert_eq!(world_size(3.0), 2048.0);
        assert!((world_size(0.5) - 256.0 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_origin_is_world_centre() {
        let (x, y) = latlon_to_world_pixel(0.0, 0.0, 2.0);
        assert!((x - 512.0).abs() < 1e-9);
        assert!((y - 512.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_sample_points() {
        for (lat, lon) in [(37.6872, -97.3301), (-33.86, 151.21), (64.13, -21.9), (0.0, 179.5)] {
            let (x, y) = latlon_to_world_pixel(lat, lon, 4.3);
            let (lat2, lon2) = world_pixel_to_latlon(x, y, 4.3);
            assert!((lat - lat2).abs() < 1e-9, "{lat} vs {lat2}");
            assert!((lon - lon2).abs() < 1e-9, "{lon} vs {lon2}");
        }
    }

    #[test]
    fn test_x_wraps_across_antimeridian() {
        let size = world_size(1.0);
        let (_, lon) = world_pixel_to_latlon(size + size / 4.0, size / 2.0, 1.0);
        assert!((lon + 90.0).abs() < 1e-9);
        let (_, lon) = world_pixel_to_latlon(-size / 4.0, size / 2.0, 1.0);
        assert!((lon - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_y_outside_world_stays_valid() {
        let size = world_size(0.0);
        let (north, _) = world_pixel_to_latlon(0.0, -size, 0.0);
        let (south, _) = world_pixel_to_latlon(0.0, 2.0 * size, 0.0);
        assert!(north > MERCATOR_LAT_LIMIT && north < 90.0);
        assert!(south < -MERCATOR_LAT_LIMIT && south > -90.0);
    }

    #[test]
    fn test_top_edge_is_mercator_limit() {
        let (lat, _) = world_pixel_to_latlon(0.0, 0.0, 0.0);
        assert!((lat - MERCATOR_LAT_LIMIT).abs() < 1e-3);
    }
}
