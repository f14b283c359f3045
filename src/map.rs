use bevy::prelude::*;

use crate::config::AppConfig;
use crate::constants;
use crate::geo::{clamp_latitude, latlon_to_world_pixel, world_pixel_to_latlon};
use crate::mask::Viewport;
use crate::render_layers::layers_2d_map;
use crate::solar::normalize_longitude;

/// Resource to track map state (center position and zoom level)
#[derive(Resource, Clone, Debug, PartialEq, Reflect)]
#[reflect(Default)]
pub struct MapState {
    /// Current map center latitude
    pub latitude: f64,
    /// Current map center longitude
    pub longitude: f64,
    /// Continuous zoom level (0 = whole world in one 256 px tile)
    pub zoom: f64,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            latitude: constants::DEFAULT_LATITUDE,
            longitude: constants::DEFAULT_LONGITUDE,
            zoom: constants::DEFAULT_ZOOM,
        }
    }
}

impl MapState {
    /// Move the centre to a new position, keeping coordinates in range.
    pub fn set_center(&mut self, lat: f64, lon: f64) {
        self.latitude = clamp_latitude(lat);
        self.longitude = normalize_longitude(lon);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(constants::MIN_ZOOM, constants::MAX_ZOOM);
    }

    /// Snapshot of the current projection for a window of `window_size`
    /// logical pixels.
    pub fn viewport(&self, window_size: Vec2) -> MapViewport {
        let (center_x, center_y) = latlon_to_world_pixel(self.latitude, self.longitude, self.zoom);
        MapViewport {
            center_x,
            center_y,
            zoom: self.zoom,
            width: window_size.x.floor() as i32,
            height: window_size.y.floor() as i32,
        }
    }
}

/// Immutable Web-Mercator projection of one frame: the window centre sits
/// on the map centre and one screen pixel is one world pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapViewport {
    center_x: f64,
    center_y: f64,
    zoom: f64,
    width: i32,
    height: i32,
}

impl MapViewport {
    /// Screen coordinates (top-left origin, y down) to latitude/longitude.
    pub fn screen_to_latlon(&self, sx: f64, sy: f64) -> (f64, f64) {
        let wx = self.center_x + sx - self.width as f64 / 2.0;
        let wy = self.center_y + sy - self.height as f64 / 2.0;
        world_pixel_to_latlon(wx, wy, self.zoom)
    }

    /// Latitude/longitude to Bevy world space, relative to the window centre
    /// (x right, y up). Longitude is not unwrapped; callers pick the copy
    /// of the world they want.
    pub fn latlon_to_world(&self, lat: f64, lon: f64) -> Vec2 {
        let (wx, wy) = latlon_to_world_pixel(lat, lon, self.zoom);
        Vec2::new((wx - self.center_x) as f32, -(wy - self.center_y) as f32)
    }
}

impl Viewport for MapViewport {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn pixel_to_geo(&self, x: u32, y: u32) -> (f64, f64) {
        self.screen_to_latlon(x as f64, y as f64)
    }
}

/// Marker for the primary 2D map camera.
#[derive(Component)]
pub struct MapCamera;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MapState>()
            .add_systems(PreStartup, init_map_state)
            .add_systems(Startup, setup_map_camera);
    }
}

/// Seed the map centre from the loaded configuration.
fn init_map_state(mut commands: Commands, config: Res<AppConfig>) {
    let mut state = MapState::default();
    state.set_center(config.map.default_latitude, config.map.default_longitude);
    state.set_zoom(config.map.default_zoom);
    commands.insert_resource(state);
}

fn setup_map_camera(mut commands: Commands) {
    commands.spawn((Name::new("Map Camera"), Camera2d, MapCamera, layers_2d_map()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::reflect::Reflect;

    #[test]
    fn map_state_implements_reflect() {
        let state = MapState::default();
        let _: &dyn Reflect = &state;
    }

    #[test]
    fn test_window_centre_maps_to_map_centre() {
        let state = MapState {
            latitude: 37.6872,
            longitude: -97.3301,
            zoom: 6.0,
        };
        let viewport = state.viewport(Vec2::new(1280.0, 720.0));
        let (lat, lon) = viewport.pixel_to_geo(640, 360);
        assert!((lat - 37.6872).abs() < 1e-9);
        assert!((lon + 97.3301).abs() < 1e-9);
    }

    #[test]
    fn test_screen_axes() {
        let state = MapState {
            latitude: 0.0,
            longitude: 0.0,
            zoom: 3.0,
        };
        let viewport = state.viewport(Vec2::new(400.0, 300.0));
        let (lat_top, lon_left) = viewport.pixel_to_geo(0, 0);
        let (lat_bottom, lon_right) = viewport.pixel_to_geo(399, 299);
        assert!(lat_top > 0.0 && lat_bottom < 0.0);
        assert!(lon_left < 0.0 && lon_right > 0.0);
    }

    #[test]
    fn test_viewport_size_truncates_window() {
        let viewport = MapState::default().viewport(Vec2::new(1023.7, 0.4));
        assert_eq!(viewport.size(), (1023, 0));
    }

    #[test]
    fn test_world_position_of_centre_is_origin() {
        let state = MapState::default();
        let viewport = state.viewport(Vec2::new(800.0, 600.0));
        let p = viewport.latlon_to_world(state.latitude, state.longitude);
        assert!(p.length() < 1e-3);
        // North is up in Bevy world space.
        assert!(viewport.latlon_to_world(state.latitude + 1.0, state.longitude).y > 0.0);
    }

    #[test]
    fn test_set_center_keeps_ranges() {
        let mut state = MapState::default();
        state.set_center(89.0, 200.0);
        assert_eq!(state.latitude, crate::geo::MERCATOR_LAT_LIMIT);
        assert!((state.longitude + 160.0).abs() < 1e-9);
        state.set_zoom(100.0);
        assert_eq!(state.zoom, constants::MAX_ZOOM);
    }
}
