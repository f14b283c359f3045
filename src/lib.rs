//! Day/night terminator overlay for a slippy map.
//!
//! The core (`solar`, `illumination`, `mask`, `scheduler`) knows nothing
//! about Bevy windows or assets; the host side (`map`, `overlay`, `input`)
//! plugs it into a 2D map view.

pub mod config;
pub mod geo;
pub mod illumination;
pub mod input;
pub mod map;
pub mod mask;
pub mod overlay;
pub mod paths;
pub mod render_layers;
pub mod scheduler;
pub mod solar;

#[cfg(test)]
mod testing;

// =============================================================================
// Constants - All magic numbers centralized here
// =============================================================================

pub mod constants {
    // Default map centre and zoom (whole Atlantic, both terminator edges visible)
    pub const DEFAULT_LATITUDE: f64 = 20.0;
    pub const DEFAULT_LONGITUDE: f64 = 0.0;
    pub const DEFAULT_ZOOM: f64 = 2.0;

    // Continuous zoom bounds
    pub const MIN_ZOOM: f64 = 0.0;
    pub const MAX_ZOOM: f64 = 12.0;

    // Zoom sensitivity
    pub const ZOOM_SENSITIVITY_LINE: f64 = 0.25; // Mouse wheel
    pub const ZOOM_SENSITIVITY_PIXEL: f64 = 0.005; // Trackpad

    // Map decorations
    pub const GRATICULE_STEP_DEG: f64 = 15.0;
    pub const SUN_MARKER_RADIUS: f32 = 6.0;
}

pub use config::{AppConfig, ConfigPlugin};
pub use input::InputPlugin;
pub use map::{MapPlugin, MapState};
pub use overlay::{DayNightOverlay, DayNightPlugin};
