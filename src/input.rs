use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::constants;
use crate::geo::{latlon_to_world_pixel, world_pixel_to_latlon};
use crate::map::MapState;
use crate::overlay::DayNightOverlay;

// =============================================================================
// Resources
// =============================================================================

/// Resource to track pan/drag state.
#[derive(Resource, Default)]
pub(crate) struct DragState {
    last_position: Option<Vec2>,
}

// =============================================================================
// Plugin
// =============================================================================

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DragState>()
            .add_systems(Update, (handle_pan_drag, handle_zoom).chain())
            .add_systems(Update, (draw_graticule, draw_subsolar_marker));
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Convert mouse wheel event to zoom delta.
/// Returns positive for zoom in, negative for zoom out.
fn calculate_zoom_delta(event: &MouseWheel) -> f64 {
    match event.unit {
        MouseScrollUnit::Line => event.y as f64 * constants::ZOOM_SENSITIVITY_LINE,
        MouseScrollUnit::Pixel => event.y as f64 * constants::ZOOM_SENSITIVITY_PIXEL,
    }
}

/// New map centre after a zoom that keeps the point under the cursor fixed.
///
/// `cursor_offset` is the cursor position relative to the window centre in
/// screen pixels (y down).
pub(crate) fn zoom_to_cursor_center(
    center: (f64, f64),
    cursor_offset: Vec2,
    zoom_before: f64,
    zoom_after: f64,
) -> (f64, f64) {
    let (cx, cy) = latlon_to_world_pixel(center.0, center.1, zoom_before);
    let (dx, dy) = (cursor_offset.x as f64, cursor_offset.y as f64);

    // Geographic position under the cursor before zooming
    let (cursor_lat, cursor_lon) = world_pixel_to_latlon(cx + dx, cy + dy, zoom_before);

    // Same position at the new zoom, then step back by the cursor offset
    let (px, py) = latlon_to_world_pixel(cursor_lat, cursor_lon, zoom_after);
    world_pixel_to_latlon(px - dx, py - dy, zoom_after)
}

/// New map centre after dragging by `delta` screen pixels (y down).
pub(crate) fn pan_center(center: (f64, f64), delta: Vec2, zoom: f64) -> (f64, f64) {
    let (cx, cy) = latlon_to_world_pixel(center.0, center.1, zoom);
    world_pixel_to_latlon(cx - delta.x as f64, cy - delta.y as f64, zoom)
}

// =============================================================================
// Input Systems
// =============================================================================

pub(crate) fn handle_pan_drag(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: MessageReader<CursorMoved>,
    mut drag_state: ResMut<DragState>,
    mut map_state: ResMut<MapState>,
) {
    if !mouse_button.pressed(MouseButton::Left) {
        drag_state.last_position = None;
        cursor_moved.clear();
        return;
    }

    for event in cursor_moved.read() {
        if let Some(last) = drag_state.last_position {
            let delta = event.position - last;
            if delta != Vec2::ZERO {
                let (lat, lon) = pan_center(
                    (map_state.latitude, map_state.longitude),
                    delta,
                    map_state.zoom,
                );
                map_state.set_center(lat, lon);
            }
        }
        drag_state.last_position = Some(event.position);
    }
}

pub(crate) fn handle_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut map_state: ResMut<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    let delta: f64 = scroll_events.read().map(calculate_zoom_delta).sum();
    if delta == 0.0 {
        return;
    }

    let zoom_before = map_state.zoom;
    let zoom_after = (zoom_before + delta).clamp(constants::MIN_ZOOM, constants::MAX_ZOOM);
    if zoom_after == zoom_before {
        return;
    }

    let cursor_offset = window_query
        .single()
        .ok()
        .and_then(|w| w.cursor_position().map(|c| c - w.size() / 2.0))
        .unwrap_or(Vec2::ZERO);

    let (lat, lon) = zoom_to_cursor_center(
        (map_state.latitude, map_state.longitude),
        cursor_offset,
        zoom_before,
        zoom_after,
    );
    map_state.zoom = zoom_after;
    map_state.set_center(lat, lon);
}

// =============================================================================
// Map Drawing
// =============================================================================

/// Meridians and parallels every `GRATICULE_STEP_DEG` degrees, so the night
/// wash has something to line up against.
fn draw_graticule(
    mut gizmos: Gizmos,
    map_state: Res<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let viewport = map_state.viewport(window.size());
    let color = Color::srgba(0.5, 0.6, 0.7, 0.35);
    let step = constants::GRATICULE_STEP_DEG;
    let lat_max = crate::geo::MERCATOR_LAT_LIMIT;

    let mut lon = -180.0;
    while lon <= 180.0 {
        let top = viewport.latlon_to_world(lat_max, lon);
        let bottom = viewport.latlon_to_world(-lat_max, lon);
        gizmos.line_2d(top, bottom, color);
        lon += step;
    }

    let west_edge = viewport.latlon_to_world(0.0, -180.0).x;
    let east_edge = viewport.latlon_to_world(0.0, 180.0).x;
    let mut lat = -75.0;
    while lat <= 75.0 {
        let y = viewport.latlon_to_world(lat, 0.0).y;
        gizmos.line_2d(Vec2::new(west_edge, y), Vec2::new(east_edge, y), color);
        lat += step;
    }
}

/// Small sun marker at the subsolar point of the last render.
fn draw_subsolar_marker(
    mut gizmos: Gizmos,
    overlay: Option<Res<DayNightOverlay>>,
    map_state: Res<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    let Some(report) = overlay
        .as_ref()
        .and_then(|o| o.handle())
        .filter(|h| h.is_attached())
        .and_then(|h| h.last_render())
    else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };

    let viewport = map_state.viewport(window.size());
    let position = viewport.latlon_to_world(report.subsolar.latitude, report.subsolar.longitude);
    gizmos.circle_2d(position, constants::SUN_MARKER_RADIUS, Color::srgb(1.0, 0.85, 0.3));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_without_cursor_offset_keeps_center() {
        let (lat, lon) = zoom_to_cursor_center((37.6872, -97.3301), Vec2::ZERO, 4.0, 5.5);
        assert!((lat - 37.6872).abs() < 1e-9);
        assert!((lon + 97.3301).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let center = (10.0, 20.0);
        let offset = Vec2::new(150.0, -80.0);
        let (before_lat, before_lon) = {
            let (cx, cy) = latlon_to_world_pixel(center.0, center.1, 3.0);
            world_pixel_to_latlon(cx + 150.0, cy - 80.0, 3.0)
        };

        let new_center = zoom_to_cursor_center(center, offset, 3.0, 4.0);
        let (cx, cy) = latlon_to_world_pixel(new_center.0, new_center.1, 4.0);
        let (after_lat, after_lon) = world_pixel_to_latlon(cx + 150.0, cy - 80.0, 4.0);

        assert!((before_lat - after_lat).abs() < 1e-6);
        assert!((before_lon - after_lon).abs() < 1e-6);
    }

    #[test]
    fn test_drag_right_moves_center_west() {
        let (_, lon) = pan_center((0.0, 0.0), Vec2::new(100.0, 0.0), 2.0);
        assert!(lon < 0.0);
        let (lat, _) = pan_center((0.0, 0.0), Vec2::new(0.0, 100.0), 2.0);
        assert!(lat > 0.0);
    }
}
