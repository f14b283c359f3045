use bevy::camera::visibility::RenderLayers;

/// Centralized render layer assignments.
/// Each visual category gets its own layer so the map camera can subscribe
/// to exactly the layers it draws.
///
/// Gizmos (graticule, sun marker) stay on layer 0, the default for the
/// gizmo config group.
pub struct RenderCategory;

impl RenderCategory {
    pub const DEFAULT: usize = 0;      // Gizmos
    pub const OVERLAYS_2D: usize = 4;  // Day/night tint
}

/// Layers the Map Camera (Camera2d) subscribes to.
pub fn layers_2d_map() -> RenderLayers {
    RenderLayers::from_layers(&[
        RenderCategory::DEFAULT,
        RenderCategory::OVERLAYS_2D,
    ])
}

/// Layers for the day/night overlay sprite.
pub fn layers_overlay() -> RenderLayers {
    RenderLayers::layer(RenderCategory::OVERLAYS_2D)
}
