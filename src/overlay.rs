//! Day/night overlay plugin.
//!
//! Hosts the refresh scheduler inside the Bevy app: the overlay is a
//! window-sized sprite on the overlay render layer whose image is rewritten
//! on every render. The sprite ignores picking so the map underneath keeps
//! receiving input.

use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::picking::Pickable;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::{PrimaryWindow, WindowResized};

use crate::config::AppConfig;
use crate::map::MapState;
use crate::mask::{OverlaySurface, RasterBuffer};
use crate::render_layers::layers_overlay;
use crate::scheduler::{OverlayHandle, OverlayRefreshScheduler, SystemClock};

/// Z-depth for the overlay sprite (above the map, below gizmos).
const OVERLAY_Z: f32 = 5.0;

/// Marker component for the overlay sprite
#[derive(Component)]
pub struct DayNightSprite;

/// Overlay state. `active` is `Some` exactly while attached.
#[derive(Resource)]
pub struct DayNightOverlay {
    scheduler: OverlayRefreshScheduler,
    active: Option<ActiveOverlay>,
}

struct ActiveOverlay {
    handle: OverlayHandle,
    image: Handle<Image>,
    sprite: Entity,
}

impl DayNightOverlay {
    pub fn new(scheduler: OverlayRefreshScheduler) -> Self {
        Self { scheduler, active: None }
    }

    pub fn is_attached(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.handle.is_attached())
    }

    pub fn handle(&self) -> Option<&OverlayHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }
}

/// Writes finished rasters into an image asset.
///
/// Borrowed for a single render; it never outlives the system call that
/// created it.
pub struct ImageSurface<'a> {
    images: &'a mut Assets<Image>,
    image: &'a Handle<Image>,
}

impl<'a> ImageSurface<'a> {
    pub fn new(images: &'a mut Assets<Image>, image: &'a Handle<Image>) -> Self {
        Self { images, image }
    }
}

impl OverlaySurface for ImageSurface<'_> {
    fn blit(&mut self, buffer: &RasterBuffer) {
        let Some(mut image) = self.images.get_mut(self.image) else {
            return;
        };
        *image = raster_to_image(buffer);
    }

    fn release(&mut self) {
        self.images.remove(self.image);
    }
}

/// Convert a raster into a nearest-sampled RGBA image so the terminator
/// keeps its hard cell edges when scaled.
pub fn raster_to_image(buffer: &RasterBuffer) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: buffer.width(),
            height: buffer.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        buffer.data().to_vec(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::nearest();
    image
}

// =============================================================================
// Plugin
// =============================================================================

pub struct DayNightPlugin;

impl Plugin for DayNightPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_overlay)
            .add_systems(
                Update,
                (
                    toggle_overlay,
                    refresh_on_viewport_change,
                    tick_overlay,
                    sync_overlay_sprite,
                )
                    .chain(),
            )
            .add_systems(Last, detach_on_exit);
    }
}

// =============================================================================
// Systems
// =============================================================================

fn init_overlay(
    mut commands: Commands,
    config: Res<AppConfig>,
    map_state: Res<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut images: ResMut<Assets<Image>>,
) {
    let scheduler = OverlayRefreshScheduler::new(
        config.overlay.refresh_policy(),
        config.overlay.mask_style(),
    );
    let mut overlay = DayNightOverlay::new(scheduler);

    if config.overlay.enabled {
        if let Ok(window) = window_query.single() {
            attach(&mut overlay, &mut commands, &mut images, &map_state, window);
        }
    } else {
        info!("Day/night overlay disabled in config");
    }
    commands.insert_resource(overlay);
}

fn attach(
    overlay: &mut DayNightOverlay,
    commands: &mut Commands,
    images: &mut Assets<Image>,
    map_state: &MapState,
    window: &Window,
) {
    let window_size = window.size();
    let image = images.add(raster_to_image(&RasterBuffer::transparent(1, 1)));
    let sprite = commands
        .spawn((
            Name::new("Day/Night Overlay"),
            DayNightSprite,
            Sprite {
                image: image.clone(),
                custom_size: Some(window_size),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, OVERLAY_Z),
            layers_overlay(),
            Pickable::IGNORE,
        ))
        .id();

    let viewport = map_state.viewport(window_size);
    let mut surface = ImageSurface::new(images, &image);
    let handle = overlay.scheduler.attach(&viewport, &mut surface, &SystemClock);

    overlay.active = Some(ActiveOverlay { handle, image, sprite });
}

fn detach(overlay: &mut DayNightOverlay, commands: &mut Commands, images: &mut Assets<Image>) {
    let Some(mut active) = overlay.active.take() else {
        return;
    };
    let mut surface = ImageSurface::new(images, &active.image);
    active.handle.detach(&mut surface);
    commands.entity(active.sprite).despawn();
}

/// N toggles the overlay on and off.
fn toggle_overlay(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut overlay: ResMut<DayNightOverlay>,
    mut images: ResMut<Assets<Image>>,
    map_state: Res<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyN) {
        return;
    }

    if overlay.is_attached() {
        detach(&mut overlay, &mut commands, &mut images);
    } else if let Ok(window) = window_query.single() {
        attach(&mut overlay, &mut commands, &mut images, &map_state, window);
    }
}

/// Re-render on pan, zoom and window resize.
fn refresh_on_viewport_change(
    mut overlay: ResMut<DayNightOverlay>,
    mut images: ResMut<Assets<Image>>,
    map_state: Res<MapState>,
    mut resized: MessageReader<WindowResized>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    let window_changed = resized.read().count() > 0;
    let map_changed = map_state.is_changed() && !map_state.is_added();
    if !window_changed && !map_changed {
        return;
    }

    let Some(active) = overlay.active.as_mut() else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };

    let viewport = map_state.viewport(window.size());
    let mut surface = ImageSurface::new(&mut images, &active.image);
    active.handle.viewport_changed(&viewport, &mut surface, &SystemClock);
}

/// Drive the periodic refresh from frame time.
fn tick_overlay(
    time: Res<Time>,
    mut overlay: ResMut<DayNightOverlay>,
    mut images: ResMut<Assets<Image>>,
    map_state: Res<MapState>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    let Some(active) = overlay.active.as_mut() else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };

    let viewport = map_state.viewport(window.size());
    let mut surface = ImageSurface::new(&mut images, &active.image);
    active
        .handle
        .advance(time.delta(), &viewport, &mut surface, &SystemClock);
}

/// Keep the sprite covering the window, centred on the camera.
fn sync_overlay_sprite(
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<&Transform, (With<Camera2d>, Without<DayNightSprite>)>,
    mut sprite_query: Query<(&mut Sprite, &mut Transform), With<DayNightSprite>>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((mut sprite, mut transform)) = sprite_query.single_mut() else {
        return;
    };

    let size = window.size();
    if sprite.custom_size != Some(size) {
        sprite.custom_size = Some(size);
    }
    if let Ok(camera) = camera_query.single() {
        transform.translation.x = camera.translation.x;
        transform.translation.y = camera.translation.y;
    }
}

fn detach_on_exit(
    mut exit: MessageReader<AppExit>,
    mut commands: Commands,
    overlay: Option<ResMut<DayNightOverlay>>,
    mut images: ResMut<Assets<Image>>,
) {
    if exit.read().count() == 0 {
        return;
    }
    if let Some(mut overlay) = overlay {
        detach(&mut overlay, &mut commands, &mut images);
    }
}
