use bevy::prelude::*;

use daylight_map::{ConfigPlugin, DayNightPlugin, InputPlugin, MapPlugin};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Daylight Map - Day/Night Terminator".to_string(),
                    resolution: (1280, 720).into(),
                    ..default()
                }),
                ..default()
            }),
            ConfigPlugin,
            MapPlugin,
            InputPlugin,
            DayNightPlugin,
        ))
        .insert_resource(ClearColor(Color::srgb(0.08, 0.12, 0.18)))
        .run();
}
