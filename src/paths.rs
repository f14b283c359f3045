//! Where `config.toml` lives.
//!
//! Debug builds read and write it in the working directory so `cargo run`
//! from the repo picks up a local file. Release builds use the platform
//! config directory, falling back to the working directory when the
//! platform has none.

use std::path::PathBuf;

/// Directory name under the platform config directory.
const APP_DIR_NAME: &str = "daylight_map";

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Per-user config directory for release builds, if the platform has one.
pub fn platform_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Directory holding `config.toml`.
pub fn config_dir() -> PathBuf {
    if cfg!(debug_assertions) {
        return working_dir();
    }
    platform_config_dir().unwrap_or_else(working_dir)
}
