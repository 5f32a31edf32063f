// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawSettings, Settings, SettingsOverrides};
use crate::errors::Result;

/// Load a TOML settings file and return the raw, unvalidated `RawSettings`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawSettings = toml::from_str(&contents)?;

    Ok(raw)
}

/// Build the validated `Settings` for this process.
///
/// - Reads the optional TOML file.
/// - Layers CLI flags / environment variables on top.
/// - Applies built-in defaults and validates (see `validate.rs`).
pub fn load_settings(config: Option<&Path>, overrides: SettingsOverrides) -> Result<Settings> {
    let raw = match config {
        Some(path) => load_from_path(path)?,
        None => RawSettings::default(),
    };
    Settings::try_from(raw.apply(overrides))
}
