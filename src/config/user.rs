//! User-wide configuration.
//!
//! Location: `$XDG_CONFIG_HOME/wilayah/wilayah.toml`, falling back to the
//! platform config directory (`~/.config` on Linux).

use super::settings::SettingsLayer;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "wilayah.toml";

pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(PathBuf::from(xdg_config).join("wilayah").join(CONFIG_FILE_NAME));
    }
    dirs::config_dir().map(|dir| dir.join("wilayah").join(CONFIG_FILE_NAME))
}

/// Read one TOML layer. A missing file is `Ok(None)`.
pub fn load_layer(path: &Path) -> Result<Option<SettingsLayer>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigError::io(path.display().to_string(), err)),
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| ConfigError::parse(path.display().to_string(), e.to_string()))
}
