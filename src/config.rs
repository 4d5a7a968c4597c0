//! Layered configuration.
//!
//! Layers, lowest precedence first:
//! 1. programmed defaults
//! 2. user config (`$XDG_CONFIG_HOME/wilayah/wilayah.toml`)
//! 3. project config (`<root>/wilayah.toml`)
//! 4. environment overrides (`WILAYAH_API_BASE_URL`, `WILAYAH_PAGE_SIZE`)
//!
//! A layer that cannot be read or parsed is skipped with a warning event.

pub mod defaults;
pub mod settings;
pub mod user;

pub use settings::{SettingsLayer, WilayahSettings};
pub use user::{CONFIG_FILE_NAME, load_layer, user_config_path};

use crate::region::MAX_PAGE_SIZE;
use defaults::{DEFAULT_API_BASE_URL, DEFAULT_CACHE_TTL_SECS, DEFAULT_REQUEST_TIMEOUT_MS, default_settings};
use std::path::Path;

pub const ENV_API_BASE_URL: &str = "WILAYAH_API_BASE_URL";
pub const ENV_PAGE_SIZE: &str = "WILAYAH_PAGE_SIZE";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward the event to the `log` facade.
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "wilayah::config", "{}", self.message),
            SettingsEventKind::Warning => log::warn!(target: "wilayah::config", "{}", self.message),
        }
    }
}

#[derive(Debug)]
pub struct SettingsLoadOutcome {
    pub settings: WilayahSettings,
    pub events: Vec<SettingsEvent>,
}

/// Merge layers in order; later layers win field by field.
pub fn merge_all(layers: impl IntoIterator<Item = Option<SettingsLayer>>) -> SettingsLayer {
    layers
        .into_iter()
        .flatten()
        .fold(SettingsLayer::default(), SettingsLayer::overlay)
}

impl From<SettingsLayer> for WilayahSettings {
    fn from(layer: SettingsLayer) -> Self {
        WilayahSettings {
            api_base_url: layer
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            page_size: layer.page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            request_timeout_ms: layer.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            cache_ttl_secs: layer.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            session_path: layer.session_path,
        }
    }
}

/// Load settings from every layer.
pub fn load_settings(project_root: Option<&Path>) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let user = load_layer_with_events(user_config_path().as_deref(), "user config", &mut events);
    let project = project_root.and_then(|root| {
        load_layer_with_events(
            Some(&root.join(CONFIG_FILE_NAME)),
            "project config",
            &mut events,
        )
    });
    let env = env_overrides(&mut events);

    let merged = merge_all([Some(default_settings()), user, project, env]);
    let settings = WilayahSettings::from(merged.clone());
    if merged.page_size.is_some_and(|size| size != settings.page_size) {
        events.push(SettingsEvent::warning(format!(
            "page_size clamped to {} (allowed 1..={})",
            settings.page_size, MAX_PAGE_SIZE
        )));
    }

    SettingsLoadOutcome { settings, events }
}

fn load_layer_with_events(
    path: Option<&Path>,
    description: &str,
    events: &mut Vec<SettingsEvent>,
) -> Option<SettingsLayer> {
    let path = path?;
    match load_layer(path) {
        Ok(Some(layer)) => {
            events.push(SettingsEvent::info(format!(
                "Loaded {} from {}",
                description,
                path.display()
            )));
            Some(layer)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load {}: {}",
                description, err
            )));
            None
        }
    }
}

fn env_overrides(events: &mut Vec<SettingsEvent>) -> Option<SettingsLayer> {
    let mut layer = SettingsLayer::default();
    let mut any = false;

    if let Ok(url) = std::env::var(ENV_API_BASE_URL)
        && !url.is_empty()
    {
        layer.api_base_url = Some(url);
        any = true;
    }

    if let Ok(raw) = std::env::var(ENV_PAGE_SIZE) {
        match raw.parse::<usize>() {
            Ok(size) => {
                layer.page_size = Some(size);
                any = true;
            }
            Err(err) => events.push(SettingsEvent::warning(format!(
                "Ignoring {}={:?}: {}",
                ENV_PAGE_SIZE, raw, err
            ))),
        }
    }

    any.then_some(layer)
}
