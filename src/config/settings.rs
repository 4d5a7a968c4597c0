use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configuration layer as written in `wilayah.toml`.
///
/// Every field is optional so that a layer only overrides what it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsLayer {
    pub api_base_url: Option<String>,
    pub page_size: Option<usize>,
    pub request_timeout_ms: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub session_path: Option<PathBuf>,
}

impl SettingsLayer {
    /// Merge `primary` over `self`.
    pub fn overlay(self, primary: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            api_base_url: primary.api_base_url.or(self.api_base_url),
            page_size: primary.page_size.or(self.page_size),
            request_timeout_ms: primary.request_timeout_ms.or(self.request_timeout_ms),
            cache_ttl_secs: primary.cache_ttl_secs.or(self.cache_ttl_secs),
            session_path: primary.session_path.or(self.session_path),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WilayahSettings {
    pub api_base_url: String,
    pub page_size: usize,
    pub request_timeout_ms: u64,
    /// Zero disables the region cache.
    pub cache_ttl_secs: u64,
    pub session_path: Option<PathBuf>,
}
