//! Programmed defaults, the lowest configuration layer.

use super::settings::SettingsLayer;
use crate::region::MAX_PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub fn default_settings() -> SettingsLayer {
    SettingsLayer {
        api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
        page_size: Some(MAX_PAGE_SIZE),
        request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
        cache_ttl_secs: Some(DEFAULT_CACHE_TTL_SECS),
        session_path: None,
    }
}
