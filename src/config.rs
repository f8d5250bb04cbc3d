//! Dashboard configuration.
//!
//! Native builds read overrides from the environment. Web builds persist the
//! configuration to localStorage so it survives page reloads.

use crate::map::{BaseStyle, CameraView};
use geo_types::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_URL: &str = "ENVMON_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "ENVMON_TIMEOUT_SECS";
pub const ENV_BASE_STYLE: &str = "ENVMON_BASE_STYLE";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the analysis service.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// Default camera center as (longitude, latitude).
    pub default_center: (f64, f64),
    pub default_zoom: f64,
    pub base_style: BaseStyle,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000".to_string(),
            request_timeout_secs: 300,
            health_timeout_secs: 5,
            default_center: (125.1275, 8.1569),
            default_zoom: 7.0,
            base_style: BaseStyle::Satellite,
        }
    }
}

impl DashboardConfig {
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "envmon_dashboard_config";

    /// Camera view the dashboard starts at and resets to.
    pub fn home_view(&self) -> CameraView {
        CameraView::new(
            Coord {
                x: self.default_center.0,
                y: self.default_center.1,
            },
            self.default_zoom,
        )
    }

    pub fn set_api_base_url(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: ENV_API_URL,
                value: url.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }
        self.api_base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn set_request_timeout(&mut self, value: &str) -> Result<(), ConfigError> {
        match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => {
                self.request_timeout_secs = secs;
                Ok(())
            }
            Ok(_) => Err(ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: value.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            Err(e) => Err(ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: value.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn set_base_style(&mut self, key: &str) -> Result<(), ConfigError> {
        let style = BaseStyle::from_key(key.trim()).ok_or_else(|| ConfigError::InvalidValue {
            key: ENV_BASE_STYLE,
            value: key.to_string(),
            reason: "unknown base style".to_string(),
        })?;
        self.base_style = style;
        Ok(())
    }

    /// Replaces stored values the setters would reject with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let url = self.api_base_url.clone();
        if let Err(e) = self.set_api_base_url(&url) {
            log::warn!("{}", e);
            self.api_base_url = defaults.api_base_url;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
        if self.health_timeout_secs == 0 {
            self.health_timeout_secs = defaults.health_timeout_secs;
        }
        self
    }

    /// Applies overrides from a variable lookup. Bad values are logged and skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            if let Err(e) = self.set_api_base_url(&url) {
                log::warn!("{}", e);
            }
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            if let Err(e) = self.set_request_timeout(&timeout) {
                log::warn!("{}", e);
            }
        }
        if let Some(style) = lookup(ENV_BASE_STYLE) {
            if let Err(e) = self.set_base_style(&style) {
                log::warn!("{}", e);
            }
        }
    }

    /// Defaults with environment overrides.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        log::info!("Analysis service at {}", config.api_base_url);
        config
    }

    /// Nothing to persist natively; the environment is the source of truth.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}

    /// Load configuration from localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return Self::default(),
        };

        let storage = match window.local_storage() {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        let json = match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        match serde_json::from_str::<Self>(&json) {
            Ok(config) => {
                log::info!("Loaded dashboard config from localStorage");
                config.sanitized()
            }
            Err(e) => {
                log::warn!("Failed to parse dashboard config: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return,
        };

        let storage = match window.local_storage() {
            Ok(Some(s)) => s,
            _ => return,
        };

        let json = match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to serialize dashboard config: {}", e);
                return;
            }
        };

        if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
            log::warn!("Failed to save dashboard config: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:4000");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.health_timeout_secs, 5);
        assert_eq!(config.base_style, BaseStyle::Satellite);
        let home = config.home_view();
        assert_eq!(home.center, Coord { x: 125.1275, y: 8.1569 });
        assert_eq!(home.zoom, 7.0);
    }

    #[test]
    fn test_overrides_apply_and_bad_values_fall_back() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://analysis.example.org/"),
            (ENV_TIMEOUT_SECS, "zero"),
            (ENV_BASE_STYLE, "streets"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://analysis.example.org");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.base_style, BaseStyle::Streets);
    }

    #[test]
    fn test_stored_values_are_sanitized() {
        let stored: DashboardConfig = serde_json::from_str(
            r#"{"api_base_url": "localhost:4000", "request_timeout_secs": 0,
                "base_style": "topo"}"#,
        )
        .unwrap();
        let config = stored.sanitized();

        assert_eq!(config.api_base_url, "http://localhost:4000");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.base_style, BaseStyle::Topographic);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"api_base_url": "http://10.0.0.2:4000"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.2:4000");
        assert_eq!(config.default_zoom, 7.0);
    }
}
