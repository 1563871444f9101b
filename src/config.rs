//! Configuration module for uptrail.
//!
//! Server settings come from environment variables with sensible defaults.
//! The dashboard layout (which containers exist and how they load) comes
//! from an optional JSON file.

use crate::timeline::Locale;
use crate::widget::Attributes;

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Origin that relative API URLs resolve against
    pub upstream_url: String,
    /// Optional dashboard layout file
    pub dashboard_path: Option<String>,
    /// Locale of the timeline labels (default: vi)
    pub locale: Locale,
    /// Per-request timeout for the uptime service
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            upstream_url: "http://127.0.0.1:8000".to_string(),
            dashboard_path: None,
            locale: Locale::default(),
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `UPTRAIL_HTTP_PORT`: HTTP port (default: 8080)
    /// - `UPTRAIL_UPSTREAM_URL`: uptime service origin (default: "http://127.0.0.1:8000")
    /// - `UPTRAIL_DASHBOARD`: dashboard JSON file (default: built-in dashboard)
    /// - `UPTRAIL_LOCALE`: "vi" or "en" (default: "vi")
    /// - `UPTRAIL_REQUEST_TIMEOUT_MS`: request timeout (default: 10000)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Malformed values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(port) = lookup("UPTRAIL_HTTP_PORT").and_then(|v| v.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(url) = lookup("UPTRAIL_UPSTREAM_URL").filter(|v| !v.trim().is_empty()) {
            cfg.upstream_url = url;
        }

        cfg.dashboard_path = lookup("UPTRAIL_DASHBOARD").filter(|v| !v.trim().is_empty());

        if let Some(locale) = lookup("UPTRAIL_LOCALE") {
            match locale.parse::<Locale>() {
                Ok(locale) => cfg.locale = locale,
                Err(e) => tracing::warn!("{}, using {:?}", e, cfg.locale),
            }
        }

        if let Some(ms) = lookup("UPTRAIL_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            cfg.request_timeout = Duration::from_millis(ms);
        }

        cfg
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid dashboard file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("container without id")]
    MissingId,
    #[error("duplicate container id: {0}")]
    DuplicateId(String),
}

pub const DEFAULT_BATCH_CONTAINER: &str = "monitor-timelines-container";

/// One container on the dashboard: its id, initial width and `data-*`
/// attributes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContainerConfig {
    pub id: String,
    /// Measured width in pixels; 0 means not laid out yet.
    #[serde(default)]
    pub width: i64,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl ContainerConfig {
    /// Attribute values as markup strings (`24` and `"24"` read the same).
    pub fn attributes(&self) -> Attributes {
        self.attributes
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect()
    }
}

/// Which containers make up the dashboard.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default)]
    pub batches: Vec<ContainerConfig>,
    #[serde(default)]
    pub widgets: Vec<ContainerConfig>,
}

impl Default for DashboardConfig {
    /// A single batch container fed by the monitor list endpoint.
    fn default() -> Self {
        let attributes = [
            ("data-api-url", "/api/monitor-graph/uptime-list"),
            ("data-period", "24h"),
            ("data-height", "20"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

        Self {
            batches: vec![ContainerConfig {
                id: DEFAULT_BATCH_CONTAINER.to_string(),
                width: 0,
                attributes,
            }],
            widgets: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Load the dashboard from `path`, or the built-in one when `path` is `None`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        tracing::info!("Loading dashboard from {}", path);
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Container ids must be present and unique across batches and widgets.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for container in self.batches.iter().chain(&self.widgets) {
            let id = container.id.trim();
            if id.is_empty() {
                return Err(ConfigError::MissingId);
            }
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateId(id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.upstream_url, "http://127.0.0.1:8000");
        assert!(cfg.dashboard_path.is_none());
        assert_eq!(cfg.locale, Locale::Vi);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("UPTRAIL_HTTP_PORT", "9090"),
            ("UPTRAIL_UPSTREAM_URL", "https://status.example.com"),
            ("UPTRAIL_DASHBOARD", "/etc/uptrail.json"),
            ("UPTRAIL_LOCALE", "en"),
            ("UPTRAIL_REQUEST_TIMEOUT_MS", "2500"),
        ]
        .into_iter()
        .collect();
        let cfg = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.http_port, 9090);
        assert_eq!(cfg.upstream_url, "https://status.example.com");
        assert_eq!(cfg.dashboard_path.as_deref(), Some("/etc/uptrail.json"));
        assert_eq!(cfg.locale, Locale::En);
        assert_eq!(cfg.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_config_malformed_values_keep_defaults() {
        let cfg = ServerConfig::from_lookup(|k| match k {
            "UPTRAIL_HTTP_PORT" => Some("http".to_string()),
            "UPTRAIL_LOCALE" => Some("fr".to_string()),
            "UPTRAIL_REQUEST_TIMEOUT_MS" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.locale, Locale::Vi);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_default_dashboard() {
        let dashboard = assert_ok!(DashboardConfig::load(None));
        assert_eq!(dashboard.batches.len(), 1);
        assert!(dashboard.widgets.is_empty());
        let attrs = dashboard.batches[0].attributes();
        assert_eq!(dashboard.batches[0].id, DEFAULT_BATCH_CONTAINER);
        assert_eq!(attrs["data-api-url"], "/api/monitor-graph/uptime-list");
        assert_eq!(attrs["data-period"], "24h");
        assert_eq!(attrs["data-height"], "20");
    }

    #[test]
    fn test_dashboard_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "widgets": [
                    {{"id": "site", "width": 640, "data-monitor-id": 7, "data-auto-refresh": "true"}}
                ]
            }}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let dashboard = assert_ok!(DashboardConfig::load(Some(&path)));
        assert!(dashboard.batches.is_empty());
        let widget = &dashboard.widgets[0];
        assert_eq!(widget.id, "site");
        assert_eq!(widget.width, 640);
        let attrs = widget.attributes();
        assert_eq!(attrs["data-monitor-id"], "7");
        assert_eq!(attrs["data-auto-refresh"], "true");
        assert!(!attrs.contains_key("id"));
    }

    #[test]
    fn test_dashboard_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            DashboardConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        assert!(matches!(
            DashboardConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{"widgets": [{"id": " "}]}"#),
            Err(ConfigError::MissingId)
        ));
        let err = assert_err!(DashboardConfig::from_json(
            r#"{"batches": [{"id": "a"}], "widgets": [{"id": "a"}]}"#
        ));
        assert_eq!(err.to_string(), "duplicate container id: a");
    }
}
