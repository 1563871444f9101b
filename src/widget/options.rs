//! Widget options and their declarative `data-*` attribute form.

use crate::timeline::{Period, DEFAULT_TIME_RANGES};

use std::collections::BTreeMap;
use std::time::Duration;

/// Attribute map describing a container, keyed like the markup attributes
/// (`data-api-url`, `data-period`, ...).
pub type Attributes = BTreeMap<String, String>;

pub const DEFAULT_API_URL: &str = "/api/monitor-graph/uptime";
pub const DEFAULT_HEIGHT_PX: u32 = 20;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Configuration of one timeline widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    /// Endpoint for self-fetching widgets. `None` means data is injected by an owner.
    pub api_url: Option<String>,
    pub monitor_id: Option<String>,
    pub monitor_name: Option<String>,
    pub url_edit: Option<String>,
    pub period: Period,
    pub height_px: u32,
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
    pub show_labels: bool,
    pub show_stats: bool,
    pub show_time_range: bool,
    pub show_monitor_name: bool,
    pub time_ranges: Vec<Period>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            monitor_id: None,
            monitor_name: None,
            url_edit: None,
            period: Period::default(),
            height_px: DEFAULT_HEIGHT_PX,
            auto_refresh: false,
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            show_labels: true,
            show_stats: true,
            show_time_range: true,
            show_monitor_name: true,
            time_ranges: DEFAULT_TIME_RANGES.to_vec(),
        }
    }
}

impl WidgetOptions {
    /// Options for a widget created by a batch controller.
    ///
    /// The widget never fetches on its own, hides its selector in favour of
    /// the global one and links to the monitor's edit page.
    pub fn for_batch(monitor_id: &str, monitor_name: Option<String>, period: Period, height_px: u32) -> Self {
        Self {
            api_url: None,
            monitor_id: Some(monitor_id.to_string()),
            monitor_name,
            url_edit: Some(format!("/member/monitor-item/edit/{}", monitor_id)),
            period,
            height_px,
            auto_refresh: false,
            show_labels: true,
            show_stats: true,
            show_time_range: false,
            show_monitor_name: true,
            ..Default::default()
        }
    }

    /// Parse options from container attributes.
    ///
    /// Integers fall back to their defaults when absent or malformed,
    /// `data-auto-refresh` is on only for `"true"` and the `data-show-*`
    /// flags are off only for `"false"`.
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let text = |key: &str| {
            attrs
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let shown = |key: &str| attrs.get(key).map(|v| v.trim() != "false").unwrap_or(true);

        let period = match text("data-period") {
            Some(code) => code.parse::<Period>().unwrap_or_else(|e| {
                tracing::warn!("Ignoring {}, using {}", e, Period::default());
                Period::default()
            }),
            None => Period::default(),
        };

        let height_px = text("data-height")
            .and_then(|v| leading_int::<u32>(&v))
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_HEIGHT_PX);

        let refresh_ms = text("data-refresh-interval")
            .and_then(|v| leading_int::<u64>(&v))
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);

        Self {
            api_url: Some(text("data-api-url").unwrap_or_else(|| DEFAULT_API_URL.to_string())),
            monitor_id: text("data-monitor-id"),
            monitor_name: text("data-monitor-name"),
            url_edit: text("data-url-edit"),
            period,
            height_px,
            auto_refresh: attrs.get("data-auto-refresh").map(|v| v.trim() == "true").unwrap_or(false),
            refresh_interval: Duration::from_millis(refresh_ms),
            show_labels: shown("data-show-labels"),
            show_stats: shown("data-show-stats"),
            show_time_range: shown("data-show-time-range"),
            show_monitor_name: shown("data-show-monitor-name"),
            time_ranges: text("data-time-ranges")
                .map(|v| parse_time_ranges(&v))
                .unwrap_or_else(|| DEFAULT_TIME_RANGES.to_vec()),
        }
    }

    /// Whether the edit affordance is shown.
    pub fn edit_target(&self) -> Option<&str> {
        match (&self.url_edit, &self.monitor_id) {
            (Some(url), Some(_)) => Some(url.as_str()),
            _ => None,
        }
    }
}

/// Parse the leading decimal digits of a markup number, so `"32px"` reads
/// as 32. A sign, other leading text or an overflow yields `None`.
pub fn leading_int<T: std::str::FromStr>(value: &str) -> Option<T> {
    let value = value.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// Parse a comma-separated list of period codes, skipping unknown ones.
///
/// An empty result falls back to the default ranges.
pub fn parse_time_ranges(list: &str) -> Vec<Period> {
    let mut ranges = Vec::new();
    for code in list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        match code.parse::<Period>() {
            Ok(p) if !ranges.contains(&p) => ranges.push(p),
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring time range: {}", e),
        }
    }
    if ranges.is_empty() {
        DEFAULT_TIME_RANGES.to_vec()
    } else {
        ranges
    }
}
