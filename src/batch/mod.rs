//! Batch mode: many monitors rendered from one fetch.
//!
//! A [`BatchController`] owns one batch container. Every load replaces the
//! container's whole content: either one widget per monitor, a "no monitors"
//! placeholder or an error placeholder. Period changes reach every batch
//! container through the [`PeriodBus`].

mod bus;
mod runner;

pub use bus::*;
pub use runner::*;

use crate::source::{FetchError, UptimeSource};
use crate::surface::{Content, Page, Placeholder, Surface};
use crate::timeline::{BatchPayload, LabelFormatter, Period};
use crate::widget::{leading_int, Attributes, TimelineWidget, WidgetOptions, DEFAULT_HEIGHT_PX};

use std::collections::HashSet;

pub const DEFAULT_BATCH_URL: &str = "/api/monitor-graph/uptime-list";

pub const LOADING_MESSAGE: &str = "Loading monitor data...";
pub const NO_MONITORS_MESSAGE: &str = "No monitors";

/// Where and how a batch container loads.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub source_url: String,
    pub period: Period,
    pub bar_height: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_BATCH_URL.to_string(),
            period: Period::default(),
            bar_height: DEFAULT_HEIGHT_PX,
        }
    }
}

impl BatchConfig {
    /// Read `data-api-url`, `data-period` and `data-height`.
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let defaults = Self::default();
        let get = |key: &str| attrs.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        Self {
            source_url: get("data-api-url")
                .map(str::to_string)
                .unwrap_or(defaults.source_url),
            period: get("data-period")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.period),
            bar_height: get("data-height")
                .and_then(leading_int::<u32>)
                .filter(|h| *h > 0)
                .unwrap_or(defaults.bar_height),
        }
    }
}

/// A batch fetch the controller wants issued.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub epoch: u64,
    pub source_url: String,
    pub period: Period,
}

impl BatchRequest {
    pub async fn fetch(&self, source: &dyn UptimeSource) -> Result<BatchPayload, FetchError> {
        source.fetch_batch(&self.source_url, self.period).await
    }
}

/// Owns one batch container and the widgets inside it.
#[derive(Debug)]
pub struct BatchController {
    page: Page,
    surface: Surface,
    config: BatchConfig,
    formatter: LabelFormatter,
    widgets: Vec<TimelineWidget>,
    epoch: u64,
}

impl BatchController {
    /// Create a controller for container `id`.
    ///
    /// Returns `None` (after logging) when the container is not on the page.
    pub fn attach(page: &Page, id: &str, config: BatchConfig, formatter: LabelFormatter) -> Option<Self> {
        let Some(surface) = page.surface(id) else {
            tracing::error!("Batch container not found: {}", id);
            return None;
        };
        Some(Self {
            page: page.clone(),
            surface,
            config,
            formatter,
            widgets: Vec::new(),
            epoch: 0,
        })
    }

    pub fn id(&self) -> &str {
        self.surface.id()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn widgets(&self) -> &[TimelineWidget] {
        &self.widgets
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_attached()
    }

    /// Show the loading message used before the first response.
    pub fn show_loading(&self) {
        self.surface
            .set_content(Content::Placeholder(Placeholder::loading(LOADING_MESSAGE)));
    }

    /// Start a load for `period` from the configured source.
    pub fn begin_load(&mut self, period: Period) -> BatchRequest {
        let source_url = self.config.source_url.clone();
        let bar_height = self.config.bar_height;
        self.load_batch(&source_url, period, bar_height)
    }

    /// Start loading every monitor under `source_url` for `period`, with bars
    /// `bar_height` pixels tall.
    ///
    /// The caller fetches the returned request and hands the result to
    /// [`BatchController::apply`], which replaces the container's content.
    pub fn load_batch(&mut self, source_url: &str, period: Period, bar_height: u32) -> BatchRequest {
        self.epoch += 1;
        self.config.source_url = source_url.to_string();
        self.config.bar_height = bar_height;
        self.config.period = period;
        tracing::info!(
            "Batch {}: loading monitors from {} (period {})",
            self.id(),
            self.config.source_url,
            period
        );
        BatchRequest {
            epoch: self.epoch,
            source_url: self.config.source_url.clone(),
            period,
        }
    }

    /// Apply a batch response. Returns `false` for a superseded request.
    pub fn apply(&mut self, epoch: u64, result: Result<BatchPayload, FetchError>) -> bool {
        if epoch != self.epoch {
            tracing::debug!("Batch {}: dropping stale response (epoch {})", self.id(), epoch);
            return false;
        }

        // Prior widgets never survive a load, whatever its outcome.
        self.discard_widgets();

        let monitors = match result {
            Ok(payload) => payload.into_monitors(),
            Err(e) => {
                tracing::error!("Batch {}: loading failed: {}", self.id(), e);
                self.surface.set_content(Content::Placeholder(Placeholder::error(format!(
                    "Error loading data: {}",
                    e
                ))));
                return true;
            }
        };

        let Some(monitors) = monitors else {
            self.surface
                .set_content(Content::Placeholder(Placeholder::info(NO_MONITORS_MESSAGE)));
            return true;
        };

        tracing::info!("Batch {}: loaded {} monitors", self.id(), monitors.len());

        let width = self.surface.width();
        let mut used = HashSet::new();
        let mut child_ids = Vec::with_capacity(monitors.len());

        for (index, monitor) in monitors.iter().enumerate() {
            let monitor_id = monitor.id();
            let mut child_id = format!("{}-monitor-timeline-{}", self.id(), monitor_id);
            if !used.insert(child_id.clone()) {
                tracing::warn!("Batch {}: duplicate monitor {}", self.id(), monitor_id);
                child_id = format!("{}-{}", child_id, index);
                used.insert(child_id.clone());
            }

            self.page.attach(&child_id, width);
            let options = WidgetOptions::for_batch(
                &monitor_id,
                monitor.monitor_name.clone(),
                self.config.period,
                self.config.bar_height,
            );
            let Some(mut widget) = TimelineWidget::attach(&self.page, &child_id, options, self.formatter)
            else {
                continue;
            };

            widget.inject(monitor.series());
            widget.render();
            widget.render_timeline();

            child_ids.push(child_id);
            self.widgets.push(widget);
        }

        self.surface.set_content(Content::Children(child_ids));
        tracing::info!("Batch {}: {} widgets created", self.id(), self.widgets.len());
        true
    }

    /// Record a new container width and re-bucket every child widget.
    pub fn resize(&mut self, width_px: i64) {
        self.surface.set_width(width_px);
        for widget in &mut self.widgets {
            widget.resize(width_px);
        }
    }

    /// Remove every child widget and its container.
    fn discard_widgets(&mut self) {
        for mut widget in self.widgets.drain(..) {
            widget.destroy();
            self.page.detach(widget.id());
        }
        if let Content::Children(ids) = self.surface.content() {
            for id in ids {
                self.page.detach(&id);
            }
        }
    }

    /// Drop all widgets and clear the container.
    pub fn destroy(&mut self) {
        self.discard_widgets();
        self.surface.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedSource;
    use crate::surface::Strip;
    use crate::timeline::Locale;
    use chrono::FixedOffset;
    use serde_json::json;

    fn formatter() -> LabelFormatter {
        LabelFormatter::new(Locale::En, FixedOffset::east_opt(0).unwrap())
    }

    fn controller(page: &Page) -> BatchController {
        page.mount("batch", 600);
        BatchController::attach(page, "batch", BatchConfig::default(), formatter()).unwrap()
    }

    fn payload(ids: &[u64]) -> BatchPayload {
        let monitors: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "monitor_id": id,
                    "monitor_name": format!("Monitor {}", id),
                    "chart_data": {
                        "labels": ["2024-10-19 10:00:00", "2024-10-19 10:01:00", "2024-10-19 10:02:00"],
                        "status": [1, 0, 1]
                    },
                    "stats": {"uptime_percentage": 66.67, "total_checks": 3}
                })
            })
            .collect();
        serde_json::from_value(json!({"success": true, "monitors": monitors})).unwrap()
    }

    /// Fetch and apply one batch load, returning the number of widgets.
    async fn load(
        batch: &mut BatchController,
        source: &ScriptedSource,
        source_url: &str,
        period: Period,
        bar_height: u32,
    ) -> usize {
        let request = batch.load_batch(source_url, period, bar_height);
        let result = request.fetch(source).await;
        batch.apply(request.epoch, result);
        batch.widgets().len()
    }

    fn placeholder(page: &Page) -> Placeholder {
        match page.surface("batch").unwrap().content() {
            Content::Placeholder(p) => p,
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_config_from_attributes() {
        let attrs: Attributes = [
            ("data-api-url", "/list"),
            ("data-period", "30d"),
            ("data-height", "abc"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let cfg = BatchConfig::from_attributes(&attrs);
        assert_eq!(cfg.source_url, "/list");
        assert_eq!(cfg.period, Period::ThirtyDays);
        assert_eq!(cfg.bar_height, 20);

        assert_eq!(BatchConfig::from_attributes(&Attributes::new()), BatchConfig::default());

        let attrs: Attributes = [("data-height".to_string(), "32px".to_string())].into();
        assert_eq!(BatchConfig::from_attributes(&attrs).bar_height, 32);
    }

    #[test]
    fn test_attach_missing_container() {
        let page = Page::new();
        assert!(BatchController::attach(&page, "none", BatchConfig::default(), formatter()).is_none());
    }

    #[tokio::test]
    async fn test_load_creates_one_widget_per_monitor() {
        let page = Page::new();
        let source = ScriptedSource::default();
        source.push_batch(Ok(payload(&[1, 2, 3])));

        let mut batch = controller(&page);
        let created = load(&mut batch, &source, "/api/monitor-graph/uptime-list", Period::SixHours, 24)
            .await;
        assert_eq!(created, 3);

        assert_eq!(
            page.surface("batch").unwrap().content(),
            Content::Children(vec![
                "batch-monitor-timeline-1".to_string(),
                "batch-monitor-timeline-2".to_string(),
                "batch-monitor-timeline-3".to_string(),
            ])
        );

        for widget in batch.widgets() {
            assert!(!widget.owns_source());
            assert_eq!(widget.options().period, Period::SixHours);
            assert_eq!(widget.options().height_px, 24);
            assert!(!widget.options().show_time_range);
        }

        match page.surface("batch-monitor-timeline-2").unwrap().content() {
            Content::Widget(view) => {
                assert!(matches!(view.strip, Strip::Bars { ref bars, .. } if bars.len() == 3));
                assert_eq!(view.name.unwrap().name, "Monitor 2");
                assert!(view.selector.is_none());
                assert_eq!(
                    view.listeners.edit_click.as_deref(),
                    Some("/member/monitor-item/edit/2")
                );
            }
            other => panic!("unexpected content {:?}", other),
        }

        // Widgets never fetched on their own
        assert_eq!(source.request_count(), 1);
        assert_eq!(source.requests.lock().unwrap()[0].2, Period::SixHours);
    }

    #[tokio::test]
    async fn test_empty_monitor_list_renders_placeholder() {
        let page = Page::new();
        let source = ScriptedSource::default();
        source.push_batch(Ok(serde_json::from_value(json!({"success": true, "monitors": []})).unwrap()));

        let mut batch = controller(&page);
        let created = load(&mut batch, &source, DEFAULT_BATCH_URL, Period::OneHour, 20).await;
        assert_eq!(created, 0);
        assert_eq!(placeholder(&page), Placeholder::info(NO_MONITORS_MESSAGE));
    }

    #[tokio::test]
    async fn test_failure_discards_previous_widgets() {
        let page = Page::new();
        let source = ScriptedSource::default();
        source.push_batch(Ok(payload(&[1, 2])));
        source.push_batch(Err(FetchError::Transport("HTTP 502".to_string())));

        let mut batch = controller(&page);
        assert_eq!(load(&mut batch, &source, DEFAULT_BATCH_URL, Period::OneHour, 20).await, 2);
        assert!(page.contains("batch-monitor-timeline-1"));

        assert_eq!(load(&mut batch, &source, DEFAULT_BATCH_URL, Period::SevenDays, 20).await, 0);
        assert!(!page.contains("batch-monitor-timeline-1"));
        assert!(!page.contains("batch-monitor-timeline-2"));
        assert_eq!(placeholder(&page), Placeholder::error("Error loading data: HTTP 502"));
    }

    #[tokio::test]
    async fn test_reload_replaces_widget_set() {
        let page = Page::new();
        let source = ScriptedSource::default();
        source.push_batch(Ok(payload(&[1, 2])));
        source.push_batch(Ok(payload(&[3])));

        let mut batch = controller(&page);
        load(&mut batch, &source, DEFAULT_BATCH_URL, Period::OneHour, 20).await;
        load(&mut batch, &source, DEFAULT_BATCH_URL, Period::OneHour, 20).await;

        assert_eq!(batch.widgets().len(), 1);
        assert!(!page.contains("batch-monitor-timeline-1"));
        assert!(page.contains("batch-monitor-timeline-3"));
    }

    #[test]
    fn test_duplicate_monitor_ids_get_distinct_containers() {
        let page = Page::new();
        let mut batch = controller(&page);
        let request = batch.begin_load(Period::OneHour);
        batch.apply(request.epoch, Ok(payload(&[5, 5])));
        assert_eq!(
            page.surface("batch").unwrap().content(),
            Content::Children(vec![
                "batch-monitor-timeline-5".to_string(),
                "batch-monitor-timeline-5-1".to_string(),
            ])
        );
    }

    #[test]
    fn test_stale_batch_response_dropped() {
        let page = Page::new();
        let mut batch = controller(&page);
        let old = batch.begin_load(Period::TwentyFourHours);
        let new = batch.begin_load(Period::SevenDays);

        assert!(batch.apply(new.epoch, Ok(payload(&[1]))));
        assert!(!batch.apply(old.epoch, Ok(payload(&[1, 2, 3]))));
        assert_eq!(batch.widgets().len(), 1);
        assert_eq!(batch.widgets()[0].options().period, Period::SevenDays);
    }

    #[test]
    fn test_resize_propagates_to_children() {
        let page = Page::new();
        let mut batch = controller(&page);
        let request = batch.begin_load(Period::OneHour);
        batch.apply(request.epoch, Ok(payload(&[1])));

        batch.resize(3);
        match page.surface("batch-monitor-timeline-1").unwrap().content() {
            Content::Widget(view) => {
                assert!(matches!(view.strip, Strip::Bars { ref bars, .. } if bars.len() == 1))
            }
            other => panic!("unexpected content {:?}", other),
        }
    }
}
