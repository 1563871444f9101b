//! The timeline widget state machine.

use super::WidgetOptions;
use crate::source::{FetchError, UptimeSource};
use crate::surface::{
    BarView, Content, LabelRow, Listeners, NameSection, Page, Selector, StatsView, Strip, Surface,
    WidgetView,
};
use crate::timeline::{aggregate, bar_width, effective_width, LabelFormatter, Period, Series};

use chrono::{DateTime, Utc};

/// Lifecycle of a widget.
///
/// `Populated` and `Errored` both go back to `Loading` on reload, period
/// change or refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Uninitialized,
    Rendered,
    Loading,
    Populated,
    Errored,
}

/// A fetch the widget wants issued.
///
/// The `epoch` identifies the request; a response carrying an older epoch
/// than the widget's current one is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub epoch: u64,
    pub api_url: String,
    pub monitor_id: Option<String>,
    pub period: Period,
}

impl LoadRequest {
    pub async fn fetch(&self, source: &dyn UptimeSource) -> Result<Series, FetchError> {
        source
            .fetch_series(&self.api_url, self.monitor_id.as_deref(), self.period)
            .await
    }
}

/// One monitor's timeline, drawn into a container it owns.
#[derive(Debug)]
pub struct TimelineWidget {
    surface: Surface,
    options: WidgetOptions,
    formatter: LabelFormatter,
    state: WidgetState,
    series: Option<Series>,
    epoch: u64,
}

impl TimelineWidget {
    /// Create a widget for container `id`.
    ///
    /// Returns `None` (after logging) when the container is not on the page.
    pub fn attach(page: &Page, id: &str, options: WidgetOptions, formatter: LabelFormatter) -> Option<Self> {
        let Some(surface) = page.surface(id) else {
            tracing::error!("Container not found: {}", id);
            return None;
        };
        Some(Self {
            surface,
            options,
            formatter,
            state: WidgetState::Uninitialized,
            series: None,
            epoch: 0,
        })
    }

    pub fn id(&self) -> &str {
        self.surface.id()
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn series(&self) -> Option<&Series> {
        self.series.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_attached()
    }

    /// Whether the widget fetches its own data.
    pub fn owns_source(&self) -> bool {
        self.options.api_url.is_some()
    }

    /// Build the static chrome and reset the strip to its loading state.
    pub fn render(&mut self) {
        let opts = &self.options;

        let name = match (&opts.monitor_name, opts.show_monitor_name) {
            (Some(name), true) => Some(NameSection {
                name: name.clone(),
                edit_href: opts.edit_target().map(str::to_string),
            }),
            _ => None,
        };

        let selector = opts.show_time_range.then(|| Selector {
            options: opts.time_ranges.clone(),
            selected: opts.period,
        });

        let listeners = Listeners {
            period_change: selector.is_some(),
            edit_click: opts.edit_target().map(str::to_string),
        };

        let view = WidgetView {
            name,
            selector,
            stats: opts.show_stats.then_some(None),
            height_px: opts.height_px,
            strip: Strip::Loading,
            labels: opts.show_labels.then_some(None),
            listeners,
        };

        self.surface.set_content(Content::Widget(view));
        self.state = WidgetState::Rendered;
    }

    /// Enter `Loading` and describe the fetch to issue.
    ///
    /// Widgets fed by an owner have nothing to fetch and stay where they are.
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        let api_url = self.options.api_url.clone()?;
        self.epoch += 1;
        self.state = WidgetState::Loading;
        Some(LoadRequest {
            epoch: self.epoch,
            api_url,
            monitor_id: self.options.monitor_id.clone(),
            period: self.options.period,
        })
    }

    /// Apply the outcome of a fetch started by [`begin_load`](Self::begin_load).
    ///
    /// Returns `false` when the response belongs to a superseded request.
    pub fn finish_load(&mut self, epoch: u64, result: Result<Series, FetchError>) -> bool {
        if epoch != self.epoch {
            tracing::debug!(
                "Widget {}: dropping stale response (epoch {} < {})",
                self.id(),
                epoch,
                self.epoch
            );
            return false;
        }

        match result {
            Ok(series) => {
                self.inject(series);
                self.render_timeline();
            }
            Err(e) => {
                tracing::error!("Widget {}: error loading data: {}", self.id(), e);
                self.show_error(&e.display_message());
            }
        }
        true
    }

    /// Fetch and draw in one step.
    pub async fn load(&mut self, source: &dyn UptimeSource) {
        if let Some(request) = self.begin_load() {
            let result = request.fetch(source).await;
            self.finish_load(request.epoch, result);
        }
    }

    /// Replace the current series wholesale.
    pub fn inject(&mut self, series: Series) {
        self.series = Some(series);
    }

    pub fn render_timeline(&mut self) {
        self.render_timeline_at(Utc::now());
    }

    /// Draw bars, stats and labels from the current series.
    ///
    /// `now` decides which labels count as "today".
    pub fn render_timeline_at(&mut self, now: DateTime<Utc>) {
        let Some(series) = self.series.as_ref().filter(|s| !s.is_empty()) else {
            self.show_error(&FetchError::EmptyData.display_message());
            return;
        };

        let width = effective_width(self.surface.width());
        let buckets = aggregate(&series.samples, width);
        let bar_width_px = bar_width(buckets.len(), width);

        tracing::debug!(
            "Widget {}: {} points -> {} bars of {}px on {}px",
            self.surface.id(),
            series.len(),
            buckets.len(),
            bar_width_px,
            width
        );

        let bars = buckets
            .iter()
            .map(|b| BarView {
                status: b.dominant_status,
                tooltip: b.tooltip(),
            })
            .collect();

        let summary = series.summary.unwrap_or_default();
        let stats = StatsView {
            uptime_percentage: summary.uptime_percentage,
            downtime_percentage: summary.downtime_percentage(),
            total_checks: summary.total_checks,
        };

        let labels = series.anchors().map(|(first, middle, last)| LabelRow {
            start: self.formatter.format_label(&first.timestamp, &now),
            middle: self.formatter.format_label(&middle.timestamp, &now),
            end: self.formatter.format_label(&last.timestamp, &now),
        });

        let show_stats = self.options.show_stats;
        let show_labels = self.options.show_labels;
        let drawn = self.surface.update_view(|view| {
            if show_stats {
                view.stats = Some(Some(stats));
            }
            view.strip = Strip::Bars { bar_width_px, bars };
            if show_labels {
                view.labels = Some(labels);
            }
        });

        if drawn {
            self.state = WidgetState::Populated;
        } else {
            tracing::warn!("Widget {}: timeline drawn before render", self.surface.id());
        }
    }

    /// Replace the bar strip with a message.
    pub fn show_error(&mut self, message: &str) {
        self.surface.update_view(|view| {
            view.strip = Strip::Error(message.to_string());
        });
        self.state = WidgetState::Errored;
    }

    /// Switch to another period and reload.
    ///
    /// Only widgets that fetch for themselves react.
    pub fn set_period(&mut self, period: Period) -> Option<LoadRequest> {
        if !self.owns_source() {
            return None;
        }
        self.options.period = period;
        self.surface.update_view(|view| {
            if let Some(selector) = view.selector.as_mut() {
                selector.selected = period;
            }
        });
        self.begin_load()
    }

    /// Record a new strip width and re-bucket the current series.
    pub fn resize(&mut self, width_px: i64) {
        self.surface.set_width(width_px);
        if self.series.is_some() && self.state == WidgetState::Populated {
            self.render_timeline();
        }
    }

    /// Tear down: clear the container and forget the series.
    pub fn destroy(&mut self) {
        self.surface.clear();
        self.series = None;
        self.state = WidgetState::Uninitialized;
    }
}
