//! Dashboard assembly: mounts configured containers and keeps the running
//! widget and batch tasks addressable by container id.

use crate::batch::{BatchConfig, BatchController, BatchHandle, PeriodBus};
use crate::config::DashboardConfig;
use crate::source::UptimeSource;
use crate::surface::{Content, Page};
use crate::timeline::{LabelFormatter, Period};
use crate::widget::{TimelineWidget, WidgetHandle, WidgetOptions};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The running dashboard.
pub struct Dashboard {
    page: Page,
    bus: PeriodBus,
    widgets: Arc<RwLock<HashMap<String, WidgetHandle>>>,
    batches: Arc<RwLock<HashMap<String, BatchHandle>>>,
}

impl Dashboard {
    /// Mount every configured container and start its task.
    ///
    /// The global period starts at the first batch's configured period.
    pub fn start(cfg: &DashboardConfig, source: Arc<dyn UptimeSource>, formatter: LabelFormatter) -> Self {
        let page = Page::new();

        let batch_configs: Vec<_> = cfg
            .batches
            .iter()
            .map(|c| (c, BatchConfig::from_attributes(&c.attributes())))
            .collect();
        let initial = batch_configs
            .first()
            .map(|(_, b)| b.period)
            .unwrap_or_default();
        let bus = PeriodBus::new(initial);

        let mut batches = HashMap::new();
        for (container, batch_cfg) in batch_configs {
            page.mount(&container.id, container.width);
            let Some(controller) = BatchController::attach(&page, &container.id, batch_cfg, formatter) else {
                continue;
            };
            let (handle, _) = BatchHandle::spawn(controller, source.clone(), bus.subscribe());
            batches.insert(container.id.clone(), handle);
        }

        let mut widgets = HashMap::new();
        for container in &cfg.widgets {
            page.mount(&container.id, container.width);
            let options = WidgetOptions::from_attributes(&container.attributes());
            let Some(widget) = TimelineWidget::attach(&page, &container.id, options, formatter) else {
                continue;
            };
            let (handle, _) = WidgetHandle::spawn(widget, source.clone());
            widgets.insert(container.id.clone(), handle);
        }

        tracing::info!(
            "Dashboard started with {} batches and {} widgets",
            batches.len(),
            widgets.len()
        );

        Self {
            page,
            bus,
            widgets: Arc::new(RwLock::new(widgets)),
            batches: Arc::new(RwLock::new(batches)),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// The period shown by the global selector.
    pub fn current_period(&self) -> Period {
        self.bus.current()
    }

    /// Change the period of every batch container.
    pub fn set_global_period(&self, period: Period) -> usize {
        self.bus.publish(period)
    }

    /// Change the period of one self-fetching widget.
    pub async fn set_widget_period(&self, id: &str, period: Period) -> bool {
        match self.widgets.read().await.get(id) {
            Some(handle) => handle.set_period(period),
            None => false,
        }
    }

    /// Reload a widget or a whole batch container.
    pub async fn reload(&self, id: &str) -> bool {
        if let Some(handle) = self.widgets.read().await.get(id) {
            return handle.reload();
        }
        match self.batches.read().await.get(id) {
            Some(handle) => handle.reload(),
            None => false,
        }
    }

    /// Record a new width for a top-level container and re-bucket its
    /// timelines. Widgets inside a batch follow their batch container.
    pub async fn resize(&self, id: &str, width_px: i64) -> bool {
        if let Some(handle) = self.widgets.read().await.get(id) {
            return handle.resize(width_px);
        }
        match self.batches.read().await.get(id) {
            Some(handle) => handle.resize(width_px),
            None => false,
        }
    }

    /// Tear down a widget or batch container and remove it from the page.
    pub async fn remove(&self, id: &str) -> bool {
        let widget = self.widgets.write().await.remove(id);
        let batch = self.batches.write().await.remove(id);

        let removed = match (widget, batch) {
            (Some(handle), _) => {
                handle.teardown();
                true
            }
            (None, Some(handle)) => {
                handle.teardown();
                true
            }
            (None, None) => false,
        };

        if removed {
            self.page.detach(id);
            tracing::info!("Dashboard: removed {}", id);
        }
        removed
    }

    /// Edit page of the monitor shown in container `id`, if it offers one.
    pub fn edit_url(&self, id: &str) -> Option<String> {
        match self.page.surface(id)?.content() {
            Content::Widget(view) if view.listeners.edit_click.is_some() => view.name?.edit_href,
            _ => None,
        }
    }

    /// Stop every task.
    pub async fn shutdown(&self) {
        for (_, handle) in self.widgets.write().await.drain() {
            handle.teardown();
        }
        for (_, handle) in self.batches.write().await.drain() {
            handle.teardown();
        }
    }
}
