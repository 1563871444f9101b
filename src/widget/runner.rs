//! Task that drives a self-fetching widget from a command queue.

use super::{LoadRequest, TimelineWidget};
use crate::source::{FetchError, UptimeSource};
use crate::timeline::{Period, Series};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Messages processed by a widget task, one at a time.
#[derive(Debug)]
pub enum WidgetCommand {
    Reload,
    SetPeriod(Period),
    Resize(i64),
    /// Auto-refresh timer fired.
    Tick,
    /// A fetch finished.
    Loaded {
        epoch: u64,
        result: Result<Series, FetchError>,
    },
    Teardown,
}

/// Handle to a running widget task.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    tx: mpsc::UnboundedSender<WidgetCommand>,
}

impl WidgetHandle {
    /// Render `widget`, start its first load and keep driving it until teardown.
    pub fn spawn(widget: TimelineWidget, source: Arc<dyn UptimeSource>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // The task only keeps a weak sender, so it stops once every handle is dropped.
        let weak = tx.downgrade();
        let handle = Self { tx };
        let task = tokio::spawn(run_widget(widget, source, weak, rx));
        (handle, task)
    }

    fn send(&self, cmd: WidgetCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn reload(&self) -> bool {
        self.send(WidgetCommand::Reload)
    }

    pub fn set_period(&self, period: Period) -> bool {
        self.send(WidgetCommand::SetPeriod(period))
    }

    pub fn resize(&self, width_px: i64) -> bool {
        self.send(WidgetCommand::Resize(width_px))
    }

    pub fn teardown(&self) -> bool {
        self.send(WidgetCommand::Teardown)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Recurring refresh timer. Dropping or cancelling it stops the ticks.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Send [`WidgetCommand::Tick`] every `every` until cancelled or the widget
    /// task is gone. The first tick fires one full interval after start.
    pub fn start(every: Duration, tx: &mpsc::WeakUnboundedSender<WidgetCommand>) -> Self {
        let weak = tx.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + every;
            let mut interval = tokio::time::interval_at(start, every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(tx) = weak.upgrade() else { break };
                if tx.send(WidgetCommand::Tick).is_err() {
                    break;
                }
            }
        });
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn start_load(
    widget: &mut TimelineWidget,
    source: &Arc<dyn UptimeSource>,
    tx: &mpsc::WeakUnboundedSender<WidgetCommand>,
    request: Option<LoadRequest>,
) {
    let Some(request) = request.or_else(|| widget.begin_load()) else {
        return;
    };
    let source = source.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = request.fetch(source.as_ref()).await;
        // The widget may be gone by now; then the result is simply discarded.
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(WidgetCommand::Loaded {
                epoch: request.epoch,
                result,
            });
        }
    });
}

async fn run_widget(
    mut widget: TimelineWidget,
    source: Arc<dyn UptimeSource>,
    tx: mpsc::WeakUnboundedSender<WidgetCommand>,
    mut rx: mpsc::UnboundedReceiver<WidgetCommand>,
) {
    widget.render();
    start_load(&mut widget, &source, &tx, None);

    let refresh = widget
        .options()
        .auto_refresh
        .then(|| RefreshHandle::start(widget.options().refresh_interval, &tx));

    while let Some(cmd) = rx.recv().await {
        if !widget.is_attached() {
            tracing::info!("Widget {}: container detached, stopping", widget.id());
            break;
        }

        match cmd {
            WidgetCommand::Reload | WidgetCommand::Tick => {
                start_load(&mut widget, &source, &tx, None);
            }
            WidgetCommand::SetPeriod(period) => {
                let request = widget.set_period(period);
                if request.is_some() {
                    start_load(&mut widget, &source, &tx, request);
                }
            }
            WidgetCommand::Resize(width) => widget.resize(width),
            WidgetCommand::Loaded { epoch, result } => {
                widget.finish_load(epoch, result);
            }
            WidgetCommand::Teardown => {
                if let Some(refresh) = &refresh {
                    refresh.cancel();
                }
                widget.destroy();
                tracing::info!("Widget {}: torn down", widget.id());
                break;
            }
        }
    }
}
