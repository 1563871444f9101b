//! Task that drives a batch container.

use super::{BatchController, BatchRequest};
use crate::source::{FetchError, UptimeSource};
use crate::timeline::{BatchPayload, Period};

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum BatchCommand {
    Reload,
    Resize(i64),
    Loaded {
        epoch: u64,
        result: Result<BatchPayload, FetchError>,
    },
    Teardown,
}

/// Handle to a running batch task.
#[derive(Debug, Clone)]
pub struct BatchHandle {
    tx: mpsc::UnboundedSender<BatchCommand>,
}

impl BatchHandle {
    /// Show the loading placeholder, load with the configured period and
    /// reload on every later period change published on the bus.
    pub fn spawn(
        controller: BatchController,
        source: Arc<dyn UptimeSource>,
        periods: watch::Receiver<Period>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();
        let handle = Self { tx };
        let task = tokio::spawn(run_batch(controller, source, periods, weak, rx));
        (handle, task)
    }

    fn send(&self, cmd: BatchCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn reload(&self) -> bool {
        self.send(BatchCommand::Reload)
    }

    pub fn resize(&self, width_px: i64) -> bool {
        self.send(BatchCommand::Resize(width_px))
    }

    pub fn teardown(&self) -> bool {
        self.send(BatchCommand::Teardown)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

fn start_load(
    request: BatchRequest,
    source: &Arc<dyn UptimeSource>,
    tx: &mpsc::WeakUnboundedSender<BatchCommand>,
) {
    let source = source.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = request.fetch(source.as_ref()).await;
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(BatchCommand::Loaded {
                epoch: request.epoch,
                result,
            });
        }
    });
}

async fn run_batch(
    mut controller: BatchController,
    source: Arc<dyn UptimeSource>,
    mut periods: watch::Receiver<Period>,
    tx: mpsc::WeakUnboundedSender<BatchCommand>,
    mut rx: mpsc::UnboundedReceiver<BatchCommand>,
) {
    controller.show_loading();
    // The configured period wins for the first load; only later changes count.
    periods.borrow_and_update();
    let initial = controller.config().period;
    start_load(controller.begin_load(initial), &source, &tx);

    let mut bus_open = true;
    loop {
        tokio::select! {
            changed = periods.changed(), if bus_open => {
                if changed.is_err() {
                    bus_open = false;
                    continue;
                }
                let period = *periods.borrow_and_update();
                start_load(controller.begin_load(period), &source, &tx);
            }
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                if !controller.is_attached() {
                    tracing::info!("Batch {}: container detached, stopping", controller.id());
                    controller.destroy();
                    break;
                }
                match cmd {
                    BatchCommand::Reload => {
                        let period = controller.config().period;
                        start_load(controller.begin_load(period), &source, &tx);
                    }
                    BatchCommand::Resize(width) => controller.resize(width),
                    BatchCommand::Loaded { epoch, result } => {
                        controller.apply(epoch, result);
                    }
                    BatchCommand::Teardown => {
                        controller.destroy();
                        tracing::info!("Batch {}: torn down", controller.id());
                        break;
                    }
                }
            }
        }
    }
}
