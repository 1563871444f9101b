//! Dashboard-wide period selection.

use crate::timeline::Period;

use std::sync::Arc;
use tokio::sync::watch;

/// Publishes the globally selected period to every batch container.
///
/// Subscribers always see the latest value; intermediate values may be
/// skipped when several changes land before a subscriber wakes up.
#[derive(Debug, Clone)]
pub struct PeriodBus {
    tx: Arc<watch::Sender<Period>>,
}

impl Default for PeriodBus {
    fn default() -> Self {
        Self::new(Period::default())
    }
}

impl PeriodBus {
    pub fn new(initial: Period) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Announce a new period. Returns the number of listening batches.
    pub fn publish(&self, period: Period) -> usize {
        let previous = self.tx.send_replace(period);
        let listeners = self.tx.receiver_count();
        tracing::info!(
            "Period changed {} -> {}, notifying {} batches",
            previous,
            period,
            listeners
        );
        listeners
    }

    pub fn current(&self) -> Period {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Period> {
        self.tx.subscribe()
    }
}
