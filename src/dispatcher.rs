use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::platform::Inbound;
use crate::registry::Registry;
use crate::telemetry::BridgeMetrics;

/// Outcome of fanning one item out to every plugin.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Fans inbound items out to every registered plugin without waiting.
///
/// A full or closed queue loses the item for that plugin only. Nothing is
/// retried and the caller is never slowed down by a lagging plugin.
pub struct Dispatcher {
    registry: Registry,
    metrics: BridgeMetrics,
}

impl Dispatcher {
    pub fn new(registry: Registry, metrics: BridgeMetrics) -> Self {
        Self { registry, metrics }
    }

    pub fn dispatch(&self, item: Arc<Inbound>) -> DispatchReport {
        let mut report = DispatchReport::default();

        for registration in self.registry.iter() {
            match registration.queue.try_send(Arc::clone(&item)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        plugin = registration.name(),
                        msg_id = %item.message().id,
                        "input channel full, skipping message"
                    );
                    self.metrics.record_drop(registration.name());
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(
                        plugin = registration.name(),
                        msg_id = %item.message().id,
                        "input channel closed, skipping message"
                    );
                    self.metrics.record_drop(registration.name());
                    report.dropped += 1;
                }
            }
        }

        report
    }
}
