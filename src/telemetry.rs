//! Metric names and the handle both loops record into.
//!
//! Only the `metrics` facade is used here; whichever recorder the embedding
//! process installs receives the values. Without one, recording is a no-op.

use ::metrics::{counter, gauge, Counter, Gauge};

/// Polls issued against `getUpdates`
pub const UPDATES_TOTAL: &str = "telegram_updates_total";
/// Number of updates in the most recent batch
pub const MESSAGES_PER_UPDATE: &str = "telegram_messages_per_update";
/// HTTP responses by endpoint and status code
pub const HTTP_RESPONSES_TOTAL: &str = "telegram_http_responses_total";
/// Items dropped because a plugin queue was full or closed
pub const DISPATCH_DROPPED_TOTAL: &str = "telegram_dispatch_dropped_total";

pub const ENDPOINT_GET_UPDATES: &str = "getUpdates";
pub const ENDPOINT_SEND_MESSAGE: &str = "sendMessage";

/// Metric handles, built once at setup and passed to each loop.
#[derive(Clone)]
pub struct BridgeMetrics {
    updates: Counter,
    messages_per_update: Gauge,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            updates: counter!(UPDATES_TOTAL),
            messages_per_update: gauge!(MESSAGES_PER_UPDATE),
        }
    }

    pub fn record_poll(&self, batch_len: usize) {
        self.updates.increment(1);
        self.messages_per_update.set(batch_len as f64);
    }

    pub fn record_http_status(&self, endpoint: &'static str, status: u16) {
        counter!(HTTP_RESPONSES_TOTAL, "endpoint" => endpoint, "status" => status.to_string())
            .increment(1);
    }

    pub fn record_drop(&self, plugin: &str) {
        counter!(DISPATCH_DROPPED_TOTAL, "plugin" => plugin.to_string()).increment(1);
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
