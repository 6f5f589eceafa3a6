use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::backoff::Backoff;
use crate::config::{BackoffConfig, TelegramConfig};
use crate::cursor::Cursor;
use crate::dispatcher::Dispatcher;
use crate::platform::telegram::{translate, ApiError, ApiResponse, WireUpdate};
use crate::telemetry::{BridgeMetrics, ENDPOINT_GET_UPDATES};

/// How long to wait before the next poll after a batch of `batch_len`.
///
/// A full page means more updates are likely pending, so the next poll is
/// issued right away.
pub fn pacing_delay(batch_len: usize, max_updates: usize, interval: Duration) -> Option<Duration> {
    if batch_len == max_updates {
        None
    } else {
        Some(interval)
    }
}

/// Ingestion loop: polls `getUpdates`, translates and fans out each update.
pub struct Inbox {
    client: reqwest::Client,
    bot_url: String,
    cursor: Cursor,
    dispatcher: Dispatcher,
    metrics: BridgeMetrics,
    max_updates: usize,
    poll_interval: Duration,
    long_poll_timeout_secs: u64,
    backoff: Backoff,
}

impl Inbox {
    pub fn new(
        client: reqwest::Client,
        telegram: &TelegramConfig,
        backoff: &BackoffConfig,
        dispatcher: Dispatcher,
        metrics: BridgeMetrics,
    ) -> Self {
        Self {
            client,
            bot_url: telegram.bot_url(),
            cursor: Cursor::default(),
            dispatcher,
            metrics,
            max_updates: telegram.max_updates_per_poll,
            poll_interval: telegram.poll_interval(),
            long_poll_timeout_secs: telegram.long_poll_timeout_secs,
            backoff: Backoff::new(
                Duration::from_millis(backoff.initial_ms),
                Duration::from_millis(backoff.max_ms),
            ),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Poll until `cancel` fires.
    ///
    /// Cancellation also aborts an in-flight poll; the cursor only moves
    /// after a response has been fully read, so no update is skipped.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Starting getUpdates loop at offset {}", self.cursor.next_offset());

        loop {
            let delay = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.poll_once() => self.delay_after(result),
            };

            if let Some(delay) = delay {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!(
            "getUpdates loop stopped at update {}",
            self.cursor.last_update()
        );
    }

    fn delay_after(&mut self, result: Result<usize, ApiError>) -> Option<Duration> {
        match result {
            Ok(count) => {
                self.backoff.reset();
                pacing_delay(count, self.max_updates, self.poll_interval)
            }
            Err(ApiError::Transport(e)) => {
                let delay = self.backoff.next_delay();
                error!(
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "getUpdates failed"
                );
                Some(delay)
            }
            Err(ApiError::Api { code, description }) => {
                self.backoff.reset();
                error!(error_code = code, description = %description, "parsing response failed");
                pacing_delay(0, self.max_updates, self.poll_interval)
            }
            Err(e) => {
                self.backoff.reset();
                error!(error = %e, "parsing updates response failed");
                pacing_delay(0, self.max_updates, self.poll_interval)
            }
        }
    }

    /// Issue one `getUpdates` call and process whatever it returns.
    ///
    /// Returns the number of updates in the batch.
    pub async fn poll_once(&mut self) -> Result<usize, ApiError> {
        let mut query = vec![
            ("offset", self.cursor.next_offset().to_string()),
            ("limit", self.max_updates.to_string()),
        ];
        if self.long_poll_timeout_secs > 0 {
            query.push(("timeout", self.long_poll_timeout_secs.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/getUpdates", self.bot_url))
            .query(&query)
            .send()
            .await?;
        self.metrics
            .record_http_status(ENDPOINT_GET_UPDATES, response.status().as_u16());
        let body = response.bytes().await?;

        let batch = match decode_updates(&body) {
            Ok(batch) => batch,
            Err(e) => {
                self.metrics.record_poll(0);
                return Err(e);
            }
        };

        let count = batch.len();
        self.metrics.record_poll(count);
        self.process_batch(batch);
        Ok(count)
    }

    /// Translate and dispatch each update in arrival order.
    ///
    /// The cursor advances per update, before dispatch, so delivery to
    /// plugins never holds it back. A record that does not decode is skipped
    /// but still moves the cursor when its `update_id` is readable.
    pub fn process_batch(&mut self, batch: Vec<serde_json::Value>) {
        for raw in batch {
            let update = match WireUpdate::deserialize(&raw) {
                Ok(update) => update,
                Err(e) => {
                    let update_id = raw.get("update_id").and_then(serde_json::Value::as_i64);
                    error!(error = %e, update_id = ?update_id, "decoding update failed, skipping");
                    if let Some(update_id) = update_id {
                        self.cursor.advance(update_id);
                    }
                    continue;
                }
            };
            self.cursor.advance(update.update_id);

            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "update without message, skipping");
                continue;
            };

            let item = Arc::new(translate(&message));
            debug!(update_id = update.update_id, msg = ?item, "update");
            self.dispatcher.dispatch(item);
        }
    }
}

/// Decode the envelope; individual updates are decoded by `process_batch`.
fn decode_updates(body: &[u8]) -> Result<Vec<serde_json::Value>, ApiError> {
    let envelope: ApiResponse = serde_json::from_slice(body)?;
    match envelope.into_result()? {
        Some(result) => Ok(serde_json::from_value(result)?),
        None => Ok(Vec::new()),
    }
}
