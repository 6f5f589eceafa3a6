use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TelegramConfig;
use crate::platform::telegram::{ApiError, ApiResponse, OutMessage};
use crate::platform::Message;
use crate::telemetry::{BridgeMetrics, ENDPOINT_SEND_MESSAGE};

/// Outbox loop: drains the shared plugin channel into `sendMessage`.
pub struct Outbox {
    client: reqwest::Client,
    bot_url: String,
    metrics: BridgeMetrics,
}

impl Outbox {
    pub fn new(client: reqwest::Client, telegram: &TelegramConfig, metrics: BridgeMetrics) -> Self {
        Self {
            client,
            bot_url: telegram.bot_url(),
            metrics,
        }
    }

    /// Send messages until `cancel` fires or every plugin has dropped its
    /// outbox sender. A send already in flight is allowed to finish.
    pub async fn run(self, mut outbox: mpsc::Receiver<Message>, cancel: CancellationToken) {
        info!("Starting sendMessage loop");

        loop {
            let msg = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let pending = discard_pending(&mut outbox);
                    if pending > 0 {
                        warn!("Shutting down with {} undelivered message(s) in the outbox", pending);
                    }
                    break;
                }
                msg = outbox.recv() => match msg {
                    Some(msg) => msg,
                    None => {
                        info!("All outbox senders dropped");
                        break;
                    }
                },
            };
            self.deliver(&msg).await;
        }

        info!("sendMessage loop stopped");
    }

    /// Send one message and log the outcome. Failures are not retried.
    pub async fn deliver(&self, msg: &Message) -> bool {
        let out = OutMessage::from(msg);
        match self.send(&out).await {
            Ok(()) => true,
            Err(ApiError::Transport(e)) => {
                error!(chat_id = %out.chat_id, error = %e, "sendMessage failed");
                false
            }
            // logged with the response status by `send`
            Err(_) => false,
        }
    }

    pub async fn send(&self, out: &OutMessage) -> Result<(), ApiError> {
        debug!(chat_id = %out.chat_id, msg = ?out, "sendMessage");

        let response = self
            .client
            .post(format!("{}/sendMessage", self.bot_url))
            .json(out)
            .send()
            .await?;
        let status = response.status().as_u16();
        self.metrics.record_http_status(ENDPOINT_SEND_MESSAGE, status);

        let body = response.bytes().await?;
        let result = decode_send_response(&body);
        if let Err(e) = &result {
            error!(
                chat_id = %out.chat_id,
                status,
                error = %e,
                msg = ?out,
                "parsing sendMessage response failed"
            );
        }
        result
    }
}

/// Close the outbox and drop whatever is still queued, returning the count.
fn discard_pending(outbox: &mut mpsc::Receiver<Message>) -> usize {
    outbox.close();
    let mut pending = 0;
    while outbox.try_recv().is_ok() {
        pending += 1;
    }
    pending
}

fn decode_send_response(body: &[u8]) -> Result<(), ApiError> {
    let envelope: ApiResponse = serde_json::from_slice(body)?;
    envelope.into_result().map(|_| ())
}
