use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{InboundReceiver, InboundSender, Plugin};
use crate::platform::{Inbound, Message};

/// Replies to every text message with the same text.
///
/// Mostly useful to check a deployment end to end.
pub struct EchoPlugin {
    queue_capacity: usize,
}

impl EchoPlugin {
    pub fn new(queue_capacity: usize) -> Self {
        Self { queue_capacity }
    }
}

impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    fn init(&self, outbox: mpsc::Sender<Message>) -> Result<InboundSender> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        tokio::spawn(echo_loop(rx, outbox));
        Ok(tx)
    }
}

async fn echo_loop(mut inbound: InboundReceiver, outbox: mpsc::Sender<Message>) {
    while let Some(item) = inbound.recv().await {
        match item.as_ref() {
            Inbound::Message(msg) if !msg.text.is_empty() => {
                let reply = Message::outgoing(msg.chat.id.clone(), msg.text.clone());
                // waits while the outbox is full
                if outbox.send(reply).await.is_err() {
                    break;
                }
            }
            Inbound::Message(msg) => {
                debug!(msg_id = %msg.id, "echo: ignoring message without text");
            }
            Inbound::ChatMigrated(migration) => {
                info!(
                    "echo: chat {} migrated to {}",
                    migration.from_chat_id, migration.to_chat_id
                );
            }
        }
    }
    debug!("echo plugin stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ChatMigration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_echoes_text_to_same_chat() {
        let (outbox, mut outbox_rx) = mpsc::channel(4);
        let inbound = EchoPlugin::new(4).init(outbox).unwrap();

        let mut incoming = Message::outgoing("-42", "ping");
        incoming.id = "7".to_string();
        inbound
            .send(Arc::new(Inbound::Message(incoming)))
            .await
            .unwrap();

        let reply = outbox_rx.recv().await.unwrap();
        assert_eq!(reply.chat.id, "-42");
        assert_eq!(reply.text, "ping");
    }

    #[tokio::test]
    async fn test_skips_migrations_and_empty_text() {
        let (outbox, mut outbox_rx) = mpsc::channel(4);
        let inbound = EchoPlugin::new(4).init(outbox).unwrap();

        let msg = Message::outgoing("1", "");
        inbound
            .send(Arc::new(Inbound::ChatMigrated(ChatMigration {
                message: Message::outgoing("1", "moved"),
                from_chat_id: "1".to_string(),
                to_chat_id: "2".to_string(),
            })))
            .await
            .unwrap();
        inbound.send(Arc::new(Inbound::Message(msg))).await.unwrap();
        drop(inbound);

        // loop exits once the inbound sender is gone, dropping its outbox clone
        assert!(outbox_rx.recv().await.is_none());
    }
}
