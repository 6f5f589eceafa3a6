pub mod echo;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::platform::{Inbound, Message};

/// Sender half of a plugin's inbound queue. Items are shared, not copied,
/// across every plugin that receives them.
pub type InboundSender = mpsc::Sender<Arc<Inbound>>;
pub type InboundReceiver = mpsc::Receiver<Arc<Inbound>>;

/// A consumer of bridged Telegram traffic.
pub trait Plugin: Send + Sync {
    /// Stable display name, used for diagnostics only.
    fn name(&self) -> &str;

    /// Called once during setup with the shared outbox.
    ///
    /// Returns the sender of the plugin's own bounded inbound queue. The
    /// capacity of that queue is the plugin's choice; when it is full the
    /// bridge drops items for this plugin rather than waiting.
    fn init(&self, outbox: mpsc::Sender<Message>) -> Result<InboundSender>;
}
