use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::platform::Message;
use crate::plugins::{InboundSender, Plugin};

/// A plugin paired with its inbound queue.
#[derive(Clone)]
pub struct Registration {
    pub plugin: Arc<dyn Plugin>,
    pub queue: InboundSender,
}

impl Registration {
    pub fn name(&self) -> &str {
        self.plugin.name()
    }
}

/// Collects plugin registrations during setup.
///
/// [`RegistryBuilder::build`] consumes the builder, so nothing can be
/// registered once the ingestion loop holds the frozen [`Registry`].
pub struct RegistryBuilder {
    outbox: mpsc::Sender<Message>,
    entries: Vec<Registration>,
}

impl RegistryBuilder {
    pub fn new(outbox: mpsc::Sender<Message>) -> Self {
        Self {
            outbox,
            entries: Vec::new(),
        }
    }

    /// Initialize `plugin` with the shared outbox and record its queue.
    ///
    /// A failing plugin is not registered; other registrations are unaffected.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let queue = plugin
            .init(self.outbox.clone())
            .with_context(|| format!("Failed to initialize plugin: {}", plugin.name()))?;

        info!(
            "Registered plugin: {} (queue capacity {})",
            plugin.name(),
            queue.max_capacity()
        );
        self.entries.push(Registration { plugin, queue });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries.into(),
        }
    }
}

/// Immutable snapshot of every registered plugin.
#[derive(Clone)]
pub struct Registry {
    entries: Arc<[Registration]>,
}

impl Registry {
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
