use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::inbox::Inbox;
use crate::outbox::Outbox;
use crate::platform::Message;
use crate::plugins::Plugin;
use crate::registry::RegistryBuilder;
use crate::telemetry::BridgeMetrics;

/// Setup phase of the bridge: plugins can only be added before [`Bridge::start`].
pub struct Bridge {
    config: Config,
    client: reqwest::Client,
    metrics: BridgeMetrics,
    registry: RegistryBuilder,
    outbox_rx: mpsc::Receiver<Message>,
}

impl Bridge {
    pub fn new(config: Config, metrics: BridgeMetrics) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.telegram.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let (outbox_tx, outbox_rx) = mpsc::channel(config.channels.outbox_capacity);

        Ok(Self {
            config,
            client,
            metrics,
            registry: RegistryBuilder::new(outbox_tx),
            outbox_rx,
        })
    }

    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.registry.register(plugin)
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.len()
    }

    /// Freeze the registry and spawn the ingestion and outbox loops.
    pub fn start(self) -> BridgeHandle {
        let registry = self.registry.build();
        info!("Starting bridge with {} plugin(s)", registry.len());

        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(registry, self.metrics.clone());

        let inbox = Inbox::new(
            self.client.clone(),
            &self.config.telegram,
            &self.config.backoff,
            dispatcher,
            self.metrics.clone(),
        );
        let outbox = Outbox::new(self.client, &self.config.telegram, self.metrics);

        let inbox = tokio::spawn(
            inbox
                .run(cancel.clone())
                .instrument(info_span!("telegram", module = "bot", task = "inbox")),
        );
        let outbox = tokio::spawn(
            outbox
                .run(self.outbox_rx, cancel.clone())
                .instrument(info_span!("telegram", module = "bot", task = "outbox")),
        );

        BridgeHandle {
            cancel,
            inbox,
            outbox,
        }
    }
}

/// Running bridge. Dropping it leaves the loops running.
pub struct BridgeHandle {
    cancel: CancellationToken,
    inbox: JoinHandle<()>,
    outbox: JoinHandle<()>,
}

impl BridgeHandle {
    /// Token that stops both loops when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop both loops and wait until they have exited.
    ///
    /// Takes at most one request timeout, for an in-flight `sendMessage`.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for both loops to exit.
    pub async fn join(self) -> Result<()> {
        let (inbox, outbox) = tokio::join!(self.inbox, self.outbox);
        inbox.context("Ingestion loop panicked")?;
        outbox.context("Outbox loop panicked")?;
        info!("Bridge stopped");
        Ok(())
    }
}
