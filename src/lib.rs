//! Bridge between the Telegram Bot API and independent plugins.
//!
//! Updates are long-polled, translated into [`platform::Inbound`] items and
//! fanned out to every plugin's bounded queue. Plugins reply through one
//! shared outbox that is drained into `sendMessage`.

pub mod backoff;
pub mod bridge;
pub mod config;
pub mod cursor;
pub mod dispatcher;
pub mod inbox;
pub mod outbox;
pub mod platform;
pub mod plugins;
pub mod registry;
pub mod telemetry;

pub use bridge::{Bridge, BridgeHandle};
pub use config::Config;
