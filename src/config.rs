use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Largest page the Bot API returns from `getUpdates`.
pub const MAX_UPDATES_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

#[derive(Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Pause between polls when the last batch was not full
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Batch size that counts as "full" and triggers an immediate re-poll
    #[serde(default = "default_max_updates_per_poll")]
    pub max_updates_per_poll: usize,
    /// Per-request timeout; also bounds how long shutdown can take
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Server-side long-poll timeout; 0 returns immediately
    #[serde(default)]
    pub long_poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_updates_per_poll", &self.max_updates_per_poll)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("long_poll_timeout_secs", &self.long_poll_timeout_secs)
            .finish()
    }
}

impl TelegramConfig {
    /// Base URL for bot methods, e.g. `https://api.telegram.org/bot<token>`.
    pub fn bot_url(&self) -> String {
        format!(
            "{}/bot{}",
            self.api_base_url.trim_end_matches('/'),
            self.bot_token
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_initial_ms")]
    pub initial_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_backoff_initial_ms(),
            max_ms: default_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelsConfig {
    /// Capacity of the shared outbox; plugins wait when it is full
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PluginsConfig {
    #[serde(default)]
    pub echo: EchoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EchoConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_plugin_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue_capacity: default_plugin_queue_capacity(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_updates_per_poll() -> usize {
    MAX_UPDATES_LIMIT
}

fn default_request_timeout_secs() -> u64 {
    45
}

fn default_backoff_initial_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_outbox_capacity() -> usize {
    256
}

fn default_plugin_queue_capacity() -> usize {
    100
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let telegram = &self.telegram;
        if telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram API key must not be empty");
        }
        if telegram.max_updates_per_poll == 0 || telegram.max_updates_per_poll > MAX_UPDATES_LIMIT
        {
            anyhow::bail!(
                "telegram.max_updates_per_poll must be between 1 and {}, got {}",
                MAX_UPDATES_LIMIT,
                telegram.max_updates_per_poll
            );
        }
        if telegram.request_timeout_secs <= telegram.long_poll_timeout_secs {
            anyhow::bail!(
                "telegram.request_timeout_secs ({}) must exceed long_poll_timeout_secs ({})",
                telegram.request_timeout_secs,
                telegram.long_poll_timeout_secs
            );
        }
        if self.channels.outbox_capacity == 0 {
            anyhow::bail!("channels.outbox_capacity must be greater than 0");
        }
        if self.plugins.echo.queue_capacity == 0 {
            anyhow::bail!("plugins.echo.queue_capacity must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.telegram.max_updates_per_poll, 100);
        assert_eq!(config.telegram.long_poll_timeout_secs, 0);
        assert_eq!(config.backoff.initial_ms, 500);
        assert_eq!(config.backoff.max_ms, 30_000);
        assert_eq!(config.channels.outbox_capacity, 256);
        assert!(!config.plugins.echo.enabled);
        assert_eq!(config.plugins.echo.queue_capacity, 100);
    }

    #[test]
    fn test_bot_url() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            api_base_url = "http://localhost:8081/"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.bot_url(), "http://localhost:8081/bot123:abc");
    }

    #[test]
    fn test_empty_token_is_fatal() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = "  "
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_missing_telegram_section() {
        assert!(Config::parse("[channels]\noutbox_capacity = 4\n").is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = "t"
            max_updates_per_poll = 101
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_updates_per_poll"));
    }

    #[test]
    fn test_long_poll_must_fit_in_request_timeout() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = "t"
            long_poll_timeout_secs = 60
            request_timeout_secs = 30
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("long_poll_timeout_secs"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "secret-token"
            "#,
        )
        .unwrap();
        assert!(!format!("{:?}", config).contains("secret-token"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[telegram]\nbot_token = \"t\"\n\n[plugins.echo]\nenabled = true\nqueue_capacity = 8\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.plugins.echo.enabled);
        assert_eq!(config.plugins.echo.queue_capacity, 8);
    }
}
