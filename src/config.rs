use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub fetcher: FetcherConfig,
    pub poller: PollerConfig,
    pub notifications: NotificationsConfig,
    pub snapshots: SnapshotConfig,
    pub logging: LoggingConfig,
}

/// Which page fetcher implementation to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    Http,
    Browser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    pub kind: FetcherKind,
    /// Per-fetch timeout in seconds. Cycles themselves are unbounded.
    pub request_timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
    pub referer: Option<String>,
    pub chrome_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub products_file: String,
    /// Seconds to sleep between poll cycles.
    pub check_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// When enabled, fetched pages (and browser screenshots) are archived
    /// under `dir` for offline diagnosis.
    pub enabled: bool,
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub dir: String,
    pub file: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "RESTOCK_"
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.fetcher.chrome_path.is_none() {
            config.fetcher.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Fetcher request_timeout must be greater than 0".into(),
            ));
        }

        if self.fetcher.user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "Fetcher user_agent must not be empty".into(),
            ));
        }

        if self.poller.check_interval == 0 {
            return Err(ConfigError::Message(
                "Poller check_interval must be greater than 0".into(),
            ));
        }

        if self.poller.products_file.trim().is_empty() {
            return Err(ConfigError::Message(
                "Poller products_file must not be empty".into(),
            ));
        }

        if self.snapshots.enabled && self.snapshots.dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Snapshot dir must not be empty when snapshots are enabled".into(),
            ));
        }

        if self.logging.file.trim().is_empty() {
            return Err(ConfigError::Message(
                "Logging file must not be empty".into(),
            ));
        }

        // An empty bot token is allowed (notifications are then reported as
        // failed deliveries) so the watcher can run in dry mode.
        Ok(())
    }
}
