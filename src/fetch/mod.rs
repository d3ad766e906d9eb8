use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, FetcherKind};
use crate::utils::error::AppError;

pub mod browser;
pub mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

/// A fetched, rendered product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub html: String,
    /// URL after redirects.
    pub final_url: String,
    pub response_time_ms: u64,
}

/// Retrieves rendered HTML for a URL. Implementations may use plain HTTP or
/// a real browser engine; the inference engine never cares which.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError>;
}

/// Builds the fetcher selected by configuration. Failure here is the only
/// fatal startup error; everything later degrades per product.
pub fn make_fetcher(config: &AppConfig) -> Result<Box<dyn PageFetcher>, AppError> {
    match config.fetcher.kind {
        FetcherKind::Http => Ok(Box::new(HttpFetcher::new(&config.fetcher)?)),
        FetcherKind::Browser => Ok(Box::new(BrowserFetcher::new(
            &config.fetcher,
            &config.snapshots,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        FetcherConfig, LoggingConfig, NotificationsConfig, PollerConfig, SnapshotConfig,
        TelegramConfig,
    };

    fn http_config() -> AppConfig {
        AppConfig {
            fetcher: FetcherConfig {
                kind: FetcherKind::Http,
                request_timeout: 15,
                retry_attempts: 0,
                retry_delay_ms: 100,
                user_agent: "TestAgent/1.0".to_string(),
                referer: None,
                chrome_path: None,
            },
            poller: PollerConfig {
                products_file: "products.json".to_string(),
                check_interval: 300,
            },
            notifications: NotificationsConfig {
                telegram: TelegramConfig {
                    bot_token: String::new(),
                    chat_id: String::new(),
                },
            },
            snapshots: SnapshotConfig {
                enabled: false,
                dir: "data/snapshots".to_string(),
            },
            logging: LoggingConfig {
                dir: "logs".to_string(),
                file: "test.log".to_string(),
            },
        }
    }

    #[test]
    fn test_make_http_fetcher() {
        let fetcher = make_fetcher(&http_config()).unwrap();
        assert_eq!(fetcher.name(), "http");
    }
}
