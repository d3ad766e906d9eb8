use async_trait::async_trait;
use chrono::Utc;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::config::{FetcherConfig, SnapshotConfig};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::utils::error::AppError;

/// Browser-engine page fetcher for storefronts that render their product
/// data client-side. One browser instance, one tab per fetch.
pub struct BrowserFetcher {
    browser: Browser,
    user_agent: String,
    request_timeout: Duration,
    /// Screenshot directory when snapshot archiving is enabled.
    screenshot_dir: Option<PathBuf>,
}

impl BrowserFetcher {
    pub fn new(config: &FetcherConfig, snapshots: &SnapshotConfig) -> Result<Self, AppError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Internal(format!("failed to launch browser: {}", e)))?;

        Ok(Self {
            browser,
            user_agent: config.user_agent.clone(),
            request_timeout: Duration::from_secs(config.request_timeout),
            screenshot_dir: snapshots
                .enabled
                .then(|| PathBuf::from(&snapshots.dir)),
        })
    }

    fn save_screenshot(&self, tab: &Tab, dir: &PathBuf, url: &str) -> Result<PathBuf, AppError> {
        let data = tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| AppError::Internal(format!("screenshot capture failed: {}", e)))?;

        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.replace('.', "_")))
            .unwrap_or_else(|| "page".to_string());
        let filename = format!("{}_{}.png", host, Utc::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(filename);

        std::fs::create_dir_all(dir)?;
        std::fs::write(&path, data)?;

        Ok(path)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let started = Instant::now();
        debug!(url, "fetching page with headless browser");

        let tab = self.browser.new_tab().map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("failed to open tab: {}", e),
        })?;

        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| AppError::Fetch {
                url: url.to_string(),
                message: format!("failed to set user agent: {}", e),
            })?;

        tab.navigate_to(url).map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("navigation failed: {}", e),
        })?;

        tab.wait_until_navigated().map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("page load failed: {}", e),
        })?;

        // Bounded wait for page readiness.
        tab.wait_for_element_with_custom_timeout("body", self.request_timeout)
            .map_err(|e| AppError::Fetch {
                url: url.to_string(),
                message: format!("page did not become ready: {}", e),
            })?;

        let html = tab.get_content().map_err(|e| AppError::Parse {
            message: format!("failed to read rendered content: {}", e),
        })?;

        let final_url = {
            let current = tab.get_url();
            if current.is_empty() {
                url.to_string()
            } else {
                current
            }
        };

        if let Some(dir) = &self.screenshot_dir {
            match self.save_screenshot(&tab, dir, url) {
                Ok(path) => debug!(url, path = %path.display(), "saved screenshot"),
                Err(e) => warn!(url, error = %e, "failed to capture screenshot"),
            }
        }

        // Close tab to free resources
        let _ = tab.close(true);

        Ok(FetchedPage {
            html,
            final_url,
            response_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
