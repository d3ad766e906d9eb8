use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::debug;

use crate::config::FetcherConfig;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::utils::error::AppError;

/// Plain-HTTP page fetcher. Sends realistic browser headers since many
/// storefronts serve reduced pages to obvious bots.
pub struct HttpFetcher {
    client: Client,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        if let Some(referer) = &config.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer)
                    .map_err(|e| AppError::Internal(format!("invalid referer header: {}", e)))?,
            );
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, AppError> {
        let started = Instant::now();
        debug!(url, "fetching page over http");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                message: format!("unexpected status code {}", status),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(FetchedPage {
            html,
            final_url,
            response_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let strategy =
            FixedInterval::from_millis(self.retry_delay_ms).take(self.retry_attempts as usize);
        Retry::spawn(strategy, || self.fetch_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> FetcherConfig {
        FetcherConfig {
            kind: FetcherKind::Http,
            request_timeout: 5,
            retry_attempts: 1,
            retry_delay_ms: 10,
            user_agent: "TestAgent/1.0".to_string(),
            referer: None,
            chrome_path: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_page_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/316890"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><span class=\"price\">₹45,990</span></body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let page = fetcher.fetch(&format!("{}/p/316890", server.uri())).await.unwrap();

        assert!(page.html.contains("₹45,990"));
        assert!(page.final_url.contains("/p/316890"));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "TestAgent/1.0"))
            .and(header("accept-language", "en-US,en;q=0.9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        fetcher.fetch(&server.uri()).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_error_on_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let result = fetcher.fetch(&server.uri()).await;

        match result {
            Err(AppError::Fetch { message, .. }) => assert!(message.contains("503")),
            other => panic!("expected fetch error, got {:?}", other.map(|p| p.final_url)),
        }
    }

    #[tokio::test]
    async fn test_fetch_retries_transient_failure() {
        let server = MockServer::start().await;
        // First request fails, the retry succeeds.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let page = fetcher.fetch(&server.uri()).await.unwrap();
        assert!(page.html.contains("ok"));
    }

    #[test]
    fn test_invalid_referer_is_rejected() {
        let mut config = test_config();
        config.referer = Some("bad\nvalue".to_string());
        assert!(HttpFetcher::new(&config).is_err());
    }
}
