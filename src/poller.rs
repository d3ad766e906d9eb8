use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::inference::{Inference, StockInferenceEngine};
use crate::models::{load_products, Product, TransitionEvent};
use crate::notify::{message, Notifier};
use crate::tracker::StatusTracker;

/// Per-cycle counters for the summary log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub products_checked: usize,
    pub fetch_failures: usize,
    pub transitions: usize,
    pub notifications_sent: usize,
}

struct CheckOutcome {
    fetch_failed: bool,
    event: Option<TransitionEvent>,
    notified: bool,
}

/// Orchestrates the monitoring loop: load products, fetch, infer, track,
/// notify, sleep, repeat. Owns the status tracker; nothing in the
/// per-product path is fatal to the loop.
pub struct Poller {
    fetcher: Box<dyn PageFetcher>,
    notifier: Box<dyn Notifier>,
    engine: StockInferenceEngine,
    tracker: StatusTracker,
    config: AppConfig,
}

impl Poller {
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        notifier: Box<dyn Notifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            engine: StockInferenceEngine::new(),
            tracker: StatusTracker::new(),
            config,
        }
    }

    /// Runs poll cycles forever, sleeping the configured interval between
    /// them. Only process termination stops the loop.
    pub async fn run(&mut self) -> crate::Result<()> {
        let interval = Duration::from_secs(self.config.poller.check_interval);
        loop {
            let summary = self.run_cycle().await;
            info!(
                checked = summary.products_checked,
                transitions = summary.transitions,
                notified = summary.notifications_sent,
                failures = summary.fetch_failures,
                "finished checking all products, next check in {}s",
                interval.as_secs()
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// One poll cycle over the (re-loaded) product list.
    pub async fn run_cycle(&mut self) -> CycleSummary {
        info!("running stock check");
        let mut summary = CycleSummary::default();

        let products = match load_products(Path::new(&self.config.poller.products_file)) {
            Ok(products) => products,
            Err(e) => {
                error!(error = %e, "failed to load product list, skipping this cycle");
                return summary;
            }
        };

        if products.is_empty() {
            warn!(
                file = %self.config.poller.products_file,
                "no products configured to monitor"
            );
            return summary;
        }

        for product in &products {
            let outcome = self.check_product(product).await;
            summary.products_checked += 1;
            if outcome.fetch_failed {
                summary.fetch_failures += 1;
            }
            if outcome.event.is_some() {
                summary.transitions += 1;
            }
            if outcome.notified {
                summary.notifications_sent += 1;
            }
        }

        summary
    }

    /// Checks one product. All faults are absorbed here: a fetch or parse
    /// failure becomes a conservative out-of-stock verdict, a delivery
    /// failure is logged, and the next product always gets its turn.
    async fn check_product(&mut self, product: &Product) -> CheckOutcome {
        debug!(product = %product.id, url = %product.url, "checking stock");

        let mut fetch_failed = false;
        let inference = match self.fetcher.fetch(&product.url).await {
            Ok(page) => {
                self.maybe_snapshot(product, &page);
                self.engine.infer(&page.html, &product.name)
            }
            Err(e) => {
                warn!(
                    product = %product.name,
                    url = %product.url,
                    error = %e,
                    "fetch failed, assuming not purchasable"
                );
                fetch_failed = true;
                Inference::from_failure(&e)
            }
        };

        info!(
            product = %product.name,
            verdict = %inference.verdict,
            evidence = %inference.evidence,
            "stock verdict"
        );

        let event = self.tracker.record_and_diff(product, inference.verdict);
        let mut notified = false;

        if let Some(event) = &event {
            let text = message::render(event);
            let chat_id = self.config.notifications.telegram.chat_id.clone();
            match self.notifier.send(&chat_id, &text).await {
                Ok(true) => {
                    info!(product = %product.name, transition = ?event.transition, "notification sent");
                    notified = true;
                }
                Ok(false) => {
                    warn!(product = %product.name, "notification delivery reported failure");
                }
                Err(e) => {
                    error!(product = %product.name, error = %e, "notification delivery failed");
                }
            }
        }

        CheckOutcome {
            fetch_failed,
            event,
            notified,
        }
    }

    /// Archives the fetched markup for offline diagnosis when enabled.
    /// Never fatal; a failed write is just a warning.
    fn maybe_snapshot(&self, product: &Product, page: &FetchedPage) {
        if !self.config.snapshots.enabled {
            return;
        }

        let dir = Path::new(&self.config.snapshots.dir);
        let filename = format!(
            "{}_{}.html",
            product.name.replace(' ', "_"),
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(filename);

        let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, &page.html));
        match result {
            Ok(()) => debug!(product = %product.id, path = %path.display(), "saved page snapshot"),
            Err(e) => warn!(product = %product.id, error = %e, "failed to save page snapshot"),
        }
    }

    /// Read access to the tracked status map, mainly for tests and the
    /// summary log.
    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }
}
