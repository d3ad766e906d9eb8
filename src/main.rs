use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use restock_watcher::config::AppConfig;
use restock_watcher::fetch::make_fetcher;
use restock_watcher::inference::StockInferenceEngine;
use restock_watcher::notify::TelegramNotifier;
use restock_watcher::poller::Poller;

#[derive(Parser)]
#[command(
    name = "restock-watcher",
    version,
    about = "Product stock availability tracking and alerting"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the polling loop
    Watch,
    /// Fetch one product page and print the stock verdict
    Check {
        /// Product page URL
        url: String,
        /// Display name used in logs and output
        #[arg(long, default_value = "ad-hoc product")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Log to the console and to a rolling file, like the deployments this
    // replaces expect.
    let file_appender =
        tracing_appender::rolling::daily(&config.logging.dir, &config.logging.file);
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env().add_directive("restock_watcher=info".parse()?),
        )
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    info!("Starting Restock Watcher...");

    // A fetcher that cannot start is the one fatal error; per-product
    // failures later are absorbed by the poller.
    let fetcher = make_fetcher(&config)?;
    info!(fetcher = fetcher.name(), "page fetcher initialised");

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            let notifier = Box::new(TelegramNotifier::new(&config.notifications.telegram));
            let mut poller = Poller::new(fetcher, notifier, config);
            poller.run().await?;
        }
        Command::Check { url, name } => {
            let engine = StockInferenceEngine::new();
            let page = fetcher.fetch(&url).await?;
            let inference = engine.infer(&page.html, &name);
            println!("{}: {} ({})", name, inference.verdict, inference.evidence);
        }
    }

    Ok(())
}
