//! Stock tracker daemon.
//!
//! Loads configuration, starts the poll scheduler and the Telegram bot, and
//! runs until Ctrl+C. Logs go to stderr and, when `logging.log_dir` is set,
//! to a daily-rotated file as well.

use std::sync::Arc;
use stockwatch::bot::{BotHandler, BotRuntime};
use stockwatch::channels::TelegramAdapter;
use stockwatch::feed::HttpStockFeed;
use stockwatch::profile::ProfileRegistry;
use stockwatch::scheduler::PollScheduler;
use stockwatch::store::JsonFileStore;
use stockwatch::{StockNotifier, StockwatchConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn load_config() -> anyhow::Result<StockwatchConfig> {
    let path = StockwatchConfig::default_config_path();
    let mut config = if path.exists() {
        StockwatchConfig::from_file(&path)?
    } else {
        StockwatchConfig::default()
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn init_tracing(
    config: &StockwatchConfig,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stockwatch=info"));

    let (file_layer, guard) = match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "stockwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let _log_guard = init_tracing(&config);

    tracing::info!("stockwatch v{} starting", env!("CARGO_PKG_VERSION"));
    if config.admin_id.is_none() {
        tracing::warn!("no admin configured; /save_stock will be denied for everyone");
    }

    let store = Arc::new(JsonFileStore::new(&config.store.path));
    let profiles = Arc::new(ProfileRegistry::load(store)?);
    tracing::info!(
        subscribers = profiles.subscribers().len(),
        path = %config.store.path.display(),
        "loaded subscriber preferences"
    );

    let feed = Arc::new(HttpStockFeed::new(&config.feed)?);
    let telegram = Arc::new(TelegramAdapter::new(&config.telegram));
    if !telegram.health_check().await? {
        tracing::warn!("telegram rejected the bot token; retrying in the background");
    }

    let notifier = Arc::new(StockNotifier::new(
        &config,
        feed,
        telegram.clone(),
        profiles,
    ));

    let cancel = CancellationToken::new();
    let scheduler = PollScheduler::new(
        Arc::clone(&notifier),
        config.scheduler.clone(),
        cancel.clone(),
    )
    .run();
    let bot = BotRuntime::new(
        telegram,
        BotHandler::new(notifier, config.scheduler.cycle_minutes),
        cancel.clone(),
    )
    .run();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    cancel.cancel();

    let (scheduler, bot) = tokio::join!(scheduler, bot);
    if let Err(e) = scheduler {
        tracing::error!("scheduler task failed: {e}");
    }
    if let Err(e) = bot {
        tracing::error!("bot task failed: {e}");
    }
    Ok(())
}
