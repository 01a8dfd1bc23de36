use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use statushound::config::Config;
use statushound::notify::TelegramNotifier;
use statushound::poll::PollLoop;
use statushound::review::PracticumClient;
use statushound::store::StatusStore;

#[derive(Parser, Debug)]
#[command(name = "statushound", version, about = "Homework review status bot")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "statushound.toml")]
    config: String,

    /// Override the poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Override the consecutive-failure threshold
    #[arg(long)]
    failure_threshold: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("statushound={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load(&args.config)?;
    if let Some(interval) = args.interval {
        config.poll.interval_secs = interval;
    }
    if let Some(threshold) = args.failure_threshold {
        config.poll.failure_threshold = threshold;
    }
    config.validate()?;

    let client = PracticumClient::new(
        config.practicum.token.clone(),
        config.practicum.endpoint.clone(),
    );
    let notifier = TelegramNotifier::new(
        config.telegram.token.clone(),
        config.telegram.chat_id.clone(),
        config.telegram.api_base.clone(),
    );
    let mut poll = PollLoop::new(
        client,
        notifier,
        StatusStore::new(),
        Duration::from_secs(config.poll.interval_secs),
        config.poll.failure_threshold,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current tick before exit");
            signal_cancel.cancel();
        }
    });

    tracing::info!(
        "statushound started (interval {}s, failure threshold {})",
        config.poll.interval_secs,
        config.poll.failure_threshold
    );

    match poll.run(cancel).await {
        Ok(()) => {
            tracing::info!("statushound stopped");
            Ok(())
        }
        Err(fatal) => {
            tracing::error!("{fatal}");
            std::process::exit(1);
        }
    }
}
