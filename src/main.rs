use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tracker_rewards::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_CONCURRENCY_CAP, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_SECS,
};
use tracker_rewards::feed::DEFAULT_FEED_BASE_URL;
use tracker_rewards::rewards::DEFAULT_CATALOG_SIZE;
use tracker_rewards::{
    default_migrations, Distributor, MigrationRunner, PollScheduler, RewardCatalog,
    SqliteRewardStore, TrackerFeedClient,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite database holding accounts and their rewards.
    #[clap(value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the tracker whose notifications are polled.
    #[clap(long, default_value = DEFAULT_FEED_BASE_URL)]
    pub feed_base_url: String,

    /// Seconds to wait after a distribution pass before starting the next one.
    #[clap(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Number of distinct rewards that can be drawn.
    #[clap(long, default_value_t = DEFAULT_CATALOG_SIZE)]
    pub reward_catalog_size: u32,

    /// Maximum number of accounts processed at the same time, 0 for no limit.
    #[clap(long, default_value_t = DEFAULT_CONCURRENCY_CAP)]
    pub concurrency_cap: usize,

    /// Timeout of a single feed request, in seconds.
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for a running pass, in seconds.
    #[clap(long, default_value_t = DEFAULT_SHUTDOWN_GRACE_SECS)]
    pub shutdown_grace_secs: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            feed_base_url: self.feed_base_url.clone(),
            poll_interval_secs: self.poll_interval_secs,
            reward_catalog_size: self.reward_catalog_size,
            concurrency_cap: self.concurrency_cap,
            request_timeout_secs: self.request_timeout_secs,
            shutdown_grace_secs: self.shutdown_grace_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening reward database at {:?}...", app_config.db_path);
    let store = SqliteRewardStore::new(&app_config.db_path)?;

    let report = store
        .run_migrations(&MigrationRunner::new(default_migrations()))
        .inspect_err(|e| error!("Database migration failed: {:#}", e))
        .context("Refusing to start with an unmigrated database")?;
    info!("Database schema at version {}", report.to_version);

    let feed = TrackerFeedClient::new(&app_config.feed_base_url, app_config.request_timeout)?;
    let catalog = RewardCatalog::new(app_config.reward_catalog_size)?;
    let distributor = Distributor::new(
        Arc::new(store),
        Arc::new(feed),
        catalog,
        app_config.concurrency_cap,
    );
    let scheduler = PollScheduler::new(
        distributor,
        app_config.poll_interval,
        app_config.shutdown_grace,
    );

    let shutdown_token = CancellationToken::new();
    tokio::spawn({
        let shutdown_token = shutdown_token.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => error!("Failed to listen for Ctrl+C, shutting down: {}", e),
            }
            shutdown_token.cancel();
        }
    });

    info!(
        "Polling {} every {:?} (concurrency cap: {:?})",
        app_config.feed_base_url, app_config.poll_interval, app_config.concurrency_cap
    );
    scheduler.run(shutdown_token).await
}
