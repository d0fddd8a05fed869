mod file_config;

pub use file_config::FileConfig;

use crate::feed::DEFAULT_FEED_BASE_URL;
use crate::rewards::DEFAULT_CATALOG_SIZE;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY_CAP: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub feed_base_url: String,
    pub poll_interval_secs: u64,
    pub reward_catalog_size: u32,
    pub concurrency_cap: usize,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            reward_catalog_size: DEFAULT_CATALOG_SIZE,
            concurrency_cap: DEFAULT_CONCURRENCY_CAP,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub feed_base_url: String,
    pub poll_interval: Duration,
    pub reward_catalog_size: u32,
    /// `None` when accounts are processed without a cap.
    pub concurrency_cap: Option<usize>,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified on the command line or in config file")
            })?;

        let feed_base_url = file
            .feed_base_url
            .unwrap_or_else(|| cli.feed_base_url.clone());
        let url = reqwest::Url::parse(&feed_base_url)
            .with_context(|| format!("Invalid feed base URL: {}", feed_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Feed base URL must be http or https: {}", feed_base_url);
        }

        let poll_interval_secs = file.poll_interval_secs.unwrap_or(cli.poll_interval_secs);
        if poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than 0");
        }

        let reward_catalog_size = file.reward_catalog_size.unwrap_or(cli.reward_catalog_size);
        if reward_catalog_size == 0 {
            bail!("reward_catalog_size must be greater than 0");
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(cli.request_timeout_secs);
        if request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than 0");
        }

        let concurrency_cap = match file.concurrency_cap.unwrap_or(cli.concurrency_cap) {
            0 => None,
            cap => Some(cap),
        };

        let shutdown_grace_secs = file
            .shutdown_grace_secs
            .unwrap_or(cli.shutdown_grace_secs);

        Ok(Self {
            db_path,
            feed_base_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            reward_catalog_size,
            concurrency_cap,
            request_timeout: Duration::from_secs(request_timeout_secs),
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
        })
    }
}
