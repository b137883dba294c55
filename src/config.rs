use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FeedError, Result};
use crate::selector::{CandidateRange, Policy, Selector, MAX_BATCH_SIZE};
use crate::xkcd::API_BASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Always the newest comic.
    Latest,
    /// One random comic not picked by an earlier run.
    #[default]
    RandomUnseen,
    /// The newest comic plus a handful of random older ones.
    Batch,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_include_latest")]
    pub include_latest: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_feed_file")]
    pub feed_file: PathBuf,
    #[serde(default = "default_self_link")]
    pub self_link: String,
    pub templates_dir: Option<PathBuf>,
}

fn default_include_latest() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_api_base() -> String {
    API_BASE.to_string()
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_state_file() -> PathBuf {
    PathBuf::from("rss/xkcd/seen.json")
}

fn default_feed_file() -> PathBuf {
    PathBuf::from("rss/xkcd/feed.xml")
}

// Stand-in until the published location of the feed is configured.
fn default_self_link() -> String {
    "https://example.com/rss/xkcd/feed.xml".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            include_latest: default_include_latest(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch_size: default_batch_size(),
            api_base: default_api_base(),
            http_timeout_secs: default_http_timeout_secs(),
            state_file: default_state_file(),
            feed_file: default_feed_file(),
            self_link: default_self_link(),
            templates_dir: None,
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)
                .map_err(|e| FeedError::Config(format!("{}: {}", path.display(), e)))?;
            serde_json::from_str(&data)
                .map_err(|e| FeedError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(FeedError::Config(format!(
                "batch_size {} exceeds the limit of {}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }
        if self.self_link == default_self_link() {
            tracing::warn!("self_link is not configured, feed advertises {}", self.self_link);
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Selector for the single-comic modes.
    pub fn selector(&self, policy: Policy) -> Selector {
        Selector {
            policy,
            range: if self.include_latest {
                CandidateRange::Inclusive
            } else {
                CandidateRange::ExcludeLatest
            },
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}
