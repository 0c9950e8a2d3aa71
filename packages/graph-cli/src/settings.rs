use anyhow::{Context, Result};
use dotenvy::dotenv;
use forum_client::RedditConfig;
use std::env;
use std::path::PathBuf;

/// Runtime settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    pub reddit: RedditConfig,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = RedditConfig::default();

        let requests_per_minute = match var("FORUM_REQUESTS_PER_MINUTE") {
            Some(raw) => raw
                .parse()
                .context("FORUM_REQUESTS_PER_MINUTE must be a positive number")?,
            None => defaults.requests_per_minute,
        };
        if requests_per_minute == 0 {
            anyhow::bail!("FORUM_REQUESTS_PER_MINUTE must be a positive number");
        }

        Ok(Self {
            reddit: RedditConfig {
                base_url: var("FORUM_BASE_URL").unwrap_or(defaults.base_url),
                user_agent: var("FORUM_USER_AGENT").unwrap_or(defaults.user_agent),
                top_window: var("FORUM_TOP_WINDOW").unwrap_or(defaults.top_window),
                requests_per_minute,
            },
            output_dir: var("GRAPH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("graphs")),
        })
    }
}
