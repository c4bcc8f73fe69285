use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "SocialSentimentTracker/1.0";
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
pub const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Ten years.
pub const MAX_LOOKBACK_HOURS: i64 = 24 * 365 * 10;

/// Settings for a mention collector, fixed once the collector is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// Overrides the topic-type default communities when non-empty.
    pub subreddits: Vec<String>,
    pub search_limit: u32,
    pub comment_limit: usize,
    pub lookback_hours: i64,
    pub request_timeout_secs: u64,
    pub api_base: String,
    pub token_url: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            subreddits: Vec::new(),
            search_limit: 50,
            comment_limit: 10,
            lookback_hours: 24,
            request_timeout_secs: 30,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

impl CollectorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: CollectorConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        debug!("Loading collector config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Applies `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and
    /// `REDDIT_USER_AGENT` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REDDIT_CLIENT_ID") {
            self.client_id = value;
        }
        if let Some(value) = lookup("REDDIT_CLIENT_SECRET") {
            self.client_secret = value;
        }
        if let Some(value) = lookup("REDDIT_USER_AGENT") {
            self.user_agent = value;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_hours <= 0 || self.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(ConfigError::InvalidValue {
                field: "lookback_hours".to_string(),
                value: self.lookback_hours.to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
