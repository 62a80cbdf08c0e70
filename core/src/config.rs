//! Client configuration.
//!
//! All configuration is driven by environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TASKS_API_URL` | `http://localhost:3000/tasks` | Task collection endpoint |
//! | `TASKS_API_TIMEOUT_MS` | `30000` | Per-exchange timeout; `0` disables it |

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/tasks";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Collection URL, without a trailing slash.
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("TASKS_API_URL") {
            config.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("TASKS_API_TIMEOUT_MS") {
            match v.parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(ms) => config.timeout = Some(Duration::from_millis(ms)),
                Err(_) => warn!(value = %v, "ignoring invalid TASKS_API_TIMEOUT_MS"),
            }
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
