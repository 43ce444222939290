//! Client configuration and reconnect policy

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::api::http::HUB_PATH;
use crate::config::parse_or;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5080";
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Fixed-interval reconnect policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between connection attempts
    pub interval: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Whether another attempt is allowed after `failures` consecutive failures
    pub fn allows(&self, failures: u32) -> bool {
        self.max_retries.map_or(true, |max| failures <= max)
    }
}

/// Settings for the sync agent
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL of the server, without trailing slash
    pub server_url: String,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Load from `TODO_SERVER_URL`, `TODO_RETRY_INTERVAL_MS`,
    /// `TODO_MAX_RETRIES` and `TODO_REQUEST_TIMEOUT_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config =
            Self::new(lookup("TODO_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()));

        config.retry.interval = lookup("TODO_RETRY_INTERVAL_MS")
            .map(|v| parse_or("TODO_RETRY_INTERVAL_MS", Some(v), 0u64))
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_INTERVAL);

        config.retry.max_retries = lookup("TODO_MAX_RETRIES").and_then(|raw| {
            let raw = raw.trim();
            if raw.eq_ignore_ascii_case("unbounded") {
                return None;
            }
            match raw.parse() {
                Ok(max) => Some(max),
                Err(_) => {
                    warn!(value = raw, "ignoring unparsable TODO_MAX_RETRIES");
                    None
                }
            }
        });

        let timeout_ms = parse_or(
            "TODO_REQUEST_TIMEOUT_MS",
            lookup("TODO_REQUEST_TIMEOUT_MS"),
            DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        );
        config.request_timeout = Duration::from_millis(timeout_ms);

        config
    }

    /// URL of the REST collection
    pub fn todos_url(&self) -> String {
        format!("{}/todos", self.server_url)
    }

    /// WebSocket URL of the push channel
    pub fn hub_url(&self) -> String {
        let base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.server_url.clone()
        };
        format!("{}{}", base, HUB_PATH)
    }
}
