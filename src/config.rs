//! Configuration management for the status poller

use crate::forwarding::{self, ForwardingRule};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hostname the dashboard is served from
    pub hostname: String,

    /// Explicit API base URL, skips hostname based resolution when set
    pub base_url: Option<String>,

    /// API base URL used when the hostname is not behind a forwarding domain
    pub local_base_url: String,

    /// Dev/preview suffix pair used to detect and rewrite forwarded hosts
    pub forwarding: ForwardingRule,

    /// Delay between fetch cycles
    pub poll_interval: Duration,

    /// HTTP timeout for each endpoint request
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            base_url: None,
            local_base_url: "http://localhost/api".to_string(),
            forwarding: ForwardingRule::default(),
            poll_interval: Duration::from_millis(5000),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(hostname) = env::var("STATUS_HOSTNAME") {
            config.hostname = hostname;
        }

        if let Ok(base_url) = env::var("STATUS_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = Some(base_url);
            }
        }

        if let Ok(local_base_url) = env::var("STATUS_LOCAL_BASE_URL") {
            config.local_base_url = local_base_url;
        }

        if let Ok(dev_suffix) = env::var("FORWARDING_DEV_SUFFIX") {
            config.forwarding.dev_suffix = dev_suffix;
        }

        if let Ok(preview_suffix) = env::var("FORWARDING_PREVIEW_SUFFIX") {
            config.forwarding.preview_suffix = preview_suffix;
        }

        if let Ok(interval) = env::var("POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse::<u64>() {
                config.poll_interval = Duration::from_millis(ms);
            }
        }

        if let Ok(timeout) = env::var("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.hostname.trim().is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        if self.local_base_url.trim().is_empty() {
            return Err("local_base_url cannot be empty".to_string());
        }

        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(format!("base_url must be an http(s) URL, got {}", base_url));
            }
        }

        if self.forwarding.dev_suffix.is_empty() || self.forwarding.preview_suffix.is_empty() {
            return Err("forwarding suffixes cannot be empty".to_string());
        }

        if self.poll_interval.is_zero() {
            return Err("poll_interval must be greater than 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Base URL every endpoint path is appended to
    pub fn api_base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim_end_matches('/').to_string(),
            None => forwarding::resolve_base_url(
                &self.hostname,
                &self.forwarding,
                &self.local_base_url,
            ),
        }
    }

    /// Forwarded host service links collapse to, when running behind one
    pub fn forward_host(&self) -> Option<String> {
        self.forwarding.forward_host(&self.hostname)
    }
}
