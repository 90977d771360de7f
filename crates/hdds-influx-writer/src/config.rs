// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer configuration.
//!
//! Built programmatically or loaded from YAML:
//!
//! ```yaml
//! url: "http://localhost:8086"
//! database: "telemetry"
//! username: "writer"        # optional, enables basic auth
//! password: "secret"        # optional
//! insecure_skip_verify: false
//! flush_interval_ms: 1000
//! connect_timeout_ms: 5000
//! request_timeout_ms: 30000 # optional, unbounded when absent
//! ```

use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default flush interval (milliseconds).
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Default TCP connect timeout (milliseconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Connection settings for an InfluxDB 1.x `/write` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WriterConfig {
    /// Base URL of the server (e.g., "http://localhost:8086").
    pub url: String,
    /// Target database, sent as the `db` query parameter.
    pub database: String,
    /// Basic auth user. Empty or absent disables authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,
    /// Skip certificate verification. Only honored for `https` URLs.
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Period of the background flush task.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Overall request timeout. None waits for the response indefinitely.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl WriterConfig {
    /// Create a configuration with default timings and no credentials.
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: None,
            password: None,
            insecure_skip_verify: false,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: None,
        }
    }

    /// Set basic auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Skip TLS certificate verification for `https` endpoints.
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Override the flush interval.
    ///
    /// Sub-millisecond intervals are rounded up to 1 ms. A zero interval is
    /// kept as is and rejected by [`validate`](Self::validate).
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = if interval.is_zero() {
            0
        } else {
            u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
        };
        self
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check the configuration, including the endpoint URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".into()));
        }
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::Invalid("flush_interval_ms must be > 0".into()));
        }
        self.write_url()?;
        Ok(())
    }

    /// Resolve the `/write?db=<database>` URL.
    ///
    /// `/write` is an absolute reference, so any path on the base URL is
    /// replaced rather than extended. Any query on the base URL is dropped.
    pub fn write_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };

        let base = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
        let mut url = base.join("/write").map_err(|e| invalid(e.to_string()))?;
        url.query_pairs_mut().clear().append_pair("db", &self.database);
        Ok(url)
    }

    /// Credentials to attach, if a non-empty username is configured.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match self.username.as_deref() {
            Some(user) if !user.is_empty() => Some((user, self.password.as_deref().unwrap_or(""))),
            _ => None,
        }
    }

    /// Whether certificate verification should actually be disabled.
    pub fn skips_tls_verification(&self) -> bool {
        self.insecure_skip_verify
            && Url::parse(&self.url).is_ok_and(|url| url.scheme() == "https")
    }

    /// Flush interval as a `Duration`.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout as a `Duration`, if bounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
