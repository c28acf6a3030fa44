//! 客户端配置：可从 YAML 文件或环境变量加载。
//!
//! Construction config for a [`RestClient`](crate::RestClient).
//!
//! ```rust
//! use rest_pipeline::config::PipelineConfig;
//!
//! let cfg = PipelineConfig::from_yaml_str(r#"
//! base_url: "https://api.example.com/v1"
//! timeout_ms: 5000
//! headers:
//!   accept: application/json
//! retry:
//!   max_retries: 2
//! "#).unwrap();
//!
//! assert_eq!(cfg.timeout_ms, 5000);
//! assert_eq!(cfg.retry.unwrap().retry_delay_ms, 1000);
//! ```

use crate::error::{Error, ErrorContext};
use crate::interceptors::RetryConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// Sent with every request; per-call headers win on conflict.
    pub headers: HashMap<String, String>,
    /// Installs a retry interceptor after any explicitly registered ones.
    pub retry: Option<RetryConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: HashMap::new(),
            retry: None,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults overridden by environment variables:
    ///
    /// - `REST_PIPELINE_BASE_URL`
    /// - `REST_PIPELINE_TIMEOUT_MS`
    /// - `REST_PIPELINE_MAX_RETRIES` (enables retries with default delays)
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(base_url) = env::var("REST_PIPELINE_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.base_url = Some(base_url);
            }
        }
        if let Some(ms) = env::var("REST_PIPELINE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.timeout_ms = ms;
        }
        if let Some(n) = env::var("REST_PIPELINE_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.retry = Some(self.retry.take().unwrap_or_default().with_max_retries(n));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("timeout_ms")
                    .with_source("pipeline_config"),
            ));
        }
        if let Some(retry) = &self.retry {
            if retry
                .retryable_status_codes
                .iter()
                .any(|s| !(100..=599).contains(s))
            {
                return Err(Error::configuration_with_context(
                    "retryable status codes must be valid HTTP statuses",
                    ErrorContext::new()
                        .with_field_path("retry.retryable_status_codes")
                        .with_details(format!("{:?}", retry.retryable_status_codes))
                        .with_source("pipeline_config"),
                ));
            }
        }
        Ok(())
    }
}
