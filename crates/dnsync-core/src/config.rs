//! Configuration types for dnsync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main dnsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Retry policy for the provider transport
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DnsyncConfig {
    /// Create a configuration for `provider` with default policies
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.retry.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Njalla JSON-RPC provider
    Njalla {
        /// API token
        api_token: String,
        /// Endpoint override (defaults to the public API)
        #[serde(default)]
        endpoint: Option<String>,
        /// Timeout for a single HTTP attempt (in seconds)
        #[serde(default = "default_request_timeout_secs")]
        request_timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Njalla configuration with default endpoint and timeout
    pub fn njalla(api_token: impl Into<String>) -> Self {
        ProviderConfig::Njalla {
            api_token: api_token.into(),
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Njalla {
                api_token,
                request_timeout_secs,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("API token is required"));
                }
                if *request_timeout_secs == 0 {
                    return Err(crate::Error::config("Request timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Njalla { .. } => "njalla",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::njalla(String::new())
    }
}

/// Retry policy for a transport
///
/// Constructed once per transport and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (in milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single backoff (in milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Maximum jitter as a fraction of the exponential delay
    #[serde(default = "default_random_factor")]
    pub random_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            random_factor: default_random_factor(),
        }
    }
}

impl RetryPolicy {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Total number of attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retry `attempt` (0 = first retry) for a jitter sample
    ///
    /// `jitter` is clamped to `[0, random_factor]`; the result is
    /// `min(max_delay, base_delay * 2^attempt * (1 + jitter))`.
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = jitter.clamp(0.0, self.random_factor.max(0.0));
        let exponential = self.base_delay_ms as f64 * 2_f64.powi(attempt.min(62) as i32);
        let delay_ms = (exponential * (1.0 + jitter)).min(self.max_delay_ms as f64);
        Duration::from_micros((delay_ms * 1000.0) as u64)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(0.0..=1.0).contains(&self.random_factor) {
            return Err(crate::Error::config(format!(
                "Retry random factor must be between 0 and 1. Got: {}",
                self.random_factor
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(crate::Error::config(format!(
                "Retry base delay ({}ms) exceeds max delay ({}ms)",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deadline applied to Set/Delete when the caller's context has none (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Timeout for the existing-record lookup inside Set/Delete (in seconds)
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Timeout for each per-record remote call (in seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: default_operation_timeout_secs(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.operation_timeout_secs == 0
            || self.lookup_timeout_secs == 0
            || self.call_timeout_secs == 0
        {
            return Err(crate::Error::config("Engine timeouts must be > 0"));
        }
        Ok(())
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_random_factor() -> f64 {
    0.5
}

fn default_operation_timeout_secs() -> u64 {
    60
}

fn default_lookup_timeout_secs() -> u64 {
    20
}

fn default_call_timeout_secs() -> u64 {
    10
}
