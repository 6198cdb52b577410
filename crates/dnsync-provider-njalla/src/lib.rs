// # Njalla DNS Provider
//
// This crate provides the Njalla provider for dnsync: a JSON-RPC transport
// and the record codec for Njalla's record shape.
//
// ## Transport behaviour
//
// - One `POST` per attempt to `https://njal.la/api/1/` (overridable)
// - `Authorization: Njalla <token>` on every request
// - Network errors, unreadable bodies, HTTP 5xx / 429 and malformed
//   envelopes are retried with exponential backoff and jitter
// - Structured API errors and other HTTP 4xx are returned immediately
// - Backoff waits end early when the call context is cancelled
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - list-records `{domain}`
// - add-record `{domain, type, name, content, ttl, ...}`
// - edit-record `{id, domain, type, name, content, ttl, ...}`
// - remove-record `{domain, id}`

pub mod codec;
pub mod transport;

pub use codec::NjallaCodec;
pub use transport::{DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, JsonRpcTransport};

use dnsync_core::config::{ProviderConfig, RetryPolicy};
use dnsync_core::traits::{ProviderFactory, ProviderParts};
use dnsync_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Factory for creating Njalla providers
pub struct NjallaFactory;

impl ProviderFactory for NjallaFactory {
    fn create(&self, config: &ProviderConfig, retry: &RetryPolicy) -> Result<ProviderParts> {
        match config {
            ProviderConfig::Njalla {
                api_token,
                endpoint,
                request_timeout_secs,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Njalla API token is required"));
                }

                let endpoint = endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
                if endpoint != DEFAULT_ENDPOINT {
                    tracing::info!("Using Njalla endpoint override: {}", endpoint);
                }

                let transport = JsonRpcTransport::with_options(
                    api_token.clone(),
                    endpoint,
                    Duration::from_secs(*request_timeout_secs),
                    *retry,
                )?;

                Ok(ProviderParts {
                    transport: Arc::new(transport),
                    codec: Arc::new(NjallaCodec),
                })
            }
            _ => Err(Error::config("Invalid config for Njalla provider")),
        }
    }
}

/// Register the Njalla provider with a registry
///
/// This function should be called during initialization to make the
/// Njalla provider available.
///
/// # Example
///
/// ```rust
/// use dnsync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dnsync_provider_njalla::register(&registry);
/// assert!(registry.has_provider("njalla"));
/// ```
pub fn register(registry: &dnsync_core::ProviderRegistry) {
    registry.register_provider("njalla", Box::new(NjallaFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsync_core::{DnsyncConfig, ProviderRegistry};

    #[test]
    fn test_factory_creation() {
        let parts = NjallaFactory
            .create(&ProviderConfig::njalla("test_token"), &RetryPolicy::default())
            .unwrap();
        assert_eq!(parts.transport.provider_name(), "njalla");
    }

    #[test]
    fn test_factory_missing_token() {
        let result = NjallaFactory.create(&ProviderConfig::njalla(""), &RetryPolicy::default());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Njalla API token is required"));
    }

    #[test]
    fn test_factory_rejects_foreign_config() {
        let config = ProviderConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };
        assert!(NjallaFactory.create(&config, &RetryPolicy::default()).is_err());
    }

    #[test]
    fn test_registered_engine_creation() {
        let registry = ProviderRegistry::new();
        register(&registry);

        let config = DnsyncConfig::new(ProviderConfig::Njalla {
            api_token: "token".to_string(),
            endpoint: Some("http://127.0.0.1:9/".to_string()),
            request_timeout_secs: 5,
        });
        let engine = registry.create_engine(&config).unwrap();
        assert_eq!(engine.provider_name(), "njalla");
    }
}
