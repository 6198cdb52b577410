//! Plugin-based provider registry
//!
//! The registry allows DNS providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in front ends.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsync_core::registry::ProviderRegistry;
//! use dnsync_core::config::{DnsyncConfig, ProviderConfig};
//!
//! let registry = ProviderRegistry::new();
//! dnsync_provider_njalla::register(&registry);
//!
//! let config = DnsyncConfig::new(ProviderConfig::njalla(token));
//! let engine = registry.create_engine(&config)?;
//! ```
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("njalla", Box::new(NjallaFactory));
//! }
//! ```

use crate::config::{DnsyncConfig, ProviderConfig, RetryPolicy};
use crate::engine::ZoneEngine;
use crate::error::{Error, Result};
use crate::traits::{ProviderFactory, ProviderParts};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based provider creation
///
/// The registry maintains a map of provider type names to factory objects,
/// allowing dynamic instantiation of providers based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered provider factories
    providers: RwLock<HashMap<String, Box<dyn ProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (must match [`ProviderConfig::type_name`])
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        let name = name.into();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name, factory);
    }

    /// Create a provider's transport and codec from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderParts)`: Created provider
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_provider(
        &self,
        config: &ProviderConfig,
        retry: &RetryPolicy,
    ) -> Result<ProviderParts> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config, retry)
    }

    /// Validate `config` and build a ready-to-use engine
    pub fn create_engine(&self, config: &DnsyncConfig) -> Result<ZoneEngine> {
        config.validate()?;
        let parts = self.create_provider(&config.provider, &config.retry)?;
        ZoneEngine::from_parts(parts, config.engine.clone())
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
