//! Provider factory trait
//!
//! A provider contributes a [`Transport`] and a [`RecordCodec`]. Factories
//! build both from configuration once, at the boundary; the resulting
//! handles are shared with the engine by reference.

use super::{RecordCodec, Transport};
use crate::config::{ProviderConfig, RetryPolicy};
use std::sync::Arc;

/// Transport and codec for one configured provider
#[derive(Clone)]
pub struct ProviderParts {
    pub transport: Arc<dyn Transport>,
    pub codec: Arc<dyn RecordCodec>,
}

impl std::fmt::Debug for ProviderParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderParts")
            .field("provider", &self.transport.provider_name())
            .finish()
    }
}

/// Helper trait for constructing providers from configuration
pub trait ProviderFactory: Send + Sync {
    /// Create the provider's transport and codec
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the configuration does not belong to this
    /// provider or a required credential is missing. No remote call is made.
    fn create(
        &self,
        config: &ProviderConfig,
        retry: &RetryPolicy,
    ) -> Result<ProviderParts, crate::Error>;
}
