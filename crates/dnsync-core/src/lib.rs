// # dnsync-core
//
// Core library for reconciling DNS records against a JSON-RPC provider.
//
// ## Architecture Overview
//
// - **Record**: Closed set of record kinds plus a generic fallback, each
//   persisted kind carrying an optional provider-issued identity token
// - **Transport**: Trait for invoking a named remote procedure
// - **RecordCodec**: Trait for converting records to and from the provider shape
// - **ZoneEngine**: List / Append / Set / Delete over a zone, resolving
//   identities by (name, type) when the caller has none
// - **ProviderRegistry**: Plugin-based registry for providers
// - **CallContext**: Cancellation and deadlines for every remote call
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation is separate from wire details
// 2. **Explicit Construction**: Transports are built once and passed in
// 3. **Partial Progress**: Batch operations return what succeeded with the error
// 4. **No Hidden State**: Remote state is re-fetched per call, never cached

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DnsyncConfig, EngineConfig, ProviderConfig, RetryPolicy};
pub use context::CallContext;
pub use engine::ZoneEngine;
pub use error::{BatchError, BatchResult, Error, Result};
pub use record::{Record, RemoteRecord};
pub use registry::ProviderRegistry;
pub use traits::{ProviderFactory, ProviderParts, RecordCodec, Transport};
