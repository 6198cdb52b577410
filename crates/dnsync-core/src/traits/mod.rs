//! Core traits for dnsync
//!
//! This module defines the abstract interfaces that providers implement.
//!
//! - [`Transport`]: Invoke a named remote procedure
//! - [`RecordCodec`]: Convert records to and from the provider representation
//! - [`ProviderFactory`]: Build both from configuration

pub mod codec;
pub mod provider;
pub mod transport;

pub use codec::RecordCodec;
pub use provider::{ProviderFactory, ProviderParts};
pub use transport::{Transport, call, call_unit};
