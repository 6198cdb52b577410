//! Record codec trait
//!
//! Maps between the caller-facing [`Record`] and the provider's
//! [`RemoteRecord`]. The engine never inspects record payloads itself.

use crate::error::Result;
use crate::record::{Record, RemoteRecord};

/// Bidirectional record conversion for one provider
///
/// # Contract
///
/// - `encode` expresses the record name relative to `zone` and the TTL in
///   whole seconds, and copies the identity token (if any) into `id`.
/// - Types without a dedicated [`Record`] kind round-trip through
///   [`Record::Generic`].
/// - `decode` must fail for address records whose content is not a valid
///   IP address.
pub trait RecordCodec: Send + Sync {
    /// Convert a caller record into the provider representation
    fn encode(&self, record: &Record, zone: &str) -> Result<RemoteRecord>;

    /// Convert a provider record into the caller representation
    fn decode(&self, record: RemoteRecord) -> Result<Record>;
}
