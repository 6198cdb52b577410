// # Transport Trait
//
// Defines the single-method RPC interface the reconciliation engine talks to.
//
// ## Implementations
//
// - Njalla JSON-RPC over HTTPS: `dnsync-provider-njalla` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::traits::{call, Transport};
// use dnsync_core::record::ListRecordsResponse;
//
// let listed: ListRecordsResponse = call(
//     transport.as_ref(),
//     &ctx,
//     "list-records",
//     &serde_json::json!({ "domain": "example.com" }),
// ).await?;
// ```

use crate::context::CallContext;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Remote procedure transport
///
/// One `invoke` is one logical remote call. Implementations own retry,
/// backoff and failure classification; callers only see the final outcome.
///
/// # Thread Safety
///
/// Implementations must be usable from concurrent tasks. They may hold
/// immutable policy state only: nothing is written during a call.
///
/// # Cancellation
///
/// Implementations must stop waiting (between attempts or on an in-flight
/// request) as soon as `ctx` is cancelled or its deadline passes, and return
/// the context's error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with `params` and return the raw result payload
    ///
    /// # Errors
    ///
    /// - `Error::Api` for a structured error returned by the service (never retried)
    /// - `Error::Http` for a non-retryable status
    /// - `Error::RetriesExhausted` when every allowed attempt failed transiently
    /// - `Error::Cancelled` / `Error::DeadlineExceeded` when `ctx` completes first
    async fn invoke(
        &self,
        ctx: &CallContext,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Invoke `method` with typed parameters and decode the result into `R`
///
/// Parameter serialization and result decoding failures are terminal and
/// never reach the transport's retry loop.
pub async fn call<P, R>(
    transport: &dyn Transport,
    ctx: &CallContext,
    method: &str,
    params: &P,
) -> Result<R>
where
    P: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    let params = serde_json::to_value(params)
        .map_err(|e| Error::from(e).context("error marshaling request"))?;
    let result = transport.invoke(ctx, method, params).await?;
    serde_json::from_value(result).map_err(|e| Error::from(e).context("error unmarshaling result"))
}

/// Invoke `method` and discard the result payload
pub async fn call_unit<P>(
    transport: &dyn Transport,
    ctx: &CallContext,
    method: &str,
    params: &P,
) -> Result<()>
where
    P: Serialize + ?Sized + Sync,
{
    let params = serde_json::to_value(params)
        .map_err(|e| Error::from(e).context("error marshaling request"))?;
    transport.invoke(ctx, method, params).await?;
    Ok(())
}
