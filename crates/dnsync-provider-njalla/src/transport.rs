//! JSON-RPC transport with retry and backoff
//!
//! Every call is a single `POST` of a JSON-RPC 2.0 envelope to the API
//! endpoint. Transient failures (network errors, unreadable bodies, 5xx,
//! 429 and malformed envelopes) are retried with exponential backoff and
//! jitter; structured API errors and other 4xx statuses are returned at once.

use async_trait::async_trait;
use dnsync_core::config::RetryPolicy;
use dnsync_core::context::CallContext;
use dnsync_core::error::{Error, Result};
use dnsync_core::traits::Transport;
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Public Njalla API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://njal.la/api/1/";

/// Default timeout for a single HTTP attempt (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    id: &'static str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Outcome of one HTTP attempt
enum Attempt {
    Success(Value),
    Retry(Error),
    Fail(Error),
}

/// Njalla JSON-RPC transport
///
/// Holds only immutable state, so one instance can serve concurrent calls.
///
/// # Security
///
/// The Debug implementation does NOT expose the API token, and the token is
/// never logged.
pub struct JsonRpcTransport {
    /// API endpoint URL
    endpoint: String,

    /// API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// HTTP client with the per-attempt timeout applied
    client: reqwest::Client,

    /// Retry policy, fixed at construction
    retry: RetryPolicy,
}

impl std::fmt::Debug for JsonRpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcTransport")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<REDACTED>")
            .field("retry", &self.retry)
            .finish()
    }
}

impl JsonRpcTransport {
    /// Create a transport for the public endpoint
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `api_token` is empty.
    pub fn new(api_token: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        Self::with_options(api_token, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, retry)
    }

    /// Create a transport with an explicit endpoint and per-attempt timeout
    pub fn with_options(
        api_token: impl Into<String>,
        endpoint: impl Into<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Njalla API token cannot be empty"));
        }
        retry.validate()?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_token,
            client,
            retry,
        })
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Backoff before retry `retry_index` with a fresh jitter sample
    fn backoff(&self, retry_index: u32) -> Duration {
        let jitter = if self.retry.random_factor > 0.0 {
            rand::thread_rng().gen_range(0.0..=self.retry.random_factor)
        } else {
            0.0
        };
        self.retry.backoff_with_jitter(retry_index, jitter)
    }

    /// Send the envelope once and classify the outcome
    async fn attempt(&self, ctx: &CallContext, body: &[u8]) -> Attempt {
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Njalla {}", self.api_token))
            .body(body.to_vec());

        let exchange = async move {
            let response = request
                .send()
                .await
                .map_err(|e| Error::transport(format!("error making request: {}", e)))?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::transport(format!("error reading response body: {}", e)))?;
            Ok::<_, Error>((status, bytes))
        };

        // A finished context is terminal even if the exchange failed first.
        let (status, bytes) = match ctx.run(exchange).await {
            Ok(exchanged) => exchanged,
            Err(e) if ctx.is_done() => return Attempt::Fail(e),
            Err(e) => return Attempt::Retry(e),
        };

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry(Error::Http {
                status: status.as_u16(),
            });
        }
        if status.as_u16() >= 400 {
            return Attempt::Fail(Error::Http {
                status: status.as_u16(),
            });
        }

        let envelope: RpcResponse = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => return Attempt::Retry(Error::from(e).context("error unmarshaling response")),
        };

        match envelope.error {
            Some(err) => Attempt::Fail(Error::api(err.code, err.message)),
            None => Attempt::Success(envelope.result.unwrap_or(Value::Null)),
        }
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn invoke(&self, ctx: &CallContext, method: &str, params: Value) -> Result<Value> {
        let body = serde_json::to_vec(&RpcRequest {
            jsonrpc: "2.0",
            method,
            params: &params,
            id: "1",
        })
        .map_err(|e| Error::from(e).context("error marshaling request"))?;

        let attempts = self.retry.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.backoff(attempt - 1);
                debug!("Retrying {} in {:?} (attempt {}/{})", method, delay, attempt + 1, attempts);
                tokio::select! {
                    _ = ctx.done() => {
                        let err = ctx.err().unwrap_or(Error::DeadlineExceeded);
                        return Err(err.context("context cancelled during retry backoff"));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            match self.attempt(ctx, &body).await {
                Attempt::Success(result) => return Ok(result),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) => {
                    warn!(
                        "{} attempt {}/{} failed: {}",
                        method,
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(Error::RetriesExhausted {
            attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| Error::Other("no attempt was made".to_string())),
            ),
        })
    }

    fn provider_name(&self) -> &'static str {
        "njalla"
    }
}
