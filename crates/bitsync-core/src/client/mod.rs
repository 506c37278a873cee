use std::time::Duration;

use anyhow::Result;
use bitsync_types::errors::RpcError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

pub mod node;

pub use node::NodeProvider;

/// Backoff policy for transient RPC failures: the delay doubles per attempt,
/// capped at `max_delay`. Node errors and malformed responses are never
/// retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt)).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// Client for the node's JSON-RPC interface. Every call is bounded by the
/// configured timeout; transient failures are retried per [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct Client {
    inner: reqwest::Client,
    url: Url,
    user: Option<String>,
    password: Option<String>,
    retry: RetryPolicy,
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl Client {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let url = Url::parse(&config.url)?;
        let inner = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { inner, url, user: config.user, password: config.password, retry: config.retry })
    }

    /// Single JSON-RPC exchange with error classification and no retry.
    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
    ) -> Result<T, RpcError> {
        let payload = json!({
            "jsonrpc": "1.0",
            "id": "bitsync",
            "method": method,
            "params": params,
        });

        let mut request = self.inner.post(self.url.clone()).json(&payload);
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        // The node reports RPC-level errors in the body with a non-2xx
        // status, so the body is parsed regardless of status.
        let response = request.send().await.map_err(classify_transport_error)?;
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|err| RpcError::MalformedResponse(err.to_string()))?;

        if let Some(err) = body.error {
            return Err(RpcError::Node { code: err.code, message: err.message });
        }
        let result = body
            .result
            .ok_or_else(|| RpcError::MalformedResponse("response has no result field".to_string()))?;
        serde_json::from_value(result).map_err(|err| {
            tracing::error!(method, error = %err, "failed to decode rpc result");
            RpcError::MalformedResponse(err.to_string())
        })
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        retry_call(self.retry, method, || self.call_once(method, &params)).await
    }
}

fn classify_transport_error(err: reqwest::Error) -> RpcError {
    if err.is_timeout() {
        RpcError::Timeout
    } else if err.is_connect() {
        RpcError::ConnectionRefused
    } else {
        RpcError::MalformedResponse(err.to_string())
    }
}

/// Drive `op` to completion, retrying transient failures up to
/// `policy.max_retries` times with exponential backoff. Everything else
/// surfaces immediately: retrying a node error or a malformed response won't
/// help.
pub async fn retry_call<T, F, Fut>(policy: RetryPolicy, method: &str, mut op: F) -> Result<T, RpcError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RpcError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                attempt += 1;
                tracing::warn!(
                    method,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient rpc failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn delay_doubles_per_attempt_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1), "capped at max_delay");
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let attempts = AtomicU32::new(0);

        let result: Result<i64, RpcError> = retry_call(fast_policy(3), "getblockcount", || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(RpcError::Timeout)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3, "timeout on attempts 1-2, success on 3");
    }

    #[tokio::test]
    async fn retries_exhaust_and_surface_the_transient_error() {
        let attempts = AtomicU32::new(0);

        let result: Result<i64, RpcError> = retry_call(fast_policy(3), "getblockcount", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RpcError::ConnectionRefused) }
        })
        .await;

        assert!(matches!(result, Err(RpcError::ConnectionRefused)));
        assert_eq!(attempts.load(Ordering::SeqCst), 4, "one initial attempt plus three retries");
    }

    #[tokio::test]
    async fn node_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<i64, RpcError> = retry_call(fast_policy(3), "getblock", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RpcError::Node { code: -5, message: "Block not found".to_string() }) }
        })
        .await;

        assert!(matches!(result, Err(RpcError::Node { code: -5, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_responses_are_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<i64, RpcError> = retry_call(fast_policy(3), "getblock", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RpcError::MalformedResponse("unexpected shape".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(RpcError::MalformedResponse(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
