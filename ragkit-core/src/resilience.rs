//! Retry-with-backoff and ordered fallback chains for remote calls.
//!
//! Every remote-facing capability in the pipeline (retriever backends,
//! generation clients) can be wrapped here: [`call_with_retry`] applies a
//! [`RetryPolicy`] to a single operation, while [`ResilientRetriever`] and
//! [`ResilientGenerationClient`] consume an ordered fallback list, giving
//! each link a fresh attempt budget.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::{Query, ScoredDocument};
use crate::error::{ErrorKind, RagError, Result};
use crate::generation::{Completion, GenerationClient, GenerationRequest, TokenStream};
use crate::retriever::RetrieverBackend;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Exponential backoff, doubling per attempt up to a cap.
    Exponential {
        /// Delay before the first retry in milliseconds.
        initial_delay_ms: u64,
        /// Upper bound on the delay in milliseconds.
        max_delay_ms: u64,
    },
    /// Exponential backoff with centred random jitter.
    ExponentialWithJitter {
        /// Delay before the first retry in milliseconds.
        initial_delay_ms: u64,
        /// Upper bound on the delay in milliseconds.
        max_delay_ms: u64,
        /// Width of the jitter window in milliseconds.
        jitter_ms: u64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::ExponentialWithJitter { initial_delay_ms: 1000, max_delay_ms: 30000, jitter_ms: 500 }
    }
}

impl BackoffStrategy {
    /// Calculate the delay before the retry following the given attempt
    /// (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Exponential { initial_delay_ms, max_delay_ms } => {
                let delay = initial_delay_ms.saturating_mul(2u64.pow(attempt.min(10)));
                Duration::from_millis(delay.min(*max_delay_ms))
            }
            Self::ExponentialWithJitter { initial_delay_ms, max_delay_ms, jitter_ms } => {
                let base = initial_delay_ms.saturating_mul(2u64.pow(attempt.min(10)));
                let capped = base.min(*max_delay_ms);
                let jitter = if *jitter_ms > 0 {
                    use rand::Rng;
                    let mut rng = rand::thread_rng();
                    rng.gen_range(0..*jitter_ms) as i64 - (*jitter_ms as i64 / 2)
                } else {
                    0
                };
                Duration::from_millis((capped as i64 + jitter).max(0) as u64)
            }
        }
    }
}

/// Retry policy for remote calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (≥ 1).
    pub max_attempts: u32,
    /// Backoff strategy applied between attempts.
    pub backoff: BackoffStrategy,
    /// Error kinds that trigger a retry. Anything else propagates at once.
    pub retry_on: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::default(),
            retry_on: vec![ErrorKind::RateLimited, ErrorKind::TransientNetwork],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::Fixed { delay_ms: 0 },
            retry_on: Vec::new(),
        }
    }

    /// Override the attempt budget (clamped to at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether the policy retries the given error.
    pub fn should_retry(&self, error: &RagError) -> bool {
        self.retry_on.contains(&error.kind())
    }
}

/// Invoke `operation` under the given retry policy.
///
/// Performs at most `policy.max_attempts` invocations, sleeping
/// `policy.backoff.delay(n)` before retry `n + 1`. Errors outside
/// `policy.retry_on` propagate immediately; the final error is returned
/// once the budget is exhausted.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        if attempt > 0 {
            let delay = policy.backoff.delay(attempt - 1);
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt = attempt + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                attempt += 1;
                if attempt < max_attempts && policy.should_retry(&error) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "attempt failed, will retry"
                    );
                    continue;
                }
                return Err(error);
            }
        }
    }
}

/// An ordered fallback chain of retriever backends with per-link retries.
///
/// Each link gets a fresh attempt budget. A link whose retries are
/// exhausted on a retryable error hands over to the next link; a
/// non-retryable error propagates immediately, since the same input would
/// fail everywhere.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::{ResilientRetriever, RetryPolicy};
///
/// let retriever = ResilientRetriever::new(vec![primary, secondary], RetryPolicy::default())?;
/// let docs = retriever.search(&query, 5).await?;
/// ```
pub struct ResilientRetriever {
    name: String,
    chain: Vec<Arc<dyn RetrieverBackend>>,
    policy: RetryPolicy,
}

impl ResilientRetriever {
    /// Create a fallback chain. The first backend is the primary.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chain` is empty.
    pub fn new(chain: Vec<Arc<dyn RetrieverBackend>>, policy: RetryPolicy) -> Result<Self> {
        if chain.is_empty() {
            return Err(RagError::Config("fallback chain needs at least one backend".to_string()));
        }
        let name = format!(
            "fallback({})",
            chain.iter().map(|b| b.name()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(Self { name, chain, policy })
    }
}

#[async_trait]
impl RetrieverBackend for ResilientRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &Query, k: usize) -> Result<Vec<ScoredDocument>> {
        let mut last_error = None;
        for backend in &self.chain {
            match call_with_retry(&self.policy, backend.name(), || backend.search(query, k)).await {
                Ok(results) => return Ok(results),
                Err(error) if self.policy.should_retry(&error) => {
                    warn!(
                        backend = backend.name(),
                        error = %error,
                        "backend exhausted its retry budget, trying next fallback"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        Err(last_error
            .unwrap_or_else(|| RagError::BackendUnavailable("no backends configured".to_string())))
    }
}

/// An ordered fallback chain of generation clients with per-link retries.
///
/// Mirrors [`ResilientRetriever`] for the generation stage. For streaming,
/// only stream establishment is retried; an established stream is never
/// restarted.
pub struct ResilientGenerationClient {
    name: String,
    chain: Vec<Arc<dyn GenerationClient>>,
    policy: RetryPolicy,
}

impl ResilientGenerationClient {
    /// Create a fallback chain. The first client is the primary.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chain` is empty.
    pub fn new(chain: Vec<Arc<dyn GenerationClient>>, policy: RetryPolicy) -> Result<Self> {
        if chain.is_empty() {
            return Err(RagError::Config("fallback chain needs at least one client".to_string()));
        }
        let name = format!(
            "fallback({})",
            chain.iter().map(|c| c.name()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(Self { name, chain, policy })
    }
}

#[async_trait]
impl GenerationClient for ResilientGenerationClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Completion> {
        let mut last_error = None;
        for client in &self.chain {
            match call_with_retry(&self.policy, client.name(), || client.generate(request.clone()))
                .await
            {
                Ok(completion) => return Ok(completion),
                Err(error) if self.policy.should_retry(&error) => {
                    warn!(
                        client = client.name(),
                        error = %error,
                        "client exhausted its retry budget, trying next fallback"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        Err(last_error
            .unwrap_or_else(|| RagError::BackendUnavailable("no clients configured".to_string())))
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TokenStream> {
        let mut last_error = None;
        for client in &self.chain {
            match call_with_retry(&self.policy, client.name(), || {
                client.generate_stream(request.clone())
            })
            .await
            {
                Ok(stream) => return Ok(stream),
                Err(error) if self.policy.should_retry(&error) => {
                    warn!(
                        client = client.name(),
                        error = %error,
                        "client exhausted its retry budget, trying next fallback"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        Err(last_error
            .unwrap_or_else(|| RagError::BackendUnavailable("no clients configured".to_string())))
    }

    fn count_tokens(&self, text: &str) -> usize {
        match self.chain.first() {
            Some(primary) => primary.count_tokens(text),
            None => text.chars().count().div_ceil(4),
        }
    }
}
