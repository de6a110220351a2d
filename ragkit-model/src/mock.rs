//! Mock generation client and embedder for tests and demos.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_stream::try_stream;
use async_trait::async_trait;
use ragkit_core::{
    Completion, Embedder, GenerationClient, GenerationRequest, RagError, Result, TokenStream,
};

/// A scripted outcome for one [`MockGenerationClient`] call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Respond with the given text.
    Text(String),
    /// Fail with a retryable rate-limit error.
    RateLimited,
    /// Fail with a retryable transient network error.
    TransientNetwork,
    /// Fail with a non-retryable authentication error.
    AuthenticationFailed,
}

/// A generation client that replays a script instead of calling a backend.
///
/// Call `n` consumes the `n`-th scripted reply; once the script runs out the
/// last reply repeats, so a single entry models a stable backend. Streaming
/// replies are split into whitespace-preserving fragments and delivered one
/// at a time, which makes fragment-level cancellation observable through
/// the [`fragments_emitted`](MockGenerationClient::fragments_emitted) and
/// [`streams_released`](MockGenerationClient::streams_released) counters.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_model::{MockGenerationClient, ScriptedReply};
///
/// let client = MockGenerationClient::new(vec![
///     ScriptedReply::TransientNetwork,
///     ScriptedReply::Text("grounded answer".to_string()),
/// ]);
/// ```
pub struct MockGenerationClient {
    name: String,
    script: Vec<ScriptedReply>,
    calls: AtomicUsize,
    fragments_emitted: Arc<AtomicUsize>,
    streams_opened: AtomicUsize,
    streams_released: Arc<AtomicUsize>,
}

impl MockGenerationClient {
    /// Create a mock that replays `script` in order.
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            name: "mock".to_string(),
            script,
            calls: AtomicUsize::new(0),
            fragments_emitted: Arc::new(AtomicUsize::new(0)),
            streams_opened: AtomicUsize::new(0),
            streams_released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always responds with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Text(text.into())])
    }

    /// Total `generate` and `generate_stream` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total stream fragments handed to consumers so far.
    pub fn fragments_emitted(&self) -> usize {
        self.fragments_emitted.load(Ordering::SeqCst)
    }

    /// Number of streams successfully established.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Number of streams whose producer side has been torn down, whether by
    /// exhaustion or by the consumer dropping the stream.
    pub fn streams_released(&self) -> usize {
        self.streams_released.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<ScriptedReply> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.script.len().saturating_sub(1));
        match self.script.get(index) {
            Some(reply) => Ok(reply.clone()),
            None => Err(RagError::InvalidRequest("mock has an empty script".to_string())),
        }
    }

    fn reply_error(&self, reply: &ScriptedReply) -> RagError {
        match reply {
            ScriptedReply::RateLimited => RagError::RateLimited {
                component: self.name.clone(),
                message: "scripted rate limit".to_string(),
            },
            ScriptedReply::AuthenticationFailed => RagError::AuthenticationFailed {
                component: self.name.clone(),
                message: "scripted credential rejection".to_string(),
            },
            _ => RagError::TransientNetwork {
                component: self.name.clone(),
                message: "scripted network failure".to_string(),
            },
        }
    }
}

/// Decrements on drop so tests can observe producer-side teardown.
struct StreamGuard {
    released: Arc<AtomicUsize>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<Completion> {
        match self.next_reply()? {
            ScriptedReply::Text(text) => Ok(Completion { text }),
            reply => Err(self.reply_error(&reply)),
        }
    }

    async fn generate_stream(&self, _request: GenerationRequest) -> Result<TokenStream> {
        let text = match self.next_reply()? {
            ScriptedReply::Text(text) => text,
            reply => return Err(self.reply_error(&reply)),
        };
        self.streams_opened.fetch_add(1, Ordering::SeqCst);

        let fragments: Vec<String> = text.split_inclusive(' ').map(String::from).collect();
        let emitted = Arc::clone(&self.fragments_emitted);
        let guard = StreamGuard { released: Arc::clone(&self.streams_released) };

        let stream: TokenStream = Box::pin(try_stream! {
            let _guard = guard;
            for fragment in fragments {
                emitted.fetch_add(1, Ordering::SeqCst);
                yield fragment;
            }
        });
        Ok(stream)
    }
}

/// A deterministic embedder for tests and demos.
///
/// Hashes character positions into a fixed number of buckets and
/// L2-normalizes the result, so identical texts always embed identically
/// and similar texts land near each other.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create an embedder producing vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (position, byte) in text.bytes().enumerate() {
            let bucket = (byte as usize).wrapping_mul(31).wrapping_add(position / 8) % self.dimensions;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
