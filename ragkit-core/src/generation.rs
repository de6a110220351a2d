//! Generation client trait and request/response types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A lazy, finite, non-restartable stream of response text fragments.
///
/// Fragments concatenate to the full response. The stream ends when the
/// underlying generation completes; dropping it cancels the generation and
/// releases the underlying connection.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A prompt for a generation backend, built once per pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// Instructions placed before the context.
    pub system_instructions: String,
    /// The assembled context block.
    pub context: String,
    /// The user's original query text.
    pub user_query: String,
    /// Whether the caller intends to consume the response incrementally.
    pub streaming: bool,
}

impl GenerationRequest {
    /// Create a non-streaming request.
    pub fn new(
        system_instructions: impl Into<String>,
        context: impl Into<String>,
        user_query: impl Into<String>,
    ) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            context: context.into(),
            user_query: user_query.into(),
            streaming: false,
        }
    }

    /// Set the streaming flag.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Render the full prompt text sent to the backend.
    pub fn prompt(&self) -> String {
        if self.context.is_empty() {
            format!("{}\n\nQuestion: {}", self.system_instructions, self.user_query)
        } else {
            format!(
                "{}\n\nContext:\n{}\n\nQuestion: {}",
                self.system_instructions, self.context, self.user_query
            )
        }
    }
}

/// A completed generation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    /// The full response text.
    pub text: String,
}

/// A client for a generative backend.
///
/// Implementations wrap vendor chat/completion APIs behind a unified async
/// interface. Which implementation runs is explicit configuration — callers
/// plug a trait object into the pipeline, never inspect types at runtime.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// A short name identifying this client in logs and errors.
    fn name(&self) -> &str;

    /// Send a request and wait for the complete response.
    async fn generate(&self, request: GenerationRequest) -> Result<Completion>;

    /// Send a request and return an incremental stream of text fragments.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<TokenStream>;

    /// Estimate the number of tokens in `text`.
    ///
    /// The default is a coarse character-count heuristic; vendor clients
    /// should override it with their tokenizer's count.
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
