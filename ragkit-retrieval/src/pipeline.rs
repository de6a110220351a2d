//! End-to-end retrieval-then-generation pipeline.
//!
//! The [`Pipeline`] composes a [`RetrievalOrchestrator`], a
//! [`ContextAssembler`], and a [`GenerationClient`]: retrieve candidates,
//! assemble a bounded context block, and invoke the generative backend,
//! either unary or streaming.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_retrieval::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .orchestrator(orchestrator)
//!     .generation_client(client)
//!     .build()?;
//!
//! let answer = pipeline.answer(&query).await?;
//! let mut stream = pipeline.answer_stream(&query).await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use ragkit_core::{
    Completion, GenerationClient, GenerationRequest, Query, RagError, Result, TokenStream,
};

use crate::context::ContextAssembler;
use crate::orchestrator::RetrievalOrchestrator;

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Instructions placed at the top of every generation prompt.
    pub system_instructions: String,
    /// Number of documents requested from the orchestrator.
    pub top_k: usize,
    /// Character budget for the assembled context block.
    pub max_context_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            system_instructions: "Answer the question using only the provided context.".to_string(),
            top_k: 5,
            max_context_length: 4000,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the system instructions.
    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.system_instructions = instructions.into();
        self
    }

    /// Set the number of documents requested per invocation.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Set the context character budget.
    pub fn max_context_length(mut self, max_context_length: usize) -> Self {
        self.config.max_context_length = max_context_length;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_k` or `max_context_length` is zero.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.max_context_length == 0 {
            return Err(RagError::Config(
                "max_context_length must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// The retrieval-then-generation pipeline.
///
/// Every invocation is self-contained: it owns its enriched query clone,
/// merge state, and generation request, so concurrent invocations share
/// nothing mutable. Dropping the future returned by [`answer`](Pipeline::answer)
/// or the stream returned by [`answer_stream`](Pipeline::answer_stream)
/// cancels the invocation at the next suspension point without an error.
pub struct Pipeline {
    config: PipelineConfig,
    orchestrator: RetrievalOrchestrator,
    assembler: ContextAssembler,
    generation_client: Arc<dyn GenerationClient>,
}

impl Pipeline {
    /// Create a new [`PipelineBuilder`].
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer a query: retrieve → assemble → generate.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalFailed`] or [`RagError::GenerationFailed`]
    /// so the caller always learns which stage broke, never a partial result.
    pub async fn answer(&self, query: &Query) -> Result<Completion> {
        let request = self.prepare(query, false).await?;
        let completion =
            self.generation_client.generate(request).await.map_err(|e| {
                error!(client = self.generation_client.name(), error = %e, "generation failed");
                RagError::GenerationFailed { source: Box::new(e) }
            })?;
        info!(response_chars = completion.text.chars().count(), "pipeline completed");
        Ok(completion)
    }

    /// Answer a query with an incremental response stream.
    ///
    /// The stream is finite and non-restartable; dropping it cancels the
    /// generation and releases the underlying connection.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`answer`](Pipeline::answer); errors during stream
    /// establishment surface as [`RagError::GenerationFailed`].
    pub async fn answer_stream(&self, query: &Query) -> Result<TokenStream> {
        let request = self.prepare(query, true).await?;
        let stream =
            self.generation_client.generate_stream(request).await.map_err(|e| {
                error!(client = self.generation_client.name(), error = %e, "stream establishment failed");
                RagError::GenerationFailed { source: Box::new(e) }
            })?;
        info!("pipeline streaming response established");
        Ok(stream)
    }

    async fn prepare(&self, query: &Query, streaming: bool) -> Result<GenerationRequest> {
        // 1. Retrieve candidates
        let documents =
            self.orchestrator.retrieve(query, self.config.top_k).await.map_err(|e| {
                error!(error = %e, "retrieval failed");
                RagError::RetrievalFailed { source: Box::new(e) }
            })?;

        // 2. Assemble the bounded context block
        let context = self.assembler.assemble(&documents, self.config.max_context_length);
        info!(
            document_count = documents.len(),
            context_chars = context.chars().count(),
            streaming,
            "context assembled"
        );

        // 3. Build the generation request
        Ok(GenerationRequest::new(&self.config.system_instructions, context, &query.text)
            .with_streaming(streaming))
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// The orchestrator and generation client are required; the assembler
/// defaults to [`ContextAssembler::default()`] and the config to
/// [`PipelineConfig::default()`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    orchestrator: Option<RetrievalOrchestrator>,
    assembler: Option<ContextAssembler>,
    generation_client: Option<Arc<dyn GenerationClient>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the retrieval orchestrator.
    pub fn orchestrator(mut self, orchestrator: RetrievalOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Set the context assembler.
    pub fn assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Set the generation client.
    pub fn generation_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation_client = Some(client);
        self
    }

    /// Build the [`Pipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the orchestrator or generation
    /// client is missing.
    pub fn build(self) -> Result<Pipeline> {
        let orchestrator = self
            .orchestrator
            .ok_or_else(|| RagError::Config("orchestrator is required".to_string()))?;
        let generation_client = self
            .generation_client
            .ok_or_else(|| RagError::Config("generation_client is required".to_string()))?;

        Ok(Pipeline {
            config: self.config.unwrap_or_default(),
            orchestrator,
            assembler: self.assembler.unwrap_or_default(),
            generation_client,
        })
    }
}
