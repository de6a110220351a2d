//! # ragkit-retrieval
//!
//! Retrieval orchestration and the end-to-end RAG pipeline for ragkit.
//!
//! ## Overview
//!
//! - [`RetrievalOrchestrator`] — concurrent fan-out over
//!   [`ragkit_core::RetrieverBackend`]s with partial-failure tolerance,
//!   merge/dedup by id, metadata filtering, and optional MMR diversity
//!   re-ranking.
//! - [`ContextAssembler`] — bounded-size context blocks that never split a
//!   document mid-content.
//! - [`Pipeline`] — retrieve → assemble → generate, unary or streaming,
//!   with drop-based cancellation.
//! - [`InMemoryRetriever`] / [`KeywordRetriever`] — reference dense and
//!   sparse backends for development and tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_core::Query;
//! use ragkit_retrieval::{
//!     InMemoryRetriever, Pipeline, PipelineConfig, RetrievalConfig, RetrievalOrchestrator,
//! };
//!
//! let orchestrator = RetrievalOrchestrator::builder()
//!     .config(RetrievalConfig::builder().mmr_lambda(0.5).build()?)
//!     .embedder(embedder)
//!     .backend(Arc::new(store))
//!     .build()?;
//!
//! let pipeline = Pipeline::builder()
//!     .orchestrator(orchestrator)
//!     .generation_client(client)
//!     .build()?;
//!
//! let answer = pipeline.answer(&Query::new("how do bees overwinter?")).await?;
//! ```

pub mod config;
pub mod context;
pub mod inmemory;
pub mod keyword;
mod mmr;
pub mod orchestrator;
pub mod pipeline;

pub use config::{MmrConfig, RetrievalConfig, RetrievalConfigBuilder};
pub use context::ContextAssembler;
pub use inmemory::InMemoryRetriever;
pub use keyword::KeywordRetriever;
pub use orchestrator::{RetrievalOrchestrator, RetrievalOrchestratorBuilder};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineConfig, PipelineConfigBuilder};
