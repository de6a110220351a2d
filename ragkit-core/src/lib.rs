//! # ragkit-core
//!
//! Core building blocks for the ragkit retrieval-augmented-generation
//! pipeline: the shared data model, the error taxonomy, the capability
//! traits implemented by vendor integrations, and the resilience layer
//! that wraps remote calls with retries and fallback chains.
//!
//! ## Overview
//!
//! - [`Document`], [`ScoredDocument`], [`Query`] — request-scoped retrieval
//!   data model with scalar metadata and post-hoc filter predicates.
//! - [`Embedder`] — text to fixed-length vector.
//! - [`RetrieverBackend`] — scored candidate search over a corpus.
//! - [`GenerationClient`] — unary and streaming generation.
//! - [`RetryPolicy`], [`call_with_retry`], [`ResilientRetriever`],
//!   [`ResilientGenerationClient`] — retry with exponential backoff and
//!   jitter plus ordered fallback-to-alternate-implementation chains.
//!
//! Higher-level orchestration (fan-out, merge/dedup, diversity re-ranking,
//! context assembly, the end-to-end pipeline) lives in `ragkit-retrieval`.

pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod resilience;
pub mod retriever;

pub use document::{Document, MetadataFilter, MetadataValue, Query, ScoredDocument};
pub use embedding::Embedder;
pub use error::{ErrorKind, RagError, Result};
pub use generation::{Completion, GenerationClient, GenerationRequest, TokenStream};
pub use resilience::{
    BackoffStrategy, ResilientGenerationClient, ResilientRetriever, RetryPolicy, call_with_retry,
};
pub use retriever::RetrieverBackend;
