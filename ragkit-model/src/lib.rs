//! # ragkit-model
//!
//! Generation-client and embedder implementations for ragkit pipelines.
//!
//! Vendor adapters implement [`ragkit_core::GenerationClient`] and
//! [`ragkit_core::Embedder`] in their own crates; this crate ships the
//! implementations the kit itself needs:
//!
//! - [`MockGenerationClient`] — scripted unary and streaming responses with
//!   call, fragment, and stream-teardown accounting, for tests and demos.
//! - [`MockEmbedder`] — deterministic normalized embeddings.

pub mod mock;

pub use mock::{MockEmbedder, MockGenerationClient, ScriptedReply};
