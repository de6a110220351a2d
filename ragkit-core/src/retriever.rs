//! Retriever backend trait for fetching candidate documents.

use async_trait::async_trait;

use crate::document::{Query, ScoredDocument};
use crate::error::Result;

/// A search backend that returns scored candidate documents for a query.
///
/// Implementations wrap vendor retrieval systems (vector databases, keyword
/// indexes, web search) behind a unified async interface. Dense backends
/// read `query.embedding`; sparse backends read `query.text` and may ignore
/// the embedding entirely.
///
/// Results are ordered by descending relevance score and bounded by `k`.
/// Searching an unchanged corpus with an identical query must return the
/// same ordered id sequence.
#[async_trait]
pub trait RetrieverBackend: Send + Sync {
    /// A short name identifying this backend in logs and errors.
    fn name(&self) -> &str;

    /// Search for the `k` most relevant documents.
    async fn search(&self, query: &Query, k: usize) -> Result<Vec<ScoredDocument>>;
}
