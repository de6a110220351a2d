//! Embedder trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that converts text into a fixed-length embedding vector.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](Embedder::embed_batch)
/// implementation calls [`embed`](Embedder::embed) sequentially; backends
/// with native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::Embedder;
///
/// let embedding = embedder.embed("hello world").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](Embedder::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
