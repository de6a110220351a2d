//! In-memory dense retriever using cosine similarity.
//!
//! [`InMemoryRetriever`] is a zero-dependency reference backend backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small corpora.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ragkit_core::{Document, Query, RagError, Result, RetrieverBackend, ScoredDocument};

use crate::mmr::cosine_similarity;

/// An in-memory dense retriever scoring by cosine similarity.
///
/// Documents must carry embeddings when inserted, and queries must carry an
/// embedding when searched (the orchestrator attaches one when an embedder
/// is configured). Returned documents keep their embeddings so MMR can
/// compute document-to-document similarity.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_retrieval::InMemoryRetriever;
///
/// let retriever = InMemoryRetriever::new("notes");
/// retriever.insert(vec![document]).await?;
/// let results = retriever.search(&query, 5).await?;
/// ```
#[derive(Debug)]
pub struct InMemoryRetriever {
    name: String,
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryRetriever {
    /// Create an empty retriever with the given backend name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), documents: RwLock::new(HashMap::new()) }
    }

    /// Upsert documents into the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidRequest`] if any document lacks an
    /// embedding.
    pub async fn insert(&self, documents: Vec<Document>) -> Result<()> {
        for document in &documents {
            if document.embedding.as_ref().is_none_or(Vec::is_empty) {
                return Err(RagError::InvalidRequest(format!(
                    "document '{}' has no embedding",
                    document.id
                )));
            }
        }
        let mut corpus = self.documents.write().await;
        for document in documents {
            corpus.insert(document.id.clone(), document);
        }
        Ok(())
    }

    /// Remove documents by id. Unknown ids are ignored.
    pub async fn remove(&self, ids: &[&str]) {
        let mut corpus = self.documents.write().await;
        for id in ids {
            corpus.remove(*id);
        }
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the corpus is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl RetrieverBackend for InMemoryRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &Query, k: usize) -> Result<Vec<ScoredDocument>> {
        let Some(embedding) = &query.embedding else {
            return Err(RagError::InvalidQuery(format!(
                "backend '{}' requires a query embedding",
                self.name
            )));
        };

        let corpus = self.documents.read().await;
        let mut scored: Vec<ScoredDocument> = corpus
            .values()
            .map(|document| {
                let score = document
                    .embedding
                    .as_deref()
                    .map(|stored| cosine_similarity(stored, embedding))
                    .unwrap_or(0.0);
                ScoredDocument { document: document.clone(), score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(k);
        Ok(scored)
    }
}
