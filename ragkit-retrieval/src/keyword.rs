//! In-memory sparse retriever using token overlap.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use ragkit_core::{Document, Query, Result, RetrieverBackend, ScoredDocument};

/// A sparse keyword backend that never touches embeddings.
///
/// Scores documents by the fraction of query tokens found in the document
/// content (case-insensitive). Useful as a fallback link behind a dense
/// backend and as the reference "skips the embedder" backend variant.
#[derive(Debug)]
pub struct KeywordRetriever {
    name: String,
    documents: RwLock<HashMap<String, Document>>,
}

impl KeywordRetriever {
    /// Create an empty retriever with the given backend name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), documents: RwLock::new(HashMap::new()) }
    }

    /// Upsert documents into the corpus. Embeddings are not required.
    pub async fn insert(&self, documents: Vec<Document>) {
        let mut corpus = self.documents.write().await;
        for document in documents {
            corpus.insert(document.id.clone(), document);
        }
    }

    fn tokens(text: &str) -> HashSet<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    }
}

#[async_trait]
impl RetrieverBackend for KeywordRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &Query, k: usize) -> Result<Vec<ScoredDocument>> {
        let query_tokens = Self::tokens(&query.text);
        if query_tokens.is_empty() {
            // Embedding-only queries have nothing for a keyword index to match.
            return Ok(Vec::new());
        }

        let corpus = self.documents.read().await;
        let mut scored: Vec<ScoredDocument> = corpus
            .values()
            .filter_map(|document| {
                let document_tokens = Self::tokens(&document.content);
                let hits = query_tokens.intersection(&document_tokens).count();
                if hits == 0 {
                    return None;
                }
                let score = hits as f32 / query_tokens.len() as f32;
                Some(ScoredDocument { document: document.clone(), score })
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
