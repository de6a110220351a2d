//! Retrieval orchestration: fan-out, merge/dedup, filtering, re-ranking.
//!
//! The [`RetrievalOrchestrator`] coordinates one or more
//! [`RetrieverBackend`]s: it embeds the query when needed, searches every
//! backend concurrently with per-call timeouts and partial-failure
//! tolerance, merges candidates by id keeping the best score, applies the
//! query's metadata filters, and optionally re-ranks for diversity with
//! maximal marginal relevance.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_retrieval::{RetrievalConfig, RetrievalOrchestrator};
//!
//! let orchestrator = RetrievalOrchestrator::builder()
//!     .config(RetrievalConfig::default())
//!     .embedder(embedder)
//!     .backend(dense_store)
//!     .backend(keyword_index)
//!     .build()?;
//!
//! let results = orchestrator.retrieve(&query, 5).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use ragkit_core::{Embedder, Query, RagError, Result, RetrieverBackend, ScoredDocument};

use crate::config::RetrievalConfig;
use crate::mmr::mmr_select;

/// Coordinates retriever backends into a single bounded candidate set.
pub struct RetrievalOrchestrator {
    config: RetrievalConfig,
    backends: Vec<Arc<dyn RetrieverBackend>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl RetrievalOrchestrator {
    /// Create a new [`RetrievalOrchestratorBuilder`].
    pub fn builder() -> RetrievalOrchestratorBuilder {
        RetrievalOrchestratorBuilder::default()
    }

    /// Return a reference to the orchestrator configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve up to `k` deduplicated, filtered, ordered candidates.
    ///
    /// Results are relevance-descending, or MMR-ordered when diversity
    /// re-ranking is configured, and contain no duplicate document ids.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `k` is zero or the query has
    /// neither text nor an embedding, and [`RagError::BackendUnavailable`]
    /// if every configured backend fails. Partial backend failure is
    /// tolerated: failed backends are logged and their results omitted.
    pub async fn retrieve(&self, query: &Query, k: usize) -> Result<Vec<ScoredDocument>> {
        if k == 0 {
            return Err(RagError::InvalidQuery("k must be a positive integer".to_string()));
        }
        if query.text.is_empty() && query.embedding.is_none() {
            return Err(RagError::InvalidQuery(
                "query needs text or a precomputed embedding".to_string(),
            ));
        }

        // The caller's query is never mutated; embed into a local clone.
        let query = self.enrich(query).await?;

        let fetch_k = if self.config.mmr.is_some() {
            self.config.fetch_multiplier.saturating_mul(k)
        } else {
            k
        };
        let timeout = self.config.backend_timeout_ms.map(Duration::from_millis);

        // Fan out to every backend concurrently; a slow or failed backend
        // must not hold back the others beyond its own timeout.
        let searches = self.backends.iter().map(|backend| {
            let query = &query;
            async move {
                let outcome = match timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, backend.search(query, fetch_k)).await {
                            Ok(result) => result,
                            Err(_) => Err(RagError::TransientNetwork {
                                component: backend.name().to_string(),
                                message: format!(
                                    "search timed out after {}ms",
                                    limit.as_millis()
                                ),
                            }),
                        }
                    }
                    None => backend.search(query, fetch_k).await,
                };
                (backend.name().to_string(), outcome)
            }
        });
        let outcomes = futures::future::join_all(searches).await;

        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        for (backend, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    debug!(backend = %backend, count = results.len(), "backend returned candidates");
                    candidates.extend(results);
                }
                Err(error) => {
                    warn!(backend = %backend, error = %error, "backend failed, continuing without it");
                    failures.push(format!("{backend}: {error}"));
                }
            }
        }
        if failures.len() == self.backends.len() {
            return Err(RagError::BackendUnavailable(failures.join("; ")));
        }

        // Merge across backends by id, keeping the higher score.
        let mut best_by_id: HashMap<String, ScoredDocument> = HashMap::new();
        for scored in candidates {
            match best_by_id.get(&scored.document.id) {
                Some(existing) if existing.score >= scored.score => {}
                _ => {
                    best_by_id.insert(scored.document.id.clone(), scored);
                }
            }
        }

        let mut merged: Vec<ScoredDocument> = best_by_id
            .into_values()
            .filter(|scored| query.passes_filters(&scored.document))
            .collect();
        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });

        let results = match &self.config.mmr {
            Some(mmr) => mmr_select(merged, mmr.lambda, k),
            None => {
                merged.truncate(k);
                merged
            }
        };

        info!(
            result_count = results.len(),
            k,
            fetch_k,
            failed_backends = failures.len(),
            "retrieval completed"
        );
        Ok(results)
    }

    async fn enrich(&self, query: &Query) -> Result<Query> {
        let mut enriched = query.clone();
        if enriched.embedding.is_none() && !enriched.text.is_empty() {
            if let Some(embedder) = &self.embedder {
                enriched.embedding = Some(embedder.embed(&enriched.text).await?);
            }
        }
        Ok(enriched)
    }
}

/// Builder for constructing a [`RetrievalOrchestrator`].
///
/// At least one backend is required; the embedder is optional (sparse-only
/// deployments pass queries through untouched).
#[derive(Default)]
pub struct RetrievalOrchestratorBuilder {
    config: Option<RetrievalConfig>,
    backends: Vec<Arc<dyn RetrieverBackend>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl RetrievalOrchestratorBuilder {
    /// Set the orchestrator configuration. Defaults to
    /// [`RetrievalConfig::default()`].
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add a retriever backend to the fan-out set.
    pub fn backend(mut self, backend: Arc<dyn RetrieverBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Set the query embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the [`RetrievalOrchestrator`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no backend was added.
    pub fn build(self) -> Result<RetrievalOrchestrator> {
        if self.backends.is_empty() {
            return Err(RagError::Config("at least one retriever backend is required".to_string()));
        }
        Ok(RetrievalOrchestrator {
            config: self.config.unwrap_or_default(),
            backends: self.backends,
            embedder: self.embedder,
        })
    }
}
