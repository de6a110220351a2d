//! Integration tests for retrieval orchestration: fan-out, partial
//! failure, merge/dedup, filtering, and MMR ordering.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ragkit_core::{
    Document, Embedder, MetadataFilter, Query, RagError, Result, RetrieverBackend, ScoredDocument,
};
use ragkit_model::MockEmbedder;
use ragkit_retrieval::{InMemoryRetriever, RetrievalConfig, RetrievalOrchestrator};

/// A backend serving a fixed candidate list, ignoring the query.
struct StaticBackend {
    name: String,
    results: Vec<ScoredDocument>,
}

impl StaticBackend {
    fn new(name: &str, results: Vec<(&str, f32)>) -> Self {
        let results = results
            .into_iter()
            .map(|(id, score)| ScoredDocument {
                document: Document::new(id, format!("content of {id}")),
                score,
            })
            .collect();
        Self { name: name.to_string(), results }
    }
}

#[async_trait]
impl RetrieverBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &Query, k: usize) -> Result<Vec<ScoredDocument>> {
        let mut results = self.results.clone();
        results.truncate(k);
        Ok(results)
    }
}

/// A backend that never answers within any reasonable timeout.
struct HangingBackend;

#[async_trait]
impl RetrieverBackend for HangingBackend {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn search(&self, _query: &Query, _k: usize) -> Result<Vec<ScoredDocument>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// A backend that always fails with a transient error.
struct BrokenBackend;

#[async_trait]
impl RetrieverBackend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    async fn search(&self, _query: &Query, _k: usize) -> Result<Vec<ScoredDocument>> {
        Err(RagError::TransientNetwork {
            component: "broken".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

fn ids(results: &[ScoredDocument]) -> Vec<&str> {
    results.iter().map(|s| s.document.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn timed_out_backend_is_omitted_and_duplicates_keep_higher_score() {
    let backend_a = StaticBackend::new(
        "a",
        vec![("a1", 0.9), ("shared1", 0.8), ("a3", 0.7), ("shared2", 0.3), ("a5", 0.2)],
    );
    let backend_c = StaticBackend::new(
        "c",
        vec![("c1", 0.85), ("shared1", 0.5), ("shared2", 0.6), ("c4", 0.4), ("c5", 0.1)],
    );

    let orchestrator = RetrievalOrchestrator::builder()
        .config(RetrievalConfig::builder().backend_timeout_ms(50).build().unwrap())
        .backend(Arc::new(backend_a))
        .backend(Arc::new(HangingBackend))
        .backend(Arc::new(backend_c))
        .build()
        .unwrap();

    let results = orchestrator.retrieve(&Query::new("q"), 5).await.unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(ids(&results), ["a1", "c1", "shared1", "a3", "shared2"]);
    // Duplicates keep the higher-scored copy from either backend.
    let shared1 = results.iter().find(|s| s.document.id == "shared1").unwrap();
    assert_eq!(shared1.score, 0.8);
    let shared2 = results.iter().find(|s| s.document.id == "shared2").unwrap();
    assert_eq!(shared2.score, 0.6);
}

#[tokio::test]
async fn partial_backend_failure_is_not_an_error() {
    let orchestrator = RetrievalOrchestrator::builder()
        .backend(Arc::new(StaticBackend::new("a", vec![("a1", 0.9)])))
        .backend(Arc::new(BrokenBackend))
        .build()
        .unwrap();

    let results = orchestrator.retrieve(&Query::new("q"), 5).await.unwrap();
    assert_eq!(ids(&results), ["a1"]);
}

#[tokio::test]
async fn all_backends_failing_is_backend_unavailable() {
    let orchestrator = RetrievalOrchestrator::builder()
        .backend(Arc::new(BrokenBackend))
        .backend(Arc::new(BrokenBackend))
        .build()
        .unwrap();

    let result = orchestrator.retrieve(&Query::new("q"), 5).await;
    assert!(matches!(result, Err(RagError::BackendUnavailable(_))));
}

#[tokio::test]
async fn invalid_inputs_are_rejected() {
    let orchestrator = RetrievalOrchestrator::builder()
        .backend(Arc::new(StaticBackend::new("a", vec![("a1", 0.9)])))
        .build()
        .unwrap();

    assert!(matches!(
        orchestrator.retrieve(&Query::new("q"), 0).await,
        Err(RagError::InvalidQuery(_))
    ));
    assert!(matches!(
        orchestrator.retrieve(&Query::new(""), 5).await,
        Err(RagError::InvalidQuery(_))
    ));
    // An embedding-only query is valid input.
    let query = Query::new("").with_embedding(vec![1.0, 0.0]);
    assert!(orchestrator.retrieve(&query, 5).await.is_ok());
}

#[tokio::test]
async fn metadata_filters_drop_non_matching_documents() {
    let backend = StaticBackend {
        name: "a".to_string(),
        results: vec![
            ScoredDocument {
                document: Document::new("en1", "english doc").with_metadata("lang", "en"),
                score: 0.9,
            },
            ScoredDocument {
                document: Document::new("de1", "german doc").with_metadata("lang", "de"),
                score: 0.8,
            },
            ScoredDocument { document: Document::new("bare", "no metadata"), score: 0.7 },
        ],
    };
    let orchestrator =
        RetrievalOrchestrator::builder().backend(Arc::new(backend)).build().unwrap();

    let query = Query::new("q").with_filter("lang", MetadataFilter::Eq("en".into()));
    let results = orchestrator.retrieve(&query, 5).await.unwrap();
    assert_eq!(ids(&results), ["en1"]);
}

#[tokio::test]
async fn embedder_enriches_text_queries_for_dense_backends() {
    let embedder = Arc::new(MockEmbedder::new(32));
    let store = InMemoryRetriever::new("mem");
    let corpus = vec![
        "bees cluster tightly through the winter months",
        "tomatoes need staking in early summer",
        "root cellars keep squash cool and dry",
    ];
    for (index, content) in corpus.iter().enumerate() {
        let embedding = embedder.embed(content).await.unwrap();
        store
            .insert(vec![Document::new(format!("d{index}"), *content).with_embedding(embedding)])
            .await
            .unwrap();
    }

    let orchestrator = RetrievalOrchestrator::builder()
        .embedder(embedder)
        .backend(Arc::new(store))
        .build()
        .unwrap();

    // Text-only query; the orchestrator embeds it before the dense search.
    let results = orchestrator
        .retrieve(&Query::new("bees cluster tightly through the winter months"), 1)
        .await
        .unwrap();
    assert_eq!(ids(&results), ["d0"]);
}

#[tokio::test]
async fn mmr_with_lambda_one_matches_plain_relevance_order() {
    let candidates = vec![("a", 0.9), ("b", 0.8), ("c", 0.7), ("d", 0.6), ("e", 0.5)];

    let plain = RetrievalOrchestrator::builder()
        .backend(Arc::new(StaticBackend::new("s", candidates.clone())))
        .build()
        .unwrap();
    let mmr = RetrievalOrchestrator::builder()
        .config(RetrievalConfig::builder().mmr_lambda(1.0).build().unwrap())
        .backend(Arc::new(StaticBackend::new("s", candidates)))
        .build()
        .unwrap();

    let query = Query::new("q");
    let plain_ids: Vec<String> = plain
        .retrieve(&query, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.document.id)
        .collect();
    let mmr_ids: Vec<String> = mmr
        .retrieve(&query, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.document.id)
        .collect();
    assert_eq!(plain_ids, mmr_ids);
}
