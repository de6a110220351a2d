//! Property tests for retrieval ordering and bounding invariants.

use std::sync::Arc;

use proptest::prelude::*;

use ragkit_core::{Document, Query, RetrieverBackend, ScoredDocument};
use ragkit_retrieval::{
    ContextAssembler, InMemoryRetriever, RetrievalConfig, RetrievalOrchestrator,
};

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for value in &mut v {
            *value /= norm;
        }
        Some(v)
    })
}

/// Generate a document with a normalized embedding.
fn arb_document(dim: usize) -> impl Strategy<Value = Document> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, content, embedding)| Document::new(id, content).with_embedding(embedding),
    )
}

const DIM: usize = 16;

/// For any corpus and any valid `k`, orchestrated retrieval returns at most
/// `k` results with zero duplicate ids, ordered by descending score, and an
/// identical second call returns the identical id sequence.
mod prop_retrieve_bounded_and_deduplicated {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn bounded_deduplicated_ordered_idempotent(
            documents in proptest::collection::vec(arb_document(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
            use_mmr in any::<bool>(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (first, second): (Vec<ScoredDocument>, Vec<ScoredDocument>) = rt.block_on(async {
                // Two overlapping stores exercise the merge path.
                let store_a = InMemoryRetriever::new("a");
                let store_b = InMemoryRetriever::new("b");
                store_a.insert(documents.clone()).await.unwrap();
                let half = documents.len() / 2;
                store_b.insert(documents[half..].to_vec()).await.unwrap();

                let mut config = RetrievalConfig::builder();
                if use_mmr {
                    config = config.mmr_lambda(0.5);
                }
                let orchestrator = RetrievalOrchestrator::builder()
                    .config(config.build().unwrap())
                    .backend(Arc::new(store_a))
                    .backend(Arc::new(store_b))
                    .build()
                    .unwrap();

                let query = Query::new("q").with_embedding(query.clone());
                let first = orchestrator.retrieve(&query, k).await.unwrap();
                let second = orchestrator.retrieve(&query, k).await.unwrap();
                (first, second)
            });

            prop_assert!(first.len() <= k);

            let mut seen = std::collections::HashSet::new();
            for scored in &first {
                prop_assert!(seen.insert(scored.document.id.clone()), "duplicate id {}", scored.document.id);
            }

            if !use_mmr {
                for window in first.windows(2) {
                    prop_assert!(
                        window[0].score >= window[1].score,
                        "results not in descending order: {} < {}",
                        window[0].score,
                        window[1].score,
                    );
                }
            }

            let first_ids: Vec<&String> = first.iter().map(|s| &s.document.id).collect();
            let second_ids: Vec<&String> = second.iter().map(|s| &s.document.id).collect();
            prop_assert_eq!(first_ids, second_ids, "retrieval must be idempotent");
        }
    }
}

/// For any document set and any budget, the assembled context never exceeds
/// the budget and every document appears whole or not at all.
mod prop_assemble_bounded_and_unsplit {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn output_bounded_and_documents_whole(
            contents in proptest::collection::vec("[a-z]{1,30}", 0..10),
            max_length in 0usize..120,
        ) {
            let documents: Vec<ScoredDocument> = contents
                .iter()
                .enumerate()
                .map(|(index, content)| ScoredDocument {
                    document: Document::new(format!("d{index}"), content.clone()),
                    score: 1.0,
                })
                .collect();

            let assembler = ContextAssembler::with_delimiter("|");
            let context = assembler.assemble(&documents, max_length);

            prop_assert!(context.chars().count() <= max_length);
            for piece in context.split('|') {
                prop_assert!(
                    piece.is_empty() || contents.iter().any(|c| c == piece),
                    "piece '{piece}' is not a whole document",
                );
            }
        }
    }
}

/// Direct backend searches are idempotent against an unchanged corpus.
mod prop_backend_search_idempotent {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn same_query_same_ordered_ids(
            documents in proptest::collection::vec(arb_document(DIM), 1..15),
            query in arb_normalized_embedding(DIM),
            k in 1usize..20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (first, second) = rt.block_on(async {
                let store = InMemoryRetriever::new("mem");
                store.insert(documents.clone()).await.unwrap();
                let query = Query::new("q").with_embedding(query.clone());
                let first: Vec<String> = store
                    .search(&query, k)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|s| s.document.id)
                    .collect();
                let second: Vec<String> = store
                    .search(&query, k)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|s| s.document.id)
                    .collect();
                (first, second)
            });
            prop_assert_eq!(first, second);
        }
    }
}
