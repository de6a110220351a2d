//! Greedy maximal-marginal-relevance selection.

use std::collections::HashSet;

use ragkit_core::{Document, ScoredDocument};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Jaccard similarity over lowercased whitespace tokens.
fn token_jaccard(a: &str, b: &str) -> f32 {
    let tokens_a: HashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let tokens_b: HashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f32 / union as f32
}

/// Similarity between two documents.
///
/// Uses embedding cosine when both documents carry embeddings, falling
/// back to token-set Jaccard over contents for sparse backends.
fn pairwise_similarity(a: &Document, b: &Document) -> f32 {
    match (&a.embedding, &b.embedding) {
        (Some(ea), Some(eb)) if !ea.is_empty() && !eb.is_empty() => cosine_similarity(ea, eb),
        _ => token_jaccard(&a.content, &b.content),
    }
}

/// Greedily select up to `k` documents maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity(candidate, selected)`.
///
/// `candidates` must be sorted relevance-descending; with `lambda = 1.0`
/// the selection reproduces that order exactly (ties keep the earlier
/// candidate).
pub(crate) fn mmr_select(
    mut candidates: Vec<ScoredDocument>,
    lambda: f32,
    k: usize,
) -> Vec<ScoredDocument> {
    let mut selected: Vec<ScoredDocument> = Vec::with_capacity(k.min(candidates.len()));
    while selected.len() < k && !candidates.is_empty() {
        let mut best_index = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (index, candidate) in candidates.iter().enumerate() {
            let max_similarity = selected
                .iter()
                .map(|chosen| pairwise_similarity(&candidate.document, &chosen.document))
                .fold(0.0f32, f32::max);
            let mmr_score = lambda * candidate.score - (1.0 - lambda) * max_similarity;
            if mmr_score > best_score {
                best_score = mmr_score;
                best_index = index;
            }
        }
        selected.push(candidates.remove(best_index));
    }
    selected
}

#[cfg(test)]
mod tests {
    use ragkit_core::Document;

    use super::*;

    fn scored(id: &str, content: &str, embedding: Vec<f32>, score: f32) -> ScoredDocument {
        ScoredDocument {
            document: Document::new(id, content).with_embedding(embedding),
            score,
        }
    }

    #[test]
    fn lambda_one_keeps_relevance_order() {
        let candidates = vec![
            scored("a", "alpha", vec![1.0, 0.0], 0.9),
            scored("b", "alpha", vec![1.0, 0.0], 0.8),
            scored("c", "gamma", vec![0.0, 1.0], 0.7),
        ];
        let ids: Vec<String> = mmr_select(candidates, 1.0, 3)
            .into_iter()
            .map(|s| s.document.id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn diversity_prefers_dissimilar_documents() {
        // "b" is nearly identical to "a"; with a diversity-leaning lambda
        // the orthogonal "c" should be picked second despite a lower score.
        let candidates = vec![
            scored("a", "alpha one", vec![1.0, 0.0], 0.9),
            scored("b", "alpha two", vec![0.99, 0.01], 0.85),
            scored("c", "gamma", vec![0.0, 1.0], 0.5),
        ];
        let ids: Vec<String> = mmr_select(candidates, 0.3, 2)
            .into_iter()
            .map(|s| s.document.id)
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn jaccard_fallback_without_embeddings() {
        let a = Document::new("a", "winter bees survive cold");
        let b = Document::new("b", "winter bees survive cold");
        let c = Document::new("c", "tomato planting schedule");
        assert!(pairwise_similarity(&a, &b) > 0.99);
        assert_eq!(pairwise_similarity(&a, &c), 0.0);
    }

    #[test]
    fn selection_bounded_by_candidates() {
        let candidates = vec![scored("a", "alpha", vec![1.0], 0.9)];
        assert_eq!(mmr_select(candidates, 0.5, 10).len(), 1);
        assert!(mmr_select(Vec::new(), 0.5, 10).is_empty());
    }
}
