//! Data types for documents, queries, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A scalar metadata value attached to a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl MetadataValue {
    /// Numeric view of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A predicate over a single metadata key.
///
/// Filters are applied post-hoc by the retrieval orchestrator: a document
/// that is missing the filtered key fails the predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MetadataFilter {
    /// The value equals the given value.
    Eq(MetadataValue),
    /// The value does not equal the given value.
    Ne(MetadataValue),
    /// The value is numeric and strictly greater.
    Gt(f64),
    /// The value is numeric and greater or equal.
    Gte(f64),
    /// The value is numeric and strictly lower.
    Lt(f64),
    /// The value is numeric and lower or equal.
    Lte(f64),
    /// The value is one of the given values.
    In(Vec<MetadataValue>),
}

impl MetadataFilter {
    /// Evaluate the predicate against a document's value for the filtered key.
    ///
    /// `None` (key absent) always fails.
    pub fn matches(&self, value: Option<&MetadataValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Self::Eq(expected) => value == expected,
            Self::Ne(expected) => value != expected,
            Self::Gt(bound) => value.as_f64().is_some_and(|v| v > *bound),
            Self::Gte(bound) => value.as_f64().is_some_and(|v| v >= *bound),
            Self::Lt(bound) => value.as_f64().is_some_and(|v| v < *bound),
            Self::Lte(bound) => value.as_f64().is_some_and(|v| v <= *bound),
            Self::In(candidates) => candidates.contains(value),
        }
    }
}

/// A document returned by a retriever backend.
///
/// Documents are immutable once returned. The optional embedding lets dense
/// backends expose their stored vectors so the orchestrator can compute
/// document-to-document similarity during diversity re-ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub content: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, MetadataValue>,
    /// The document's embedding, when the backend stores one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Create a document with empty metadata and no embedding.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), metadata: HashMap::new(), embedding: None }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A retrieved [`Document`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The retrieved document.
    pub document: Document,
    /// The relevance score (higher is more relevant).
    pub score: f32,
}

/// A retrieval query.
///
/// Created once per request and never mutated; the orchestrator works on an
/// internally enriched clone when it needs to attach an embedding.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::{MetadataFilter, Query};
///
/// let query = Query::new("how do beehives survive winter")
///     .with_filter("season", MetadataFilter::Eq("winter".into()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Query {
    /// The query text.
    pub text: String,
    /// A precomputed query embedding, if the caller has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Metadata predicates applied to retrieved documents.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, MetadataFilter>,
}

impl Query {
    /// Create a text query with no embedding and no filters.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), embedding: None, filters: HashMap::new() }
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach a metadata filter for the given key.
    pub fn with_filter(mut self, key: impl Into<String>, filter: MetadataFilter) -> Self {
        self.filters.insert(key.into(), filter);
        self
    }

    /// Whether a document passes every filter on this query.
    pub fn passes_filters(&self, document: &Document) -> bool {
        self.filters.iter().all(|(key, filter)| filter.matches(document.metadata.get(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_eq_and_missing_key() {
        let doc = Document::new("d1", "text").with_metadata("lang", "en");
        let query = Query::new("q").with_filter("lang", MetadataFilter::Eq("en".into()));
        assert!(query.passes_filters(&doc));

        let query = Query::new("q").with_filter("year", MetadataFilter::Eq(MetadataValue::Int(2024)));
        assert!(!query.passes_filters(&doc), "missing key must fail the filter");
    }

    #[test]
    fn numeric_filters_compare_ints_and_floats() {
        let doc = Document::new("d1", "text").with_metadata("year", 2021i64);
        assert!(MetadataFilter::Gte(2021.0).matches(doc.metadata.get("year")));
        assert!(MetadataFilter::Lt(2022.0).matches(doc.metadata.get("year")));
        assert!(!MetadataFilter::Gt(2021.0).matches(doc.metadata.get("year")));
    }

    #[test]
    fn numeric_filter_fails_on_string_value() {
        let doc = Document::new("d1", "text").with_metadata("year", "2021");
        assert!(!MetadataFilter::Gt(2000.0).matches(doc.metadata.get("year")));
    }

    #[test]
    fn metadata_values_serialize_untagged() {
        let value = serde_json::to_value(MetadataValue::Int(2024)).unwrap();
        assert_eq!(value, serde_json::json!(2024));
        let value = serde_json::to_value(MetadataValue::Str("en".to_string())).unwrap();
        assert_eq!(value, serde_json::json!("en"));

        let parsed: MetadataValue = serde_json::from_value(serde_json::json!(true)).unwrap();
        assert_eq!(parsed, MetadataValue::Bool(true));
        let parsed: MetadataValue = serde_json::from_value(serde_json::json!(1.5)).unwrap();
        assert_eq!(parsed, MetadataValue::Float(1.5));
    }

    #[test]
    fn in_filter() {
        let doc = Document::new("d1", "text").with_metadata("lang", "de");
        let filter = MetadataFilter::In(vec!["en".into(), "de".into()]);
        assert!(filter.matches(doc.metadata.get("lang")));
        let filter = MetadataFilter::In(vec!["en".into(), "fr".into()]);
        assert!(!filter.matches(doc.metadata.get("lang")));
    }
}
