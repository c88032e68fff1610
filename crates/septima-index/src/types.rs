use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One passage-level hit from a k-NN query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageMatch {
    pub passage_id: String,
    /// Identifier of the document the passage was cut from; empty when the
    /// index carries no parent for it.
    pub parent_id: String,
    /// Similarity in `[0, 1]`, higher is closer.
    pub score: f32,
    pub text_preview: String,
    pub metadata: HashMap<String, String>,
}

impl PassageMatch {
    /// Build a match from a raw index payload, pulling the parent and preview
    /// fields out by the configured key names.
    ///
    /// Every payload entry is kept in `metadata`, with non-string values
    /// rendered as JSON text. `score` is clamped to `[0, 1]`; NaN becomes 0.
    #[must_use]
    pub fn from_payload(
        passage_id: String,
        score: f32,
        payload: &serde_json::Map<String, serde_json::Value>,
        keys: &MetadataKeys,
    ) -> Self {
        let metadata: HashMap<String, String> = payload
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
        let parent_id = metadata.get(&keys.parent).cloned().unwrap_or_default();
        let text_preview = metadata.get(&keys.preview).cloned().unwrap_or_default();
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            passage_id,
            parent_id,
            score,
            text_preview,
            metadata,
        }
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Names of the payload fields the index stores alongside each passage vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataKeys {
    pub parent: String,
    pub title: String,
    pub order: String,
    pub reference: String,
    pub preview: String,
    pub preacher: String,
}

impl Default for MetadataKeys {
    fn default() -> Self {
        Self {
            parent: "sermon_id_base".into(),
            title: "sermon_title_translated".into(),
            order: "paragraph_order_in_sermon".into(),
            reference: "main_scripture_passage_abbreviated".into(),
            preview: "text_preview".into(),
            preacher: "preacher".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorFilter {
    pub must: Vec<FieldCondition>,
    pub must_not: Vec<FieldCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub value: FieldValue,
}

impl FieldCondition {
    fn clause(&self, op: &str) -> serde_json::Value {
        let mut inner = serde_json::Map::new();
        inner.insert(op.to_owned(), self.value.to_json());
        let mut outer = serde_json::Map::new();
        outer.insert(self.field.clone(), serde_json::Value::Object(inner));
        serde_json::Value::Object(outer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }

    pub(crate) fn matches(&self, raw: &str) -> bool {
        match self {
            Self::Integer(i) => raw.parse::<i64>().is_ok_and(|v| v == *i),
            Self::Text(s) => raw == s,
        }
    }
}

impl VectorFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Render as a Pinecone metadata filter using `$eq` / `$ne` clauses.
    #[must_use]
    pub fn to_pinecone(&self) -> serde_json::Value {
        let clauses: Vec<serde_json::Value> = self
            .must
            .iter()
            .map(|c| c.clause("$eq"))
            .chain(self.must_not.iter().map(|c| c.clause("$ne")))
            .collect();

        if clauses.len() == 1 {
            clauses.into_iter().next().unwrap_or_default()
        } else {
            serde_json::json!({ "$and": clauses })
        }
    }
}

/// Opaque k-NN service over a collection of passage vectors.
pub trait PassageIndex: Send + Sync {
    /// Return up to `top_k` passages ordered by descending similarity.
    ///
    /// Implementations reject an empty `vector` with
    /// [`IndexError::InvalidInput`] and clamp `top_k == 0` to 1.
    fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<PassageMatch>, IndexError>>;
}
