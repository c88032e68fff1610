use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::IndexError;
use crate::types::{BoxFuture, MetadataKeys, PassageIndex, PassageMatch, VectorFilter};

struct StoredPassage {
    vector: Vec<f32>,
    payload: serde_json::Map<String, serde_json::Value>,
}

/// Brute-force cosine index held in process memory. Used by tests and for
/// running against a small local corpus without a Pinecone project.
pub struct InMemoryPassageIndex {
    passages: RwLock<HashMap<String, StoredPassage>>,
    keys: MetadataKeys,
}

impl InMemoryPassageIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::with_metadata_keys(MetadataKeys::default())
    }

    #[must_use]
    pub fn with_metadata_keys(keys: MetadataKeys) -> Self {
        Self {
            passages: RwLock::new(HashMap::new()),
            keys,
        }
    }

    /// Insert or replace a passage.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidInput`] for an empty vector and
    /// [`IndexError::Store`] if the lock is poisoned.
    pub fn upsert(
        &self,
        id: impl Into<String>,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> Result<(), IndexError> {
        if vector.is_empty() {
            return Err(IndexError::InvalidInput("passage vector is empty".into()));
        }
        let payload = match payload {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            _ => {
                return Err(IndexError::InvalidInput(
                    "passage payload must be a JSON object".into(),
                ));
            }
        };
        let mut passages = self
            .passages
            .write()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        passages.insert(id.into(), StoredPassage { vector, payload });
        Ok(())
    }

    /// Number of stored passages; 0 if the lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.read().map(|p| p.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&VectorFilter>,
    ) -> Result<Vec<PassageMatch>, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::InvalidInput("query vector is empty".into()));
        }
        let top_k = top_k.max(1);
        let passages = self
            .passages
            .read()
            .map_err(|e| IndexError::Store(e.to_string()))?;

        let mut scored: Vec<PassageMatch> = passages
            .iter()
            .filter(|(_, p)| filter.is_none_or(|f| matches_filter(&p.payload, f)))
            .map(|(id, p)| {
                PassageMatch::from_payload(
                    id.clone(),
                    cosine_similarity(vector, &p.vector),
                    &p.payload,
                    &self.keys,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.passage_id.cmp(&b.passage_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

impl Default for InMemoryPassageIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryPassageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPassageIndex")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn matches_filter(payload: &serde_json::Map<String, serde_json::Value>, filter: &VectorFilter) -> bool {
    let field = |name: &str| {
        payload.get(name).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };
    for cond in &filter.must {
        let Some(raw) = field(&cond.field) else {
            return false;
        };
        if !cond.value.matches(&raw) {
            return false;
        }
    }
    for cond in &filter.must_not {
        if let Some(raw) = field(&cond.field)
            && cond.value.matches(&raw)
        {
            return false;
        }
    }
    true
}

impl PassageIndex for InMemoryPassageIndex {
    fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<PassageMatch>, IndexError>> {
        Box::pin(async move { self.search(&vector, top_k, filter.as_ref()) })
    }
}
