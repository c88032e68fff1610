use std::fmt;

use serde::Serialize;

use crate::error::IndexError;
use crate::types::{BoxFuture, MetadataKeys, PassageIndex, PassageMatch, VectorFilter};

/// Pinecone serverless index queried over its REST data-plane API.
#[derive(Clone)]
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    namespace: Option<String>,
    keys: MetadataKeys,
}

impl fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PineconeIndex {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String, mut endpoint: String) -> Self {
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client,
            api_key,
            endpoint,
            namespace: None,
            keys: MetadataKeys::default(),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    #[must_use]
    pub fn with_metadata_keys(mut self, keys: MetadataKeys) -> Self {
        self.keys = keys;
        self
    }

    async fn query_inner(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<PassageMatch>, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::InvalidInput("query vector is empty".into()));
        }
        let top_k = if top_k == 0 {
            tracing::warn!("top_k of 0 requested, clamping to 1");
            1
        } else {
            top_k
        };

        let body = QueryRequest {
            vector: &vector,
            top_k,
            include_metadata: true,
            include_values: false,
            filter: filter.filter(|f| !f.is_empty()).map(|f| f.to_pinecone()),
            namespace: self.namespace.as_deref(),
        };

        let url = format!("{}/query", self.endpoint);
        tracing::debug!(%url, top_k, "querying Pinecone");

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_client_error() {
            tracing::error!("Pinecone rejected query {status}: {text}");
            return Err(IndexError::InvalidInput(format!(
                "Pinecone rejected query (status {status})"
            )));
        }
        if !status.is_success() {
            tracing::error!("Pinecone query failed {status}: {text}");
            return Err(IndexError::Unavailable {
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let matches = parse_matches(&json, &self.keys);
        tracing::debug!(matches = matches.len(), "Pinecone query succeeded");
        Ok(matches)
    }
}

impl PassageIndex for PineconeIndex {
    fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<PassageMatch>, IndexError>> {
        Box::pin(self.query_inner(vector, top_k, filter))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

fn parse_matches(json: &serde_json::Value, keys: &MetadataKeys) -> Vec<PassageMatch> {
    let Some(matches) = json.get("matches").and_then(|m| m.as_array()) else {
        return Vec::new();
    };

    let empty = serde_json::Map::new();
    matches
        .iter()
        .filter_map(|m| {
            let Some(id) = m.get("id").and_then(|v| v.as_str()) else {
                tracing::warn!("skipping Pinecone match without id");
                return None;
            };
            #[allow(clippy::cast_possible_truncation)]
            let score = m.get("score").and_then(serde_json::Value::as_f64).unwrap_or(0.0) as f32;
            let payload = m
                .get("metadata")
                .and_then(|v| v.as_object())
                .unwrap_or(&empty);
            Some(PassageMatch::from_payload(id.to_owned(), score, payload, keys))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::{FieldCondition, FieldValue};

    fn index_at(endpoint: &str) -> PineconeIndex {
        PineconeIndex::new(reqwest::Client::new(), "pc-key".into(), endpoint.into())
    }

    #[test]
    fn parse_matches_missing_array_is_empty() {
        let json = serde_json::json!({"namespace": ""});
        assert!(parse_matches(&json, &MetadataKeys::default()).is_empty());
        let json = serde_json::json!({"matches": "nope"});
        assert!(parse_matches(&json, &MetadataKeys::default()).is_empty());
    }

    #[test]
    fn parse_matches_skips_missing_id() {
        let json = serde_json::json!({"matches": [
            {"score": 0.9},
            {"id": "s1_p1", "score": 0.8, "metadata": {"sermon_id_base": "s1"}}
        ]});
        let out = parse_matches(&json, &MetadataKeys::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].parent_id, "s1");
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", index_at("https://x.pinecone.io/"));
        assert!(!debug.contains("pc-key"));
        assert!(debug.contains("https://x.pinecone.io\""));
    }

    #[tokio::test]
    async fn query_sends_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("Api-Key", "pc-key"))
            .and(body_partial_json(serde_json::json!({
                "topK": 3,
                "includeMetadata": true,
                "includeValues": false,
                "namespace": "sermons",
                "filter": {"preacher": {"$eq": "C. H. Spurgeon"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [
                    {"id": "sermon_42_p1", "score": 0.91, "metadata": {
                        "sermon_id_base": "sermon_42",
                        "text_preview": "Pray without ceasing."
                    }}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filter = VectorFilter {
            must: vec![FieldCondition {
                field: "preacher".into(),
                value: FieldValue::Text("C. H. Spurgeon".into()),
            }],
            must_not: vec![],
        };
        let out = index_at(&server.uri())
            .with_namespace(Some("sermons".into()))
            .query(vec![0.1, 0.2], 3, Some(filter))
            .await
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].passage_id, "sermon_42_p1");
        assert_eq!(out[0].text_preview, "Pray without ceasing.");
        assert!((out[0].score - 0.91).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_top_k_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(serde_json::json!({"topK": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"matches": []})))
            .expect(1)
            .mount(&server)
            .await;

        let out = index_at(&server.uri()).query(vec![1.0], 0, None).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_vector_is_invalid_input() {
        let err = index_at("http://127.0.0.1:1")
            .query(vec![], 5, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn client_error_is_invalid_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad vector dimension"))
            .mount(&server)
            .await;

        let err = index_at(&server.uri())
            .query(vec![1.0], 5, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input(), "got {err:?}");
        assert!(!err.to_string().contains("dimension"));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = index_at(&server.uri())
            .query(vec![1.0], 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Unavailable { status: 503 }));
    }
}
