//! Managed retrieval service client.
//!
//! Speaks the knowledge-base `retrieve` shape: a query text plus a result
//! count in, a list of scored passages out.

use async_trait::async_trait;
use serde::Deserialize;

use super::{KnowledgeBase, KnowledgeError, Passage};

pub struct HttpKnowledgeBase {
    client: reqwest::Client,
    endpoint: String,
    kb_id: String,
}

impl HttpKnowledgeBase {
    pub fn new(endpoint: &str, kb_id: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            kb_id: kb_id.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/knowledgebases/{}/retrieve", self.endpoint, self.kb_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
    #[serde(default)]
    score: f64,
    location: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    text: String,
}

fn request_body(query: &str, max_results: usize) -> serde_json::Value {
    serde_json::json!({
        "retrievalQuery": { "text": query },
        "retrievalConfiguration": {
            "vectorSearchConfiguration": { "numberOfResults": max_results }
        }
    })
}

fn into_passages(response: RetrieveResponse) -> Vec<Passage> {
    response
        .retrieval_results
        .into_iter()
        .map(|r| Passage {
            text: r.content.text,
            score: r.score,
            source: r.location.map(|loc| location_label(&loc)),
        })
        .collect()
}

/// Prefer a URI-like field from the location object, else its JSON form.
fn location_label(location: &serde_json::Value) -> String {
    let uri = location
        .as_object()
        .into_iter()
        .flat_map(|obj| obj.values())
        .find_map(|v| v.get("uri").or_else(|| v.get("url")).and_then(|u| u.as_str()));
    match uri {
        Some(uri) => uri.to_string(),
        None => location.to_string(),
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, KnowledgeError> {
        tracing::debug!(kb_id = %self.kb_id, max_results, "knowledge base retrieve");

        let response = self
            .client
            .post(self.url())
            .json(&request_body(query, max_results))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "knowledge base retrieve failed");
            return Err(KnowledgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RetrieveResponse = response.json().await?;
        Ok(into_passages(parsed))
    }

    fn id(&self) -> &str {
        &self.kb_id
    }
}
