//! Backend API client.
//!
//! All endpoints live under `/api/v1` and use bearer-token authentication.
//! Responses are interpreted through [`ApiOutcome`].

use crate::models::api::{ApiOutcome, GraphQueryRequest, MemoryRequest, SearchRequest};
use crate::models::config::ApiConfig;
use crate::Result;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

const API_PREFIX: &str = "/api/v1";

/// Backend API client.
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client from configuration.
    pub fn with_config(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url(), API_PREFIX, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiOutcome<Value>> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                crate::Error::ApiUnreachable(format!("{} ({})", self.base_url(), e))
            } else {
                crate::Error::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("API response {} ({} bytes)", status, body.len());
        interpret_response(status, &body)
    }

    async fn get(&self, path: &str) -> Result<ApiOutcome<Value>> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiOutcome<Value>> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiOutcome<Value>> {
        self.send(self.client.delete(self.url(path))).await
    }

    /// Check whether the backend answers `GET /health`.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url());
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    pub async fn store_memory(&self, request: &MemoryRequest) -> Result<ApiOutcome<Value>> {
        self.post("/memory", request).await
    }

    pub async fn get_memory(&self, id: &str) -> Result<ApiOutcome<Value>> {
        self.get(&format!("/memory/{}", urlencoding::encode(id))).await
    }

    pub async fn list_memories(
        &self,
        limit: usize,
        memory_type: Option<&str>,
    ) -> Result<ApiOutcome<Value>> {
        let mut path = format!("/memory?limit={}", limit);
        if let Some(memory_type) = memory_type {
            path.push_str(&format!("&memory_type={}", urlencoding::encode(memory_type)));
        }
        self.get(&path).await
    }

    pub async fn search_memories(&self, request: &SearchRequest) -> Result<ApiOutcome<Value>> {
        self.post("/memory/search", request).await
    }

    pub async fn delete_memory(&self, id: &str) -> Result<ApiOutcome<Value>> {
        self.delete(&format!("/memory/{}", urlencoding::encode(id))).await
    }

    /// Build (or rebuild) the knowledge graph from stored memories.
    pub async fn build_graph(&self, rebuild: bool) -> Result<ApiOutcome<Value>> {
        self.post("/graph/build", &json!({ "rebuild": rebuild })).await
    }

    pub async fn query_graph(&self, request: &GraphQueryRequest) -> Result<ApiOutcome<Value>> {
        self.post("/graph/query", request).await
    }

    pub async fn export_graph(&self, format: &str) -> Result<ApiOutcome<Value>> {
        self.get(&format!("/graph/export?format={}", urlencoding::encode(format)))
            .await
    }

    pub async fn subgraph(&self, request: &GraphQueryRequest) -> Result<ApiOutcome<Value>> {
        self.post("/graph/subgraph", request).await
    }

    /// Sync memories with a notes vault.
    pub async fn sync_vault(&self, vault_path: Option<&str>) -> Result<ApiOutcome<Value>> {
        self.post("/vault/sync", &json!({ "vault_path": vault_path }))
            .await
    }

    pub async fn generate_docs(&self, target: &str, doc_type: &str) -> Result<ApiOutcome<Value>> {
        self.post(
            "/docs/generate",
            &json!({ "target": target, "doc_type": doc_type }),
        )
        .await
    }

    pub async fn create_checkpoint(
        &self,
        message: &str,
        tags: &[String],
    ) -> Result<ApiOutcome<Value>> {
        self.post("/checkpoint", &json!({ "message": message, "tags": tags }))
            .await
    }
}

/// Interpret an HTTP response as an [`ApiOutcome`].
///
/// The envelope's `status` field wins. Bodies without one fall back to the
/// HTTP status: 404 is `NotFound`, other failures are `Failed`.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<ApiOutcome<Value>> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(value) = parsed {
        if value.get("status").and_then(Value::as_str).is_some() {
            return ApiOutcome::from_value(value);
        }
        if status.is_success() {
            return Err(crate::Error::InvalidResponse(
                "missing 'status' field".to_string(),
            ));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(ApiOutcome::NotFound);
        }
        let message = value
            .get("message")
            .or_else(|| value.get("detail"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Ok(ApiOutcome::Failed {
            message,
            details: Some(value),
        });
    }

    match status {
        StatusCode::NOT_FOUND => Ok(ApiOutcome::NotFound),
        s if s.is_success() => Err(crate::Error::InvalidResponse(
            "response body is not JSON".to_string(),
        )),
        s => Ok(ApiOutcome::Failed {
            message: format!("HTTP {}", s),
            details: None,
        }),
    }
}
