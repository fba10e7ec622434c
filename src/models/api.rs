//! Backend API response model.
//!
//! Every backend response is a JSON object with a `status` field:
//! `success`, `error` or `not_found`. Error responses carry `message`
//! and optionally `details`.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of a backend response envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    /// `status: success`, payload is the rest of the body.
    Success(T),
    /// `status: not_found`.
    NotFound,
    /// `status: error`.
    Failed {
        message: String,
        details: Option<Value>,
    },
}

impl ApiOutcome<Value> {
    /// Interpret a raw response body.
    ///
    /// Missing `status` is treated as an invalid response rather than success.
    pub fn from_value(body: Value) -> Result<Self> {
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| crate::Error::InvalidResponse("missing 'status' field".to_string()))?;

        match status {
            "success" => Ok(ApiOutcome::Success(body)),
            "not_found" => Ok(ApiOutcome::NotFound),
            "error" => Ok(ApiOutcome::Failed {
                message: body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
                details: body.get("details").cloned(),
            }),
            other => Err(crate::Error::InvalidResponse(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }

    /// Decode the success payload into a concrete type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiOutcome<T>> {
        match self {
            ApiOutcome::Success(value) => Ok(ApiOutcome::Success(serde_json::from_value(value)?)),
            ApiOutcome::NotFound => Ok(ApiOutcome::NotFound),
            ApiOutcome::Failed { message, details } => Ok(ApiOutcome::Failed { message, details }),
        }
    }
}

impl<T> ApiOutcome<T> {
    /// Convert into a `Result`, mapping `NotFound` and `Failed` to errors.
    pub fn into_result(self, what: &str) -> Result<T> {
        match self {
            ApiOutcome::Success(value) => Ok(value),
            ApiOutcome::NotFound => Err(crate::Error::ApiNotFound(what.to_string())),
            ApiOutcome::Failed { message, details } => Err(crate::Error::Api { message, details }),
        }
    }
}

/// Request body for storing a memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRequest {
    pub content: String,
    pub memory_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f32>,
}

/// Request body for memory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
}

/// Request body for graph queries and subgraph extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A graph node as returned by graph export/subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
}

/// A graph edge as returned by graph export/subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Graph payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}
