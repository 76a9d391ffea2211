//! Request/response bodies for the GPU service endpoints

use serde::{Deserialize, Serialize};

/// Response from GET /health
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub device: String,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Response from GET /info
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub vram_total_mb: Option<f64>,
    #[serde(default)]
    pub vram_used_mb: Option<f64>,
    #[serde(default)]
    pub pytorch_version: String,
    #[serde(default)]
    pub cuda_version: Option<String>,
    #[serde(default)]
    pub loaded_models: Vec<String>,
}

/// Response from GET /status
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusResponse {
    pub queue: QueueStatus,
    /// Opaque per-job descriptors reported by the service
    #[serde(default)]
    pub active_jobs: Vec<serde_json::Value>,
}

/// Concurrency slot usage on one host
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueStatus {
    pub max_concurrent: u32,
    pub in_flight: u32,
    pub available_slots: u32,
    #[serde(default)]
    pub waiting_estimate: u32,
}

/// Body for POST /embed
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl EmbedRequest {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            model: None,
        }
    }
}

/// Response from POST /embed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub dimensions: usize,
}

/// Body for POST /bertscore
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BertScoreRequest {
    pub candidates: Vec<String>,
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

/// Response from POST /bertscore
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BertScoreResponse {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    pub model: String,
}
