//! Mock GPU service hosts for integration tests
//!
//! Each mock serves /health, /info, /status, /embed and /bertscore on an
//! ephemeral port and records every request it receives.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use gpu_bridge::config::{BridgeConfig, HostConfig};
use gpu_bridge::BridgeClient;

/// Behaviour knobs for one mock host
#[derive(Debug, Clone, Default)]
pub struct MockHostOptions {
    pub vram_total: Option<f64>,
    pub vram_used: Option<f64>,
    /// Require this X-API-Key on every path except /health
    pub api_key: Option<String>,
    /// Answer the first N compute requests with 503
    pub busy_503_count: usize,
    /// Retry-After value sent with simulated 503s
    pub retry_after: Option<String>,
    /// Answer /health with 503, carrying `retry_after` when set
    pub health_503: bool,
    /// Answer compute requests with 500
    pub fail_compute: bool,
    /// Delay before answering compute requests
    pub compute_delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct MockState {
    options: MockHostOptions,
    busy_remaining: usize,
    received: Vec<ReceivedRequest>,
}

type SharedMockState = Arc<Mutex<MockState>>;

pub struct MockGpuHost {
    pub url: String,
    state: SharedMockState,
}

impl MockGpuHost {
    pub async fn start(options: MockHostOptions) -> Self {
        let state: SharedMockState = Arc::new(Mutex::new(MockState {
            busy_remaining: options.busy_503_count,
            options,
            received: Vec::new(),
        }));

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock GPU host failed");
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub async fn healthy() -> Self {
        Self::start(MockHostOptions::default()).await
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// URL of a port nothing listens on
pub async fn dead_host_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config over `urls` whose background monitor only runs its initial round
pub fn config_for(urls: &[&str]) -> BridgeConfig {
    let mut config = BridgeConfig::with_hosts(urls.iter().map(|u| HostConfig::new(*u)).collect());
    config.health_check_interval_seconds = 3600;
    config
}

/// Build a client and let the monitor's initial probe round finish
pub async fn start_client(config: BridgeConfig) -> BridgeClient {
    let client = BridgeClient::new(config).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    client
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, [("Content-Type", "application/json")], body.to_string()).into_response()
}

async fn handle(State(state): State<SharedMockState>, request: Request<Body>) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body_bytes = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    let is_compute = path == "/embed" || path == "/bertscore";

    let (options, busy) = {
        let mut state = state.lock().unwrap();
        state.received.push(ReceivedRequest {
            method,
            path: path.clone(),
            api_key: api_key.clone(),
            body: body.clone(),
        });
        let busy = is_compute && state.busy_remaining > 0;
        if busy {
            state.busy_remaining -= 1;
        }
        (state.options.clone(), busy)
    };

    if let Some(ref expected) = options.api_key {
        if path != "/health" && api_key.as_deref() != Some(expected.as_str()) {
            return json_response(StatusCode::UNAUTHORIZED, json!({"detail": "Unauthorized"}));
        }
    }

    if busy || (path == "/health" && options.health_503) {
        let mut response = json_response(StatusCode::SERVICE_UNAVAILABLE, json!({"detail": "GPU busy"}));
        if let Some(ref retry_after) = options.retry_after {
            response
                .headers_mut()
                .insert("retry-after", retry_after.parse().unwrap());
        }
        return response;
    }

    if is_compute {
        if options.fail_compute {
            return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "CUDA error"}));
        }
        if let Some(delay) = options.compute_delay {
            tokio::time::sleep(delay).await;
        }
    }

    match path.as_str() {
        "/health" => json_response(StatusCode::OK, json!({"status": "ok", "device": "cuda"})),
        "/info" => json_response(
            StatusCode::OK,
            json!({
                "device": "cuda",
                "device_name": "Mock GPU",
                "vram_total_mb": options.vram_total,
                "vram_used_mb": options.vram_used,
                "pytorch_version": "2.5.0",
                "cuda_version": "12.4",
                "loaded_models": ["embed:all-MiniLM-L6-v2", "bertscore:roberta-large"]
            }),
        ),
        "/status" => json_response(
            StatusCode::OK,
            json!({
                "queue": {"max_concurrent": 2, "in_flight": 0, "available_slots": 2, "waiting_estimate": 0},
                "active_jobs": []
            }),
        ),
        "/embed" => {
            let count = body["texts"].as_array().map_or(0, |t| t.len());
            let model = body["model"].as_str().unwrap_or("all-MiniLM-L6-v2");
            json_response(
                StatusCode::OK,
                json!({
                    "embeddings": vec![vec![0.1; 4]; count],
                    "model": model,
                    "dimensions": 4
                }),
            )
        }
        "/bertscore" => {
            let count = body["candidates"].as_array().map_or(0, |c| c.len());
            let model = body["model_type"].as_str().unwrap_or("roberta-large");
            json_response(
                StatusCode::OK,
                json!({
                    "precision": vec![0.95; count],
                    "recall": vec![0.93; count],
                    "f1": vec![0.94; count],
                    "model": model
                }),
            )
        }
        _ => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
