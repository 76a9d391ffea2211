//! Public multi-host client

use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::api::{
    BertScoreRequest, BertScoreResponse, EmbedRequest, EmbedResponse, HealthResponse, InfoResponse,
    StatusResponse,
};
use crate::config::{BridgeConfig, ConfigError, LimitsConfig, LoadBalancingStrategy, ModelsConfig};
use crate::error::{BridgeError, Result};
use crate::executor::{RequestExecutor, HEALTH_PATH};
use crate::hosts::{HostRegistry, HostSelector, HostSnapshot, INFO_PATH};
use crate::monitor::{run_health_checks, MonitorHandle};
use crate::validation::validate_texts;

const STATUS_PATH: &str = "/status";
const EMBED_PATH: &str = "/embed";
const BERTSCORE_PATH: &str = "/bertscore";

/// State shared between the client and its health monitor task
pub(crate) struct Inner {
    pub(crate) registry: HostRegistry,
    pub(crate) executor: RequestExecutor,
    selector: HostSelector,
    limits: LimitsConfig,
    models: ModelsConfig,
}

impl Inner {
    /// Try `path` on up to one attempt per configured host.
    ///
    /// A host already tried in this call is skipped, but the iteration still
    /// counts, which bounds the work to the configured host count.
    async fn request_with_failover<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let request_id = Uuid::new_v4();
        let attempts = self.registry.len();
        let mut tried = HashSet::new();
        let mut last_error = None;

        for i in 0..attempts {
            let id = self.selector.select(&self.registry, &self.executor, path).await;
            if !tried.insert(id) {
                tracing::debug!(request_id = %request_id, path, host_id = %id, "Host already tried, skipping");
                continue;
            }

            let Some(host) = self.registry.get(id) else {
                continue;
            };
            tracing::debug!(
                request_id = %request_id,
                path,
                host = %host.name,
                attempt = i + 1,
                max_attempts = attempts,
                "Dispatching request"
            );

            match self.executor.execute::<T>(host, path, body.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        path,
                        host = %host.name,
                        error = %e,
                        "Attempt failed, failing over"
                    );
                    last_error = Some(e);
                }
            }
        }

        tracing::error!(request_id = %request_id, path, tried = tried.len(), "All GPU hosts failed");
        Err(BridgeError::AllHostsFailed {
            path: path.to_string(),
            last: last_error,
        })
    }
}

/// Client presenting one logical endpoint over every configured GPU host
pub struct BridgeClient {
    inner: Arc<Inner>,
    monitor: Option<MonitorHandle>,
}

impl BridgeClient {
    /// Build the client and start its health monitor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        if config.timeout_seconds == 0 {
            return Err(ConfigError::Validation("timeout_seconds must be greater than 0".to_string()).into());
        }
        if config.health_check_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "health_check_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConfigError::Validation("BridgeClient must be created inside a Tokio runtime".to_string()).into());
        }

        let registry = HostRegistry::from_config(&config)?;
        let executor = RequestExecutor::new(Duration::from_secs(config.timeout_seconds))
            .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            hosts = registry.len(),
            strategy = config.load_balancing.as_str(),
            timeout_secs = config.timeout_seconds,
            "GPU bridge client created"
        );

        let inner = Arc::new(Inner {
            registry,
            executor,
            selector: HostSelector::new(config.load_balancing),
            limits: config.limits,
            models: config.models,
        });

        let monitor = MonitorHandle::spawn(
            inner.clone(),
            Duration::from_secs(config.health_check_interval_seconds),
        );

        Ok(Self {
            inner,
            monitor: Some(monitor),
        })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.inner.request_with_failover(HEALTH_PATH, None).await
    }

    pub async fn info(&self) -> Result<InfoResponse> {
        self.inner.request_with_failover(INFO_PATH, None).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        self.inner.request_with_failover(STATUS_PATH, None).await
    }

    pub async fn embed(&self, mut req: EmbedRequest) -> Result<EmbedResponse> {
        validate_texts(&req.texts, "texts", &self.inner.limits)?;
        if req.model.is_none() {
            req.model = self.inner.models.embed.clone();
        }
        self.inner.request_with_failover(EMBED_PATH, Some(to_body(&req))).await
    }

    pub async fn bertscore(&self, mut req: BertScoreRequest) -> Result<BertScoreResponse> {
        validate_texts(&req.candidates, "candidates", &self.inner.limits)?;
        validate_texts(&req.references, "references", &self.inner.limits)?;
        if req.model_type.is_none() {
            req.model_type = self.inner.models.bertscore.clone();
        }
        self.inner.request_with_failover(BERTSCORE_PATH, Some(to_body(&req))).await
    }

    /// Current state of every configured host
    pub fn hosts(&self) -> Vec<HostSnapshot> {
        self.inner.registry.snapshots()
    }

    pub fn strategy(&self) -> LoadBalancingStrategy {
        self.inner.selector.strategy()
    }

    /// Run one health probe round now, outside the monitor's schedule
    pub async fn check_hosts(&self) {
        run_health_checks(&self.inner.registry, &self.inner.executor).await;
    }

    /// Stop the background health monitor
    pub async fn shutdown(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop().await;
        }
    }
}

// Request structs only hold strings, so serialization cannot fail
fn to_body<T: serde::Serialize>(req: &T) -> serde_json::Value {
    serde_json::to_value(req).unwrap_or(serde_json::Value::Null)
}
