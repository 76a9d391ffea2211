mod loader;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use loader::load_config;

/// Main client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Ordered host list; the order seeds round-robin selection
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    /// Legacy single-host URL, used only when `hosts` is empty
    #[serde(default, alias = "url")]
    pub service_url: Option<String>,
    /// Credential for the legacy host, and fallback for hosts without their own
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds for every path except /health
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Background health probe cadence in seconds
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_seconds: u64,
    #[serde(default)]
    pub load_balancing: LoadBalancingStrategy,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

/// One configured GPU host
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Base URL (e.g., "http://gpu-box:8765")
    pub url: String,
    /// Display label, defaults to "gpu-<n>"
    #[serde(default)]
    pub name: Option<String>,
    /// Sent as X-API-Key on every request to this host
    #[serde(default)]
    pub api_key: Option<String>,
}

impl HostConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            api_key: None,
        }
    }

    /// Returns the base URL with trailing slashes stripped
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Host selection strategy
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancingStrategy {
    #[default]
    RoundRobin,
    LeastBusy,
}

impl LoadBalancingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancingStrategy::RoundRobin => "round-robin",
            LoadBalancingStrategy::LeastBusy => "least-busy",
        }
    }
}

impl std::str::FromStr for LoadBalancingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" | "round_robin" => Ok(Self::RoundRobin),
            "least-busy" | "least_busy" => Ok(Self::LeastBusy),
            other => Err(ConfigError::Validation(format!(
                "Unknown load balancing strategy: '{}'. Supported: round-robin, least-busy",
                other
            ))),
        }
    }
}

/// Request shape limits enforced before any network call
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

fn default_max_batch_size() -> usize {
    100
}

fn default_max_text_length() -> usize {
    10_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_text_length: default_max_text_length(),
        }
    }
}

/// Default model names applied when a request leaves the model unset
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub embed: Option<String>,
    #[serde(default)]
    pub bertscore: Option<String>,
}

fn default_timeout() -> u64 {
    45
}

fn default_health_check_interval() -> u64 {
    30
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            service_url: None,
            api_key: None,
            timeout_seconds: default_timeout(),
            health_check_interval_seconds: default_health_check_interval(),
            load_balancing: LoadBalancingStrategy::default(),
            limits: LimitsConfig::default(),
            models: ModelsConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Configuration with an explicit host list and defaults for everything else
    pub fn with_hosts(hosts: Vec<HostConfig>) -> Self {
        Self {
            hosts,
            ..Default::default()
        }
    }

    /// Legacy single-host shorthand
    pub fn single_host(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            service_url: Some(url.into()),
            api_key,
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    /// Load configuration with fallback to default paths
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let default_paths = ["gpu-bridge.yaml", "gpu-bridge.yml", "./config/gpu-bridge.yaml"];
                for p in default_paths {
                    let path = Path::new(p);
                    if path.exists() {
                        return Self::from_file(path);
                    }
                }
                Err(ConfigError::NotFound(
                    "No config file found. Tried: gpu-bridge.yaml, gpu-bridge.yml, ./config/gpu-bridge.yaml"
                        .to_string(),
                ))
            }
        }
    }

    /// Resolve the effective host list.
    ///
    /// `hosts` wins when non-empty; otherwise `service_url` becomes a single
    /// host named "gpu-1". Hosts without a credential inherit `api_key`.
    pub fn resolved_hosts(&self) -> Result<Vec<HostConfig>, ConfigError> {
        let hosts = if !self.hosts.is_empty() {
            self.hosts.clone()
        } else if let Some(ref url) = self.service_url {
            vec![HostConfig {
                url: url.clone(),
                name: Some("gpu-1".to_string()),
                api_key: self.api_key.clone(),
            }]
        } else {
            return Err(ConfigError::NoHosts);
        };

        hosts
            .into_iter()
            .map(|mut host| {
                url::Url::parse(host.base_url()).map_err(|e| {
                    ConfigError::Validation(format!("Invalid host URL '{}': {}", host.url, e))
                })?;
                if host.api_key.is_none() {
                    host.api_key = self.api_key.clone();
                }
                Ok(host)
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("GPU Bridge config invalid: set hosts[] or service_url/url")]
    NoHosts,

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
