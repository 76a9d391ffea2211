//! gpu-bridge: multi-host client for a remote GPU compute service
//!
//! Features:
//! - Round-robin and least-busy (VRAM ratio) host selection
//! - Failover across hosts, at most one attempt per host per request
//! - Retry-After aware handling of 503 overload responses
//! - Background health monitoring
//! - Batch/text length limits checked before any network call

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod hosts;
pub mod monitor;
pub mod validation;

pub use client::BridgeClient;
pub use config::BridgeConfig;
pub use error::{BridgeError, HostError, ValidationError};
