//! Runtime state for a single GPU host

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::api::InfoResponse;
use crate::config::HostConfig;

/// Stable identifier of a host within its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(usize);

impl HostId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the host in configuration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0 + 1)
    }
}

/// VRAM reading taken from a host's /info endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadSnapshot {
    pub used_mb: Option<f64>,
    pub total_mb: Option<f64>,
    pub checked_at: DateTime<Utc>,
}

impl LoadSnapshot {
    pub fn from_info(info: &InfoResponse) -> Self {
        Self {
            used_mb: info.vram_used_mb,
            total_mb: info.vram_total_mb,
            checked_at: Utc::now(),
        }
    }

    /// used / total, or infinity when either reading is unusable
    pub fn load_ratio(&self) -> f64 {
        match (self.used_mb, self.total_mb) {
            (Some(used), Some(total)) if total > 0.0 => used / total,
            _ => f64::INFINITY,
        }
    }
}

#[derive(Debug)]
struct HostState {
    healthy: bool,
    consecutive_overloads: u32,
    last_error: Option<String>,
    last_load: Option<LoadSnapshot>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_overloads: 0,
            last_error: None,
            last_load: None,
        }
    }
}

/// A single GPU host with its health bookkeeping
#[derive(Debug)]
pub struct Host {
    pub id: HostId,
    /// Base URL, trailing slashes stripped
    pub url: String,
    pub name: String,
    pub api_key: Option<String>,
    state: Mutex<HostState>,
}

impl Host {
    /// Normalize a configured host into runtime form
    pub fn from_config(id: HostId, config: &HostConfig) -> Self {
        Self {
            id,
            url: config.base_url().to_string(),
            name: config
                .name
                .clone()
                .unwrap_or_else(|| format!("gpu-{}", id.index() + 1)),
            api_key: config.api_key.clone(),
            state: Mutex::new(HostState::default()),
        }
    }

    // Critical sections never span an await, so a poisoned lock still holds consistent data
    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_healthy(&self) -> bool {
        self.state().healthy
    }

    pub fn consecutive_overloads(&self) -> u32 {
        self.state().consecutive_overloads
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn last_load(&self) -> Option<LoadSnapshot> {
        self.state().last_load
    }

    /// Current load ratio; infinity until a usable /info reading exists
    pub fn load_ratio(&self) -> f64 {
        self.last_load().map_or(f64::INFINITY, |load| load.load_ratio())
    }

    /// Record a successful request. Returns true if the host was unhealthy before.
    pub(crate) fn record_success(&self) -> bool {
        let mut state = self.state();
        let recovered = !state.healthy;
        state.healthy = true;
        state.consecutive_overloads = 0;
        state.last_error = None;
        recovered
    }

    /// Count one 503 response, returning the new consecutive total
    pub(crate) fn record_overload(&self) -> u32 {
        let mut state = self.state();
        state.consecutive_overloads += 1;
        state.consecutive_overloads
    }

    pub(crate) fn mark_unhealthy(&self, error: String) {
        let mut state = self.state();
        state.healthy = false;
        state.last_error = Some(error);
    }

    pub(crate) fn set_load(&self, load: LoadSnapshot) {
        self.state().last_load = Some(load);
    }

    pub fn snapshot(&self) -> HostSnapshot {
        let state = self.state();
        HostSnapshot {
            id: self.id.to_string(),
            name: self.name.clone(),
            url: self.url.clone(),
            healthy: state.healthy,
            consecutive_overloads: state.consecutive_overloads,
            last_error: state.last_error.clone(),
            last_load: state.last_load,
        }
    }
}

/// Point-in-time copy of a host's state, for display
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub id: String,
    pub name: String,
    pub url: String,
    pub healthy: bool,
    pub consecutive_overloads: u32,
    pub last_error: Option<String>,
    pub last_load: Option<LoadSnapshot>,
}
