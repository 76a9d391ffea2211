//! Load balancer trait

use super::node::{Host, HostId};

/// Strategy for picking one host out of a candidate pool
pub trait LoadBalancer: Send + Sync {
    /// Select a host from `pool`, which is never empty
    fn select(&self, pool: &[&Host]) -> HostId;

    /// Return the strategy name (for logging)
    fn strategy_name(&self) -> &'static str;
}
