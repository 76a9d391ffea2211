//! Round-robin load balancing strategy

use std::sync::atomic::{AtomicUsize, Ordering};

use super::balancer::LoadBalancer;
use super::node::{Host, HostId};

/// Round-robin load balancer. Cycles through the pool with one shared counter.
///
/// The counter is never reset; it indexes whatever pool it is handed, so
/// distribution stays even across calls while the pool size is stable.
#[derive(Debug, Default)]
pub struct RoundRobinBalancer {
    counter: AtomicUsize,
}

impl RoundRobinBalancer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobinBalancer {
    fn select(&self, pool: &[&Host]) -> HostId {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % pool.len();
        pool[idx].id
    }

    fn strategy_name(&self) -> &'static str {
        "round-robin"
    }
}
