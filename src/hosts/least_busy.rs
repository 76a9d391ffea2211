//! Least-busy load balancing strategy

use super::balancer::LoadBalancer;
use super::node::{Host, HostId};

/// Picks the host with the lowest VRAM used/total ratio.
///
/// Hosts without a usable reading count as infinitely loaded. Ties go to
/// the earlier host in the pool.
#[derive(Debug, Default)]
pub struct LeastBusyBalancer;

impl LeastBusyBalancer {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastBusyBalancer {
    fn select(&self, pool: &[&Host]) -> HostId {
        let mut best = pool[0];
        let mut best_ratio = best.load_ratio();
        for &host in &pool[1..] {
            let ratio = host.load_ratio();
            if ratio < best_ratio {
                best = host;
                best_ratio = ratio;
            }
        }
        best.id
    }

    fn strategy_name(&self) -> &'static str {
        "least-busy"
    }
}
