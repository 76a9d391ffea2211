//! Strategy dispatch for choosing the next host

use futures::future::join_all;

use super::balancer::LoadBalancer;
use super::least_busy::LeastBusyBalancer;
use super::node::{HostId, LoadSnapshot};
use super::registry::HostRegistry;
use super::round_robin::RoundRobinBalancer;
use crate::api::InfoResponse;
use crate::config::LoadBalancingStrategy;
use crate::executor::{RequestExecutor, HEALTH_PATH};

pub const INFO_PATH: &str = "/info";

/// Chooses which host serves the next attempt
#[derive(Debug)]
pub struct HostSelector {
    strategy: LoadBalancingStrategy,
    round_robin: RoundRobinBalancer,
    least_busy: LeastBusyBalancer,
}

impl HostSelector {
    pub fn new(strategy: LoadBalancingStrategy) -> Self {
        Self {
            strategy,
            round_robin: RoundRobinBalancer::new(),
            least_busy: LeastBusyBalancer::new(),
        }
    }

    pub fn strategy(&self) -> LoadBalancingStrategy {
        self.strategy
    }

    /// Pick a host for `path`.
    ///
    /// Least-busy refreshes every healthy host's load first, so each call
    /// costs a full round of /info probes. Health checks always use round-robin.
    pub async fn select(&self, registry: &HostRegistry, executor: &RequestExecutor, path: &str) -> HostId {
        if self.strategy == LoadBalancingStrategy::LeastBusy && path != HEALTH_PATH {
            refresh_loads(registry, executor).await;
            // A failed probe may have just marked a host unhealthy
            let pool = registry.healthy_hosts();
            let id = self.least_busy.select(&pool);
            if let Some(host) = registry.get(id) {
                tracing::debug!(
                    strategy = self.least_busy.strategy_name(),
                    host = %host.name,
                    load_ratio = host.load_ratio(),
                    "Selected GPU host"
                );
            }
            return id;
        }

        let pool = registry.healthy_hosts();
        let id = self.round_robin.select(&pool);
        if let Some(host) = registry.get(id) {
            tracing::debug!(
                strategy = self.round_robin.strategy_name(),
                host = %host.name,
                "Selected GPU host"
            );
        }
        id
    }
}

/// Probe /info on every healthy host concurrently and store each reading.
/// Probe failures are already recorded on the host by the executor.
pub async fn refresh_loads(registry: &HostRegistry, executor: &RequestExecutor) {
    let probes = registry.healthy_hosts().into_iter().map(|host| async move {
        match executor.execute::<InfoResponse>(host, INFO_PATH, None).await {
            Ok(info) => host.set_load(LoadSnapshot::from_info(&info)),
            Err(e) => {
                tracing::debug!(host = %host.name, error = %e, "Load probe failed");
            }
        }
    });
    join_all(probes).await;
}
