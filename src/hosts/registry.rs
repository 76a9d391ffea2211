//! Canonical host table shared by selection, execution and health probing

use super::node::{Host, HostId, HostSnapshot};
use crate::config::{BridgeConfig, ConfigError, HostConfig};

/// Owns every configured host. Hosts are fixed for the client's lifetime.
#[derive(Debug)]
pub struct HostRegistry {
    hosts: Vec<Host>,
}

impl HostRegistry {
    pub fn new(hosts: &[HostConfig]) -> Result<Self, ConfigError> {
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        let hosts = hosts
            .iter()
            .enumerate()
            .map(|(i, config)| Host::from_config(HostId::new(i), config))
            .collect();
        Ok(Self { hosts })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, ConfigError> {
        Self::new(&config.resolved_hosts()?)
    }

    /// Every host in configuration order
    pub fn all_hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Hosts currently marked healthy, or every host when none are.
    ///
    /// Falling back to the full set lets a recovered host be found by live
    /// traffic instead of refusing all requests.
    pub fn healthy_hosts(&self) -> Vec<&Host> {
        let healthy: Vec<&Host> = self.hosts.iter().filter(|h| h.is_healthy()).collect();
        if healthy.is_empty() {
            self.hosts.iter().collect()
        } else {
            healthy
        }
    }

    /// Look up a host by id. `None` when the id is out of range for this registry.
    pub fn get(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn snapshots(&self) -> Vec<HostSnapshot> {
        self.hosts.iter().map(Host::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(urls: &[&str]) -> HostRegistry {
        let configs: Vec<HostConfig> = urls.iter().map(|u| HostConfig::new(*u)).collect();
        HostRegistry::new(&configs).unwrap()
    }

    #[test]
    fn test_empty_registry_error() {
        assert!(matches!(HostRegistry::new(&[]), Err(ConfigError::NoHosts)));
    }

    #[test]
    fn test_ids_and_names_follow_config_order() {
        let reg = registry(&["http://a:8765", "http://b:8765/"]);
        let ids: Vec<String> = reg.all_hosts().iter().map(|h| h.id.to_string()).collect();
        assert_eq!(ids, vec!["host-1", "host-2"]);
        assert_eq!(reg.all_hosts()[1].name, "gpu-2");
        assert_eq!(reg.all_hosts()[1].url, "http://b:8765");
    }

    #[test]
    fn test_healthy_hosts_filters_unhealthy() {
        let reg = registry(&["http://a:8765", "http://b:8765", "http://c:8765"]);
        reg.all_hosts()[1].mark_unhealthy("down".to_string());

        let healthy: Vec<&str> = reg.healthy_hosts().iter().map(|h| h.url.as_str()).collect();
        assert_eq!(healthy, vec!["http://a:8765", "http://c:8765"]);
    }

    #[test]
    fn test_healthy_hosts_fails_open() {
        let reg = registry(&["http://a:8765", "http://b:8765"]);
        for host in reg.all_hosts() {
            host.mark_unhealthy("down".to_string());
        }
        assert_eq!(reg.healthy_hosts().len(), 2);
    }

    #[test]
    fn test_get_by_id() {
        let reg = registry(&["http://a:8765", "http://b:8765"]);
        let id = reg.all_hosts()[1].id;
        assert_eq!(reg.get(id).unwrap().url, "http://b:8765");
    }

    #[test]
    fn test_get_foreign_id_is_none() {
        let large = registry(&["http://a:8765", "http://b:8765", "http://c:8765"]);
        let small = registry(&["http://a:8765"]);
        let foreign = large.all_hosts()[2].id;
        assert!(small.get(foreign).is_none());
    }

    #[test]
    fn test_from_config_legacy() {
        let config = BridgeConfig::single_host("http://legacy:8765/", Some("k".to_string()));
        let reg = HostRegistry::from_config(&config).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.all_hosts()[0].url, "http://legacy:8765");
        assert_eq!(reg.all_hosts()[0].api_key.as_deref(), Some("k"));
    }
}
