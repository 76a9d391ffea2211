//! Multi-host registry and load balancing

mod balancer;
mod least_busy;
mod node;
mod registry;
mod round_robin;
mod selector;

pub use balancer::LoadBalancer;
pub use least_busy::LeastBusyBalancer;
pub use node::{Host, HostId, HostSnapshot, LoadSnapshot};
pub use registry::HostRegistry;
pub use round_robin::RoundRobinBalancer;
pub use selector::{refresh_loads, HostSelector, INFO_PATH};
