//! Resource kinds
//!
//! Each module owns a typed attribute struct, the mapping between those
//! attributes and the API models, and the [`Resource`](brightbox_cloud::Resource)
//! implementation that drives the remote calls.

pub mod cloud_ip;
pub mod firewall_policy;
pub mod firewall_rule;
pub mod load_balancer;
pub mod server;
pub mod server_group;

pub use cloud_ip::{CloudIpAttributes, CloudIpResource};
pub use firewall_policy::{FirewallPolicyAttributes, FirewallPolicyResource};
pub use firewall_rule::{FirewallRuleAttributes, FirewallRuleResource};
pub use load_balancer::{LoadBalancerAttributes, LoadBalancerResource};
pub use server::{ServerAttributes, ServerResource};
pub use server_group::{ServerGroupAttributes, ServerGroupResource};

/// `None` for an empty string
pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Request value for a changed optional field
///
/// A field that was removed is sent as an empty string so the API clears it.
pub(crate) fn cleared(change: Option<Option<String>>) -> Option<String> {
    change.map(Option::unwrap_or_default)
}
