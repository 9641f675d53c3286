//! Brightbox Cloud provider
//!
//! Resource kinds, provider configuration and the authenticated session they
//! run against.
//!
//! ```text
//! ProviderConfig ──with_env_defaults──▶ credentials() ──▶ Session::connect
//!                                                              │
//! ResourceRequest ──▶ registry().dispatch(&session, ..) ◀──────┘
//!                         │
//!                         ├─ brightbox_server
//!                         ├─ brightbox_load_balancer
//!                         ├─ brightbox_cloudip
//!                         ├─ brightbox_server_group
//!                         ├─ brightbox_firewall_policy
//!                         └─ brightbox_firewall_rule
//! ```

pub mod config;
pub mod connection;
mod error;
pub mod resources;
pub mod session;
pub mod userdata;

pub use config::{CredentialMode, Credentials, ProviderConfig};
pub use resources::{
    CloudIpResource, FirewallPolicyResource, FirewallRuleResource, LoadBalancerResource,
    ServerGroupResource, ServerResource,
};
pub use session::Session;

use brightbox_cloud::ResourceRegistry;

/// Registry holding every resource kind this provider manages
pub fn registry() -> ResourceRegistry<Session> {
    ResourceRegistry::new()
        .register(ServerResource)
        .register(LoadBalancerResource)
        .register(CloudIpResource)
        .register(ServerGroupResource)
        .register(FirewallPolicyResource)
        .register(FirewallRuleResource)
}
