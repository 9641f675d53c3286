//! Brightbox Cloud API client
//!
//! A thin async client over the Brightbox Cloud REST API (version 1.0).
//! Authentication uses the OAuth2 token endpoint with either API client
//! credentials or user credentials on behalf of an OAuth application.
//!
//! Each API collection lives in its own module and adds its calls to
//! [`Client`]:
//!
//! - [`servers`]: servers
//! - [`cloud_ips`]: cloud IPs and their mapping
//! - [`server_groups`]: server groups
//! - [`firewall`]: firewall policies and rules
//! - [`load_balancers`]: load balancers
//!
//! # Example
//!
//! ```ignore
//! use brightbox_api::{Client, Grant};
//!
//! let http = Client::http_client()?;
//! let client = Client::authenticate(
//!     http,
//!     brightbox_api::DEFAULT_API_URL,
//!     "cli-abcde",
//!     &"secret".to_string().into(),
//!     &Grant::ClientCredentials,
//!     None,
//! )
//! .await?;
//!
//! let server = client.server("srv-12345").await?;
//! println!("{} is {}", server.id, server.status);
//! ```

pub mod client;
pub mod cloud_ips;
pub mod error;
pub mod firewall;
pub mod load_balancers;
pub mod server_groups;
pub mod servers;
pub mod types;

pub use client::{Client, DEFAULT_API_URL, DEFAULT_ORBIT_URL, Grant};
pub use cloud_ips::{CloudIp, CloudIpOptions};
pub use error::{ApiError, Result};
pub use firewall::{FirewallPolicy, FirewallPolicyOptions, FirewallRule, FirewallRuleOptions};
pub use load_balancers::{Healthcheck, Listener, LoadBalancer, LoadBalancerOptions, NodeRef};
pub use server_groups::{ServerGroup, ServerGroupOptions};
pub use servers::{Interface, Server, ServerOptions};
pub use types::{ImageRef, ResourceRef, ServerTypeRef, ZoneRef};
