//! Firewall policy and rule endpoints
//!
//! A policy holds rules and is applied to at most one server group.

use crate::client::Client;
use crate::error::Result;
use crate::types::ResourceRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallPolicy {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub default: bool,
    pub server_group: Option<ResourceRef>,
    pub rules: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallPolicyOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallRule {
    pub id: String,
    pub protocol: Option<String>,
    pub source: Option<String>,
    pub source_port: Option<String>,
    pub destination: Option<String>,
    pub destination_port: Option<String>,
    pub icmp_type_name: Option<String>,
    pub description: Option<String>,
    pub firewall_policy: ResourceRef,
}

/// Rule fields; `firewall_policy` is only accepted on create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRuleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ServerGroupRequest<'a> {
    server_group: &'a str,
}

impl Client {
    pub async fn firewall_policy(&self, id: &str) -> Result<FirewallPolicy> {
        self.get(&format!("firewall_policies/{}", id)).await
    }

    pub async fn create_firewall_policy(
        &self,
        options: &FirewallPolicyOptions,
    ) -> Result<FirewallPolicy> {
        self.post("firewall_policies", options).await
    }

    pub async fn update_firewall_policy(
        &self,
        id: &str,
        options: &FirewallPolicyOptions,
    ) -> Result<FirewallPolicy> {
        self.put(&format!("firewall_policies/{}", id), options)
            .await
    }

    pub async fn destroy_firewall_policy(&self, id: &str) -> Result<()> {
        self.delete(&format!("firewall_policies/{}", id)).await
    }

    pub async fn apply_firewall_policy(
        &self,
        id: &str,
        server_group: &str,
    ) -> Result<FirewallPolicy> {
        self.post(
            &format!("firewall_policies/{}/apply_to", id),
            &ServerGroupRequest { server_group },
        )
        .await
    }

    pub async fn remove_firewall_policy(
        &self,
        id: &str,
        server_group: &str,
    ) -> Result<FirewallPolicy> {
        self.post(
            &format!("firewall_policies/{}/remove", id),
            &ServerGroupRequest { server_group },
        )
        .await
    }

    pub async fn firewall_rule(&self, id: &str) -> Result<FirewallRule> {
        self.get(&format!("firewall_rules/{}", id)).await
    }

    pub async fn create_firewall_rule(&self, options: &FirewallRuleOptions) -> Result<FirewallRule> {
        self.post("firewall_rules", options).await
    }

    pub async fn update_firewall_rule(
        &self,
        id: &str,
        options: &FirewallRuleOptions,
    ) -> Result<FirewallRule> {
        self.put(&format!("firewall_rules/{}", id), options).await
    }

    pub async fn destroy_firewall_rule(&self, id: &str) -> Result<()> {
        self.delete(&format!("firewall_rules/{}", id)).await
    }
}
