//! Load balancer endpoints

use crate::client::Client;
use crate::cloud_ips::CloudIp;
use crate::error::Result;
use crate::types::ResourceRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    pub id: String,
    pub name: Option<String>,
    /// creating, active, deleting, deleted, failing, failed
    pub status: String,
    pub locked: bool,
    pub policy: String,
    pub buffer_size: Option<u32>,
    pub listeners: Vec<Listener>,
    pub healthcheck: Healthcheck,
    pub nodes: Vec<ResourceRef>,
    pub cloud_ips: Vec<CloudIp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub protocol: String,
    #[serde(rename = "in")]
    pub in_port: u16,
    pub out: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Healthcheck {
    #[serde(rename = "type")]
    pub kind: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_up: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_down: Option<u32>,
}

/// Backend server entry in a load balancer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    pub node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadBalancerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<Vec<Listener>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_pem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_private_key: Option<String>,
}

impl Client {
    pub async fn load_balancer(&self, id: &str) -> Result<LoadBalancer> {
        self.get(&format!("load_balancers/{}", id)).await
    }

    pub async fn create_load_balancer(&self, options: &LoadBalancerOptions) -> Result<LoadBalancer> {
        self.post("load_balancers", options).await
    }

    pub async fn update_load_balancer(
        &self,
        id: &str,
        options: &LoadBalancerOptions,
    ) -> Result<LoadBalancer> {
        self.put(&format!("load_balancers/{}", id), options).await
    }

    pub async fn destroy_load_balancer(&self, id: &str) -> Result<()> {
        self.delete(&format!("load_balancers/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_uses_in_field_name() {
        let listener = Listener {
            protocol: "http".to_string(),
            in_port: 80,
            out: 8080,
            timeout: None,
            proxy_protocol: None,
        };
        assert_eq!(
            serde_json::to_value(&listener).unwrap(),
            serde_json::json!({ "protocol": "http", "in": 80, "out": 8080 })
        );
    }
}
