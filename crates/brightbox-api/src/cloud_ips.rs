//! Cloud IP endpoints
//!
//! A cloud IP is a public address that can be mapped to a server interface,
//! a load balancer or a server group.

use crate::client::Client;
use crate::error::Result;
use crate::types::ResourceRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudIp {
    pub id: String,
    pub name: Option<String>,
    pub public_ip: String,
    /// mapped, unmapped
    pub status: String,
    pub reverse_dns: Option<String>,
    pub fqdn: String,
    pub interface: Option<ResourceRef>,
    pub server: Option<ResourceRef>,
    pub load_balancer: Option<ResourceRef>,
    pub server_group: Option<ResourceRef>,
}

impl CloudIp {
    pub fn is_mapped(&self) -> bool {
        self.status == "mapped"
    }

    /// Id of whatever the address is mapped to
    ///
    /// Server mappings are reported through the interface.
    pub fn target(&self) -> Option<&str> {
        self.interface
            .as_ref()
            .or(self.load_balancer.as_ref())
            .or(self.server_group.as_ref())
            .map(|r| r.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloudIpOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,
}

#[derive(Debug, Serialize)]
struct MapRequest<'a> {
    destination: &'a str,
}

impl Client {
    pub async fn cloud_ip(&self, id: &str) -> Result<CloudIp> {
        self.get(&format!("cloud_ips/{}", id)).await
    }

    pub async fn create_cloud_ip(&self, options: &CloudIpOptions) -> Result<CloudIp> {
        self.post("cloud_ips", options).await
    }

    pub async fn update_cloud_ip(&self, id: &str, options: &CloudIpOptions) -> Result<CloudIp> {
        self.put(&format!("cloud_ips/{}", id), options).await
    }

    pub async fn destroy_cloud_ip(&self, id: &str) -> Result<()> {
        self.delete(&format!("cloud_ips/{}", id)).await
    }

    /// Map the address to an interface, load balancer or server group
    pub async fn map_cloud_ip(&self, id: &str, destination: &str) -> Result<CloudIp> {
        self.post(
            &format!("cloud_ips/{}/map", id),
            &MapRequest { destination },
        )
        .await
    }

    pub async fn unmap_cloud_ip(&self, id: &str) -> Result<CloudIp> {
        self.post(&format!("cloud_ips/{}/unmap", id), &serde_json::json!({}))
            .await
    }
}
