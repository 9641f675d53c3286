//! Server endpoints
//!
//! `GET/POST /1.0/servers`, `GET/PUT/DELETE /1.0/servers/{id}`

use crate::client::Client;
use crate::cloud_ips::CloudIp;
use crate::error::Result;
use crate::types::{ImageRef, ResourceRef, ServerTypeRef, ZoneRef};
use serde::{Deserialize, Serialize};

/// Server as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// creating, active, inactive, deleting, deleted, failed
    pub status: String,
    pub locked: bool,
    pub hostname: String,
    pub fqdn: String,
    /// Base64 encoded user data
    pub user_data: Option<String>,
    pub image: ImageRef,
    pub server_type: ServerTypeRef,
    pub zone: ZoneRef,
    pub interfaces: Vec<Interface>,
    pub cloud_ips: Vec<CloudIp>,
    pub server_groups: Vec<ResourceRef>,
}

/// Network interface attached to a server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    pub id: String,
    pub mac_address: String,
    pub ipv4_address: String,
    pub ipv6_address: Option<String>,
}

/// Fields accepted on create and update; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_groups: Option<Vec<String>>,
}

impl Client {
    pub async fn server(&self, id: &str) -> Result<Server> {
        self.get(&format!("servers/{}", id)).await
    }

    pub async fn create_server(&self, options: &ServerOptions) -> Result<Server> {
        self.post("servers", options).await
    }

    pub async fn update_server(&self, id: &str, options: &ServerOptions) -> Result<Server> {
        self.put(&format!("servers/{}", id), options).await
    }

    pub async fn destroy_server(&self, id: &str) -> Result<()> {
        self.delete(&format!("servers/{}", id)).await
    }
}
