//! Server group endpoints

use crate::client::Client;
use crate::error::Result;
use crate::types::ResourceRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub default: bool,
    pub fqdn: String,
    pub servers: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerGroupOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Client {
    pub async fn server_group(&self, id: &str) -> Result<ServerGroup> {
        self.get(&format!("server_groups/{}", id)).await
    }

    pub async fn create_server_group(&self, options: &ServerGroupOptions) -> Result<ServerGroup> {
        self.post("server_groups", options).await
    }

    pub async fn update_server_group(
        &self,
        id: &str,
        options: &ServerGroupOptions,
    ) -> Result<ServerGroup> {
        self.put(&format!("server_groups/{}", id), options).await
    }

    pub async fn destroy_server_group(&self, id: &str) -> Result<()> {
        self.delete(&format!("server_groups/{}", id)).await
    }
}
