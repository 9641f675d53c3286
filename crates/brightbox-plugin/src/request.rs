//! JSON documents exchanged with the host runtime

use brightbox_cloud::{CloudError, ResourceInstance, ResourceRequest};
use brightbox_provider::ProviderConfig;
use serde::{Deserialize, Serialize};

/// One request, read from stdin
#[derive(Debug, Deserialize)]
pub struct PluginRequest {
    /// Provider block; unset attributes fall back to the environment
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(flatten)]
    pub resource: ResourceRequest,
}

/// Response written to stdout
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResourceResponse {
    Instance(ResourceInstance),
    Error {
        /// Set when the resource exists remotely despite the failure
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        error: String,
    },
}

impl ResourceResponse {
    /// Error response carrying the whole cause chain
    pub fn error(err: &anyhow::Error) -> Self {
        let id = err
            .downcast_ref::<CloudError>()
            .and_then(CloudError::tainted_id)
            .map(str::to_string);
        ResourceResponse::Error {
            id,
            error: format!("{:#}", err),
        }
    }
}
