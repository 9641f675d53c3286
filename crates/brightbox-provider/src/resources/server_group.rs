//! `brightbox_server_group`

use crate::error::ApiResultExt;
use crate::resources::{cleared, non_empty};
use crate::session::Session;
use async_trait::async_trait;
use brightbox_api::{ServerGroup, ServerGroupOptions};
use brightbox_cloud::{Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_server_group";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerGroupAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

pub fn encode(diff: Diff<'_, ServerGroupAttributes>) -> ServerGroupOptions {
    ServerGroupOptions {
        name: cleared(diff.changed(|a| &a.name)),
        description: cleared(diff.changed(|a| &a.description)),
    }
}

pub fn decode(group: &ServerGroup) -> ServerGroupAttributes {
    ServerGroupAttributes {
        name: non_empty(&group.name),
        description: group.description.as_deref().and_then(non_empty),
        fqdn: non_empty(&group.fqdn),
    }
}

fn observe(group: &ServerGroup) -> Observed<ServerGroupAttributes> {
    Observed::new(group.id.clone(), decode(group))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServerGroupResource;

#[async_trait]
impl Resource<Session> for ServerGroupResource {
    type Attributes = ServerGroupAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &ServerGroupAttributes,
        _timeout: Duration,
    ) -> Result<Observed<ServerGroupAttributes>> {
        let options = encode(Diff::create(planned));
        tracing::debug!("Server group create configuration: {:?}", options);
        let group = ctx
            .client()
            .create_server_group(&options)
            .await
            .context("Error creating server group")?;
        Ok(observe(&group))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &ServerGroupAttributes,
    ) -> Result<Option<Observed<ServerGroupAttributes>>> {
        let group = ctx
            .client()
            .server_group(id)
            .await
            .found("Error retrieving server group details")?;
        Ok(group.as_ref().map(observe))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &ServerGroupAttributes,
        planned: &ServerGroupAttributes,
        _timeout: Duration,
    ) -> Result<Observed<ServerGroupAttributes>> {
        let options = encode(Diff::update(prior, planned));
        tracing::debug!("Server group update configuration: {:?}", options);
        let group = ctx
            .client()
            .update_server_group(id, &options)
            .await
            .context("Error updating server group")?;
        Ok(observe(&group))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &ServerGroupAttributes,
        _timeout: Duration,
    ) -> Result<()> {
        if ctx
            .client()
            .destroy_server_group(id)
            .await
            .found("Error deleting server group")?
            .is_none()
        {
            tracing::warn!("Server group {} already gone", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_clears_removed_description() {
        let prior = ServerGroupAttributes {
            name: Some("web".to_string()),
            description: Some("frontends".to_string()),
            fqdn: Some("grp-12345.gb1.brightbox.com".to_string()),
        };
        let planned = ServerGroupAttributes {
            name: Some("web".to_string()),
            ..Default::default()
        };
        let options = encode(Diff::update(&prior, &planned));
        assert_eq!(options.name, None);
        assert_eq!(options.description.as_deref(), Some(""));
    }
}
