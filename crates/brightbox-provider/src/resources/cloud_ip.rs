//! `brightbox_cloudip`
//!
//! A cloud IP is allocated, then mapped to its target. Mapping completes
//! asynchronously, so every map and unmap waits for the status to settle.

use crate::error::ApiResultExt;
use crate::resources::{cleared, non_empty};
use crate::session::Session;
use async_trait::async_trait;
use brightbox_api::{Client, CloudIp, CloudIpOptions};
use brightbox_cloud::{CloudError, Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_cloudip";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudIpAttributes {
    /// Interface, load balancer or server group id to map to
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

pub fn decode(cip: &CloudIp) -> CloudIpAttributes {
    CloudIpAttributes {
        target: cip.target().unwrap_or_default().to_string(),
        name: cip.name.as_deref().and_then(non_empty),
        reverse_dns: cip.reverse_dns.as_deref().and_then(non_empty),
        public_ip: non_empty(&cip.public_ip),
        status: non_empty(&cip.status),
        fqdn: non_empty(&cip.fqdn),
    }
}

async fn refresh(client: &Client, id: &str) -> Result<(CloudIp, String)> {
    let cip = client
        .cloud_ip(id)
        .await
        .context("Error retrieving cloud IP details")?;
    let status = cip.status.clone();
    Ok((cip, status))
}

async fn map(ctx: &Session, id: &str, target: &str, timeout: Duration) -> Result<CloudIp> {
    let client = ctx.client();
    tracing::info!("Mapping cloud IP {} to {}", id, target);
    client
        .map_cloud_ip(id, target)
        .await
        .context("Error mapping cloud IP")?;
    ctx.waiter(&["unmapped"], &["mapped"], timeout)
        .wait_for_state(|| refresh(client, id))
        .await
}

async fn unmap(ctx: &Session, id: &str, timeout: Duration) -> Result<CloudIp> {
    let client = ctx.client();
    tracing::info!("Unmapping cloud IP {}", id);
    client
        .unmap_cloud_ip(id)
        .await
        .context("Error unmapping cloud IP")?;
    ctx.waiter(&["mapped"], &["unmapped"], timeout)
        .wait_for_state(|| refresh(client, id))
        .await
}

fn observe(cip: &CloudIp) -> Observed<CloudIpAttributes> {
    Observed::new(cip.id.clone(), decode(cip))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CloudIpResource;

#[async_trait]
impl Resource<Session> for CloudIpResource {
    type Attributes = CloudIpAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate(&self, planned: &CloudIpAttributes) -> Result<()> {
        if planned.target.is_empty() {
            return Err(CloudError::Validation("target is required".to_string()));
        }
        Ok(())
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &CloudIpAttributes,
        timeout: Duration,
    ) -> Result<Observed<CloudIpAttributes>> {
        let options = CloudIpOptions {
            name: planned.name.clone(),
            reverse_dns: planned.reverse_dns.clone(),
        };
        tracing::debug!("Cloud IP create configuration: {:?}", options);

        let created = ctx
            .client()
            .create_cloud_ip(&options)
            .await
            .context("Error creating cloud IP")?;

        let cip = map(ctx, &created.id, &planned.target, timeout)
            .await
            .map_err(|e| e.tainted(&created.id))?;
        Ok(observe(&cip))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &CloudIpAttributes,
    ) -> Result<Option<Observed<CloudIpAttributes>>> {
        let cip = ctx
            .client()
            .cloud_ip(id)
            .await
            .found("Error retrieving cloud IP details")?;
        Ok(cip.as_ref().map(observe))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &CloudIpAttributes,
        planned: &CloudIpAttributes,
        timeout: Duration,
    ) -> Result<Observed<CloudIpAttributes>> {
        let client = ctx.client();
        let diff = Diff::update(prior, planned);
        let mut latest = None;

        if diff.has_change(|a| &a.target) {
            let current = client
                .cloud_ip(id)
                .await
                .context("Error retrieving cloud IP details")?;
            if current.is_mapped() {
                unmap(ctx, id, timeout).await?;
            }
            latest = Some(map(ctx, id, &planned.target, timeout).await?);
        }

        let options = CloudIpOptions {
            name: cleared(diff.changed(|a| &a.name)),
            reverse_dns: cleared(diff.changed(|a| &a.reverse_dns)),
        };
        if options != CloudIpOptions::default() {
            tracing::debug!("Cloud IP update configuration: {:?}", options);
            latest = Some(
                client
                    .update_cloud_ip(id, &options)
                    .await
                    .context("Error updating cloud IP")?,
            );
        }

        let cip = match latest {
            Some(cip) => cip,
            None => client
                .cloud_ip(id)
                .await
                .context("Error retrieving cloud IP details")?,
        };
        Ok(observe(&cip))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &CloudIpAttributes,
        timeout: Duration,
    ) -> Result<()> {
        let client = ctx.client();
        let Some(current) = client
            .cloud_ip(id)
            .await
            .found("Error retrieving cloud IP details")?
        else {
            tracing::warn!("Cloud IP {} already gone", id);
            return Ok(());
        };

        if current.is_mapped() {
            unmap(ctx, id, timeout).await?;
        }

        client
            .destroy_cloud_ip(id)
            .await
            .found("Error deleting cloud IP")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brightbox_api::ResourceRef;

    #[test]
    fn test_decode_reports_mapping_target() {
        let cip = CloudIp {
            id: "cip-12345".to_string(),
            public_ip: "109.107.35.1".to_string(),
            status: "mapped".to_string(),
            fqdn: "cip-12345.gb1.brightbox.com".to_string(),
            load_balancer: Some(ResourceRef::new("lba-12345")),
            ..Default::default()
        };
        let attrs = decode(&cip);
        assert_eq!(attrs.target, "lba-12345");
        assert_eq!(attrs.public_ip.as_deref(), Some("109.107.35.1"));
        assert_eq!(attrs.name, None);

        let unmapped = decode(&CloudIp::default());
        assert_eq!(unmapped.target, "");
    }

    #[test]
    fn test_validate_requires_target() {
        assert!(CloudIpResource.validate(&CloudIpAttributes::default()).is_err());
        let attrs = CloudIpAttributes {
            target: "int-12345".to_string(),
            ..Default::default()
        };
        assert!(CloudIpResource.validate(&attrs).is_ok());
    }
}
