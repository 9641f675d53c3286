//! `brightbox_firewall_policy`
//!
//! A policy is applied to at most one server group. Moving it between groups
//! removes it from the old group before applying it to the new one.

use crate::error::ApiResultExt;
use crate::resources::{cleared, non_empty};
use crate::session::Session;
use async_trait::async_trait;
use brightbox_api::{FirewallPolicy, FirewallPolicyOptions};
use brightbox_cloud::{Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_firewall_policy";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FirewallPolicyAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server group the policy is applied to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_group: Option<String>,
}

pub fn encode(diff: Diff<'_, FirewallPolicyAttributes>) -> FirewallPolicyOptions {
    FirewallPolicyOptions {
        name: cleared(diff.changed(|a| &a.name)),
        description: cleared(diff.changed(|a| &a.description)),
    }
}

pub fn decode(policy: &FirewallPolicy) -> FirewallPolicyAttributes {
    FirewallPolicyAttributes {
        name: policy.name.as_deref().and_then(non_empty),
        description: policy.description.as_deref().and_then(non_empty),
        server_group: policy
            .server_group
            .as_ref()
            .and_then(|g| non_empty(&g.id)),
    }
}

fn observe(policy: &FirewallPolicy) -> Observed<FirewallPolicyAttributes> {
    Observed::new(policy.id.clone(), decode(policy))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallPolicyResource;

#[async_trait]
impl Resource<Session> for FirewallPolicyResource {
    type Attributes = FirewallPolicyAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &FirewallPolicyAttributes,
        _timeout: Duration,
    ) -> Result<Observed<FirewallPolicyAttributes>> {
        let client = ctx.client();
        let options = encode(Diff::create(planned));
        tracing::debug!("Firewall policy create configuration: {:?}", options);

        let mut policy = client
            .create_firewall_policy(&options)
            .await
            .context("Error creating firewall policy")?;

        if let Some(group) = planned.server_group.as_deref().filter(|g| !g.is_empty()) {
            tracing::info!("Applying firewall policy {} to {}", policy.id, group);
            let id = policy.id.clone();
            policy = client
                .apply_firewall_policy(&id, group)
                .await
                .context("Error applying firewall policy")
                .map_err(|e| e.tainted(id.as_str()))?;
        }

        Ok(observe(&policy))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &FirewallPolicyAttributes,
    ) -> Result<Option<Observed<FirewallPolicyAttributes>>> {
        let policy = ctx
            .client()
            .firewall_policy(id)
            .await
            .found("Error retrieving firewall policy details")?;
        Ok(policy.as_ref().map(observe))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &FirewallPolicyAttributes,
        planned: &FirewallPolicyAttributes,
        _timeout: Duration,
    ) -> Result<Observed<FirewallPolicyAttributes>> {
        let client = ctx.client();
        let diff = Diff::update(prior, planned);

        let options = encode(diff);
        let mut policy = if options != FirewallPolicyOptions::default() {
            tracing::debug!("Firewall policy update configuration: {:?}", options);
            client
                .update_firewall_policy(id, &options)
                .await
                .context("Error updating firewall policy")?
        } else {
            client
                .firewall_policy(id)
                .await
                .context("Error retrieving firewall policy details")?
        };

        if diff.has_change(|a| &a.server_group) {
            if let Some(old) = prior.server_group.as_deref().filter(|g| !g.is_empty()) {
                tracing::info!("Removing firewall policy {} from {}", id, old);
                policy = client
                    .remove_firewall_policy(id, old)
                    .await
                    .context("Error removing firewall policy")?;
            }
            if let Some(new) = planned.server_group.as_deref().filter(|g| !g.is_empty()) {
                tracing::info!("Applying firewall policy {} to {}", id, new);
                policy = client
                    .apply_firewall_policy(id, new)
                    .await
                    .context("Error applying firewall policy")?;
            }
        }

        Ok(observe(&policy))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &FirewallPolicyAttributes,
        _timeout: Duration,
    ) -> Result<()> {
        if ctx
            .client()
            .destroy_firewall_policy(id)
            .await
            .found("Error deleting firewall policy")?
            .is_none()
        {
            tracing::warn!("Firewall policy {} already gone", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brightbox_api::ResourceRef;

    #[test]
    fn test_decode_reads_applied_group() {
        let policy = FirewallPolicy {
            id: "fwp-12345".to_string(),
            name: Some("web".to_string()),
            server_group: Some(ResourceRef::new("grp-12345")),
            ..Default::default()
        };
        let attrs = decode(&policy);
        assert_eq!(attrs.server_group.as_deref(), Some("grp-12345"));
        assert_eq!(attrs.description, None);
    }
}
