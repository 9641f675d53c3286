//! `brightbox_firewall_rule`

use crate::error::ApiResultExt;
use crate::resources::non_empty;
use crate::session::Session;
use async_trait::async_trait;
use brightbox_api::{FirewallRule, FirewallRuleOptions};
use brightbox_cloud::{CloudError, Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_firewall_rule";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FirewallRuleAttributes {
    /// Owning policy id, required and fixed after create
    pub firewall_policy: String,
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

/// Rule request carrying every configured field
///
/// The API replaces a rule's match fields as a whole, so updates resend them
/// all. A field removed since the prior state is sent as an empty string.
pub fn encode(diff: Diff<'_, FirewallRuleAttributes>) -> FirewallRuleOptions {
    let planned = diff.planned();
    let prior = diff.prior();

    FirewallRuleOptions {
        firewall_policy: diff.is_create().then(|| planned.firewall_policy.clone()),
        protocol: resend(&planned.protocol, prior.map(|p| &p.protocol)),
        source: resend(&planned.source, prior.map(|p| &p.source)),
        source_port: resend(&planned.source_port, prior.map(|p| &p.source_port)),
        destination: resend(&planned.destination, prior.map(|p| &p.destination)),
        destination_port: resend(&planned.destination_port, prior.map(|p| &p.destination_port)),
        icmp_type_name: resend(&planned.icmp_type_name, prior.map(|p| &p.icmp_type_name)),
        description: resend(&planned.description, prior.map(|p| &p.description)),
    }
}

fn resend(planned: &Option<String>, prior: Option<&Option<String>>) -> Option<String> {
    match (planned, prior) {
        (Some(value), _) => Some(value.clone()),
        (None, Some(Some(_))) => Some(String::new()),
        (None, _) => None,
    }
}

pub fn decode(rule: &FirewallRule) -> FirewallRuleAttributes {
    let field = |v: &Option<String>| v.as_deref().and_then(non_empty);
    FirewallRuleAttributes {
        firewall_policy: rule.firewall_policy.id.clone(),
        protocol: field(&rule.protocol),
        source: field(&rule.source),
        source_port: field(&rule.source_port),
        destination: field(&rule.destination),
        destination_port: field(&rule.destination_port),
        icmp_type_name: field(&rule.icmp_type_name),
        description: field(&rule.description),
    }
}

fn observe(rule: &FirewallRule) -> Observed<FirewallRuleAttributes> {
    Observed::new(rule.id.clone(), decode(rule))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallRuleResource;

#[async_trait]
impl Resource<Session> for FirewallRuleResource {
    type Attributes = FirewallRuleAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate(&self, planned: &FirewallRuleAttributes) -> Result<()> {
        if planned.firewall_policy.is_empty() {
            return Err(CloudError::Validation(
                "firewall_policy is required".to_string(),
            ));
        }
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if !set(&planned.source) && !set(&planned.destination) {
            return Err(CloudError::Validation(
                "a firewall rule must specify a source or a destination".to_string(),
            ));
        }
        Ok(())
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &FirewallRuleAttributes,
        _timeout: Duration,
    ) -> Result<Observed<FirewallRuleAttributes>> {
        let options = encode(Diff::create(planned));
        tracing::debug!("Firewall rule create configuration: {:?}", options);
        let rule = ctx
            .client()
            .create_firewall_rule(&options)
            .await
            .context("Error creating firewall rule")?;
        Ok(observe(&rule))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &FirewallRuleAttributes,
    ) -> Result<Option<Observed<FirewallRuleAttributes>>> {
        let rule = ctx
            .client()
            .firewall_rule(id)
            .await
            .found("Error retrieving firewall rule details")?;
        Ok(rule.as_ref().map(observe))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &FirewallRuleAttributes,
        planned: &FirewallRuleAttributes,
        _timeout: Duration,
    ) -> Result<Observed<FirewallRuleAttributes>> {
        let diff = Diff::update(prior, planned);
        if diff.has_change(|a| &a.firewall_policy) {
            return Err(CloudError::Validation(format!(
                "firewall_policy of rule {} cannot be changed in place",
                id
            )));
        }

        let options = encode(diff);
        tracing::debug!("Firewall rule update configuration: {:?}", options);
        let rule = ctx
            .client()
            .update_firewall_rule(id, &options)
            .await
            .context("Error updating firewall rule")?;
        Ok(observe(&rule))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &FirewallRuleAttributes,
        _timeout: Duration,
    ) -> Result<()> {
        if ctx
            .client()
            .destroy_firewall_rule(id)
            .await
            .found("Error deleting firewall rule")?
            .is_none()
        {
            tracing::warn!("Firewall rule {} already gone", id);
        }
        Ok(())
    }
}
