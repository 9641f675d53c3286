//! `brightbox_load_balancer`

use crate::error::ApiResultExt;
use crate::resources::{cleared, non_empty};
use crate::session::Session;
use async_trait::async_trait;
use brightbox_api::{Client, Healthcheck, Listener, LoadBalancer, LoadBalancerOptions, NodeRef};
use brightbox_cloud::{CloudError, Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_load_balancer";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadBalancerAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Balancing policy: least-connections, round-robin or source-address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
    pub listener: Vec<Listener>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    /// Backend server ids
    pub nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_pem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_private_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    pub cloud_ips: Vec<String>,
}

/// An unset optional field in the plan accepts whatever the API chose
fn covers<T: PartialEq>(planned: &Option<T>, actual: &Option<T>) -> bool {
    planned.is_none() || planned == actual
}

fn listener_matches(planned: &Listener, actual: &Listener) -> bool {
    planned.protocol == actual.protocol
        && planned.in_port == actual.in_port
        && planned.out == actual.out
        && covers(&planned.timeout, &actual.timeout)
        && covers(&planned.proxy_protocol, &actual.proxy_protocol)
}

fn healthcheck_matches(planned: &Healthcheck, actual: &Healthcheck) -> bool {
    planned.kind == actual.kind
        && planned.port == actual.port
        && covers(&planned.request, &actual.request)
        && covers(&planned.interval, &actual.interval)
        && covers(&planned.timeout, &actual.timeout)
        && covers(&planned.threshold_up, &actual.threshold_up)
        && covers(&planned.threshold_down, &actual.threshold_down)
}

fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}

pub fn encode(diff: Diff<'_, LoadBalancerAttributes>) -> LoadBalancerOptions {
    let planned = diff.planned();

    let (listeners_changed, healthcheck_changed, nodes_changed) = match diff.prior() {
        Some(prior) => (
            planned.listener.len() != prior.listener.len()
                || !planned
                    .listener
                    .iter()
                    .zip(&prior.listener)
                    .all(|(p, a)| listener_matches(p, a)),
            match (&planned.healthcheck, &prior.healthcheck) {
                (Some(p), Some(a)) => !healthcheck_matches(p, a),
                (Some(_), None) => true,
                (None, _) => false,
            },
            sorted(&planned.nodes) != sorted(&prior.nodes),
        ),
        None => (
            !planned.listener.is_empty(),
            planned.healthcheck.is_some(),
            !planned.nodes.is_empty(),
        ),
    };

    let certificate_changed = diff.has_change(|a| &a.certificate_pem)
        || diff.has_change(|a| &a.certificate_private_key);

    LoadBalancerOptions {
        name: cleared(diff.changed(|a| &a.name)),
        policy: diff.changed(|a| &a.policy).flatten(),
        buffer_size: diff.changed(|a| &a.buffer_size).flatten(),
        listeners: listeners_changed.then(|| planned.listener.clone()),
        healthcheck: if healthcheck_changed {
            planned.healthcheck.clone()
        } else {
            None
        },
        nodes: nodes_changed.then(|| {
            sorted(&planned.nodes)
                .into_iter()
                .map(|node| NodeRef { node })
                .collect()
        }),
        certificate_pem: certificate_changed
            .then(|| planned.certificate_pem.clone().unwrap_or_default()),
        certificate_private_key: certificate_changed
            .then(|| planned.certificate_private_key.clone().unwrap_or_default()),
    }
}

/// Project an API load balancer onto attributes
///
/// The API never returns certificate material, so it is carried over from
/// `config`.
pub fn decode(lb: &LoadBalancer, config: &LoadBalancerAttributes) -> LoadBalancerAttributes {
    LoadBalancerAttributes {
        name: lb.name.as_deref().and_then(non_empty),
        policy: non_empty(&lb.policy),
        buffer_size: lb.buffer_size,
        listener: lb.listeners.clone(),
        healthcheck: (!lb.healthcheck.kind.is_empty()).then(|| lb.healthcheck.clone()),
        nodes: sorted(&lb.nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>()),
        certificate_pem: config.certificate_pem.clone(),
        certificate_private_key: config.certificate_private_key.clone(),
        status: non_empty(&lb.status),
        locked: Some(lb.locked),
        cloud_ips: lb.cloud_ips.iter().map(|c| c.id.clone()).collect(),
    }
}

async fn refresh(client: &Client, id: &str) -> Result<(LoadBalancer, String)> {
    let lb = client
        .load_balancer(id)
        .await
        .context("Error retrieving load balancer details")?;
    let status = lb.status.clone();
    Ok((lb, status))
}

async fn refresh_status(client: &Client, id: &str) -> Result<((), String)> {
    let status = match client
        .load_balancer(id)
        .await
        .found("Error retrieving load balancer details")?
    {
        Some(lb) => lb.status,
        None => "deleted".to_string(),
    };
    Ok(((), status))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancerResource;

#[async_trait]
impl Resource<Session> for LoadBalancerResource {
    type Attributes = LoadBalancerAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate(&self, planned: &LoadBalancerAttributes) -> Result<()> {
        if planned.listener.is_empty() {
            return Err(CloudError::Validation(
                "listener requires at least one listener".to_string(),
            ));
        }
        if planned.healthcheck.is_none() {
            return Err(CloudError::Validation("healthcheck is required".to_string()));
        }
        if planned.certificate_pem.is_some() != planned.certificate_private_key.is_some() {
            return Err(CloudError::Validation(
                "certificate_pem and certificate_private_key must be set together".to_string(),
            ));
        }
        Ok(())
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &LoadBalancerAttributes,
        timeout: Duration,
    ) -> Result<Observed<LoadBalancerAttributes>> {
        let options = encode(Diff::create(planned));
        tracing::debug!(
            "Load balancer create configuration: name={:?} listeners={:?} nodes={:?}",
            options.name,
            options.listeners,
            options.nodes
        );

        let client = ctx.client();
        let created = client
            .create_load_balancer(&options)
            .await
            .context("Error creating load balancer")?;

        tracing::info!("Waiting for load balancer ({}) to become active", created.id);
        let lb = ctx
            .waiter(&["creating"], &["active"], timeout)
            .wait_for_state(|| refresh(client, &created.id))
            .await
            .map_err(|e| e.tainted(&created.id))?;

        Ok(Observed::new(lb.id.clone(), decode(&lb, planned)))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        prior: &LoadBalancerAttributes,
    ) -> Result<Option<Observed<LoadBalancerAttributes>>> {
        let Some(lb) = ctx
            .client()
            .load_balancer(id)
            .await
            .found("Error retrieving load balancer details")?
        else {
            return Ok(None);
        };
        if lb.status == "deleted" {
            return Ok(None);
        }
        Ok(Some(Observed::new(lb.id.clone(), decode(&lb, prior))))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &LoadBalancerAttributes,
        planned: &LoadBalancerAttributes,
        _timeout: Duration,
    ) -> Result<Observed<LoadBalancerAttributes>> {
        let options = encode(Diff::update(prior, planned));

        let lb = if options == LoadBalancerOptions::default() {
            ctx.client()
                .load_balancer(id)
                .await
                .context("Error retrieving load balancer details")?
        } else {
            tracing::debug!(
                "Load balancer update configuration: name={:?} listeners={:?} nodes={:?}",
                options.name,
                options.listeners,
                options.nodes
            );
            ctx.client()
                .update_load_balancer(id, &options)
                .await
                .context("Error updating load balancer")?
        };

        Ok(Observed::new(lb.id.clone(), decode(&lb, planned)))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &LoadBalancerAttributes,
        timeout: Duration,
    ) -> Result<()> {
        let client = ctx.client();
        if client
            .destroy_load_balancer(id)
            .await
            .found("Error deleting load balancer")?
            .is_none()
        {
            tracing::warn!("Load balancer {} already gone", id);
            return Ok(());
        }

        tracing::info!("Waiting for load balancer ({}) to be deleted", id);
        ctx.waiter(&["deleting", "active"], &["deleted"], timeout)
            .wait_for_state(|| refresh_status(client, id))
            .await
    }
}
