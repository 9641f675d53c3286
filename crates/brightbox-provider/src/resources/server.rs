//! `brightbox_server`
//!
//! Create waits for the server to leave `creating`; delete waits for
//! `deleted`. Image, type and zone are only sent on create.

use crate::connection;
use crate::error::ApiResultExt;
use crate::resources::{cleared, non_empty};
use crate::session::Session;
use crate::userdata;
use async_trait::async_trait;
use brightbox_api::{Client, Server, ServerOptions};
use brightbox_cloud::{CloudError, ConnectionInfo, Diff, Observed, Resource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND: &str = "brightbox_server";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerAttributes {
    /// Image id, required
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server type handle (e.g. "1gb.ssd")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    /// Zone handle (e.g. "gb1-a")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Plain payload in configuration, its SHA-256 digest in state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_base64: Option<String>,
    pub server_groups: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address_private: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_hostname: Option<String>,
    /// Login user of the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ServerAttributes {
    /// SSH descriptor: public hostname, then IPv6 hostname, then fqdn
    pub fn connection(&self) -> Option<ConnectionInfo> {
        connection::ssh(
            &[
                self.public_hostname.as_deref(),
                self.ipv6_hostname.as_deref(),
                self.fqdn.as_deref(),
            ],
            self.username.as_deref(),
        )
    }

    fn sorted_groups(&self) -> Vec<String> {
        let mut groups = self.server_groups.clone();
        groups.sort();
        groups.dedup();
        groups
    }
}

/// Build the create or update request from the changed attributes
pub fn encode(diff: Diff<'_, ServerAttributes>) -> Result<ServerOptions> {
    let planned = diff.planned();

    let mut options = ServerOptions {
        name: cleared(diff.changed(|a| &a.name)),
        ..Default::default()
    };

    if diff.is_create() {
        options.image = Some(planned.image.clone());
        options.server_type = planned.server_type.clone();
        options.zone = planned.zone.clone();
    }

    let groups_changed = match diff.prior() {
        Some(prior) => prior.sorted_groups() != planned.sorted_groups(),
        None => !planned.server_groups.is_empty(),
    };
    if groups_changed {
        options.server_groups = Some(planned.sorted_groups());
    }

    if user_data_changed(diff) {
        options.user_data = userdata::encode(
            planned.user_data.as_deref(),
            planned.user_data_base64.as_deref(),
        )?;
    }

    Ok(options)
}

/// State keeps a digest for `user_data`, so compare the digest of the plan
fn user_data_changed(diff: Diff<'_, ServerAttributes>) -> bool {
    let planned = diff.planned();
    let Some(prior) = diff.prior() else {
        return planned.user_data.is_some() || planned.user_data_base64.is_some();
    };

    if planned.user_data_base64 != prior.user_data_base64 {
        return true;
    }

    match (&planned.user_data, &prior.user_data) {
        (None, None) => false,
        (Some(plain), Some(stored)) => {
            plain != stored && userdata::digest(&userdata::encode_plain(plain)) != *stored
        }
        _ => true,
    }
}

/// Project an API server onto attributes
///
/// `config` decides how user data is recorded: verbatim when it was supplied
/// as `user_data_base64`, as a digest otherwise.
pub fn decode(server: &Server, config: &ServerAttributes) -> ServerAttributes {
    let mut groups: Vec<String> = server.server_groups.iter().map(|g| g.id.clone()).collect();
    groups.sort();

    let mut attrs = ServerAttributes {
        image: server.image.id.clone(),
        name: non_empty(&server.name),
        server_type: non_empty(&server.server_type.handle),
        zone: non_empty(&server.zone.handle),
        server_groups: groups,
        status: non_empty(&server.status),
        locked: Some(server.locked),
        hostname: non_empty(&server.hostname),
        username: server.image.username.as_deref().and_then(non_empty),
        ..Default::default()
    };

    if let Some(interface) = server.interfaces.first() {
        attrs.interface = non_empty(&interface.id);
        attrs.ipv4_address_private = non_empty(&interface.ipv4_address);
        attrs.ipv6_address = interface.ipv6_address.as_deref().and_then(non_empty);
        attrs.fqdn = non_empty(&server.fqdn);
        attrs.ipv6_hostname = attrs.fqdn.as_ref().map(|fqdn| format!("ipv6.{}", fqdn));
    }

    if let Some(cloud_ip) = server.cloud_ips.first() {
        attrs.ipv4_address = non_empty(&cloud_ip.public_ip);
        attrs.public_hostname = non_empty(&cloud_ip.fqdn);
    }

    match server.user_data.as_deref().filter(|v| !v.is_empty()) {
        Some(encoded) if config.user_data_base64.is_some() => {
            tracing::debug!("Encoded user data requested, setting user_data_base64");
            attrs.user_data_base64 = Some(encoded.to_string());
        }
        Some(encoded) => {
            tracing::debug!("Decoded user data requested, setting user_data digest");
            attrs.user_data = Some(userdata::digest(encoded));
        }
        None => tracing::debug!("No user data found, skipping"),
    }

    attrs
}

fn observe(server: &Server, config: &ServerAttributes) -> Observed<ServerAttributes> {
    let attrs = decode(server, config);
    let connection = attrs.connection();
    Observed::new(server.id.clone(), attrs).with_connection(connection)
}

async fn refresh(client: &Client, id: &str) -> Result<(Server, String)> {
    let server = client
        .server(id)
        .await
        .context("Error retrieving server details")?;
    let status = server.status.clone();
    Ok((server, status))
}

/// Status only; a server the API no longer knows counts as deleted
async fn refresh_status(client: &Client, id: &str) -> Result<((), String)> {
    let status = match client
        .server(id)
        .await
        .found("Error retrieving server details")?
    {
        Some(server) => server.status,
        None => "deleted".to_string(),
    };
    Ok(((), status))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServerResource;

#[async_trait]
impl Resource<Session> for ServerResource {
    type Attributes = ServerAttributes;

    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate(&self, planned: &ServerAttributes) -> Result<()> {
        if planned.image.is_empty() {
            return Err(CloudError::Validation("image is required".to_string()));
        }
        if planned.server_groups.is_empty() {
            return Err(CloudError::Validation(
                "server_groups requires at least one server group".to_string(),
            ));
        }
        userdata::encode(
            planned.user_data.as_deref(),
            planned.user_data_base64.as_deref(),
        )?;
        Ok(())
    }

    async fn create(
        &self,
        ctx: &Session,
        planned: &ServerAttributes,
        timeout: Duration,
    ) -> Result<Observed<ServerAttributes>> {
        let options = encode(Diff::create(planned))?;
        tracing::debug!(
            "Server create configuration: image={:?} type={:?} zone={:?} groups={:?}",
            options.image,
            options.server_type,
            options.zone,
            options.server_groups
        );

        let client = ctx.client();
        let created = client
            .create_server(&options)
            .await
            .context("Error creating server")?;

        tracing::info!("Waiting for server ({}) to become available", created.id);
        let server = ctx
            .waiter(&["creating"], &["active", "inactive"], timeout)
            .wait_for_state(|| refresh(client, &created.id))
            .await
            .map_err(|e| e.tainted(&created.id))?;

        Ok(observe(&server, planned))
    }

    async fn read(
        &self,
        ctx: &Session,
        id: &str,
        prior: &ServerAttributes,
    ) -> Result<Option<Observed<ServerAttributes>>> {
        tracing::debug!("Server read called for {}", id);
        let Some(server) = ctx
            .client()
            .server(id)
            .await
            .found("Error retrieving server details")?
        else {
            return Ok(None);
        };
        if server.status == "deleted" {
            return Ok(None);
        }
        Ok(Some(observe(&server, prior)))
    }

    async fn update(
        &self,
        ctx: &Session,
        id: &str,
        prior: &ServerAttributes,
        planned: &ServerAttributes,
        _timeout: Duration,
    ) -> Result<Observed<ServerAttributes>> {
        let options = encode(Diff::update(prior, planned))?;

        let server = if options == ServerOptions::default() {
            tracing::debug!("Server {} has no updatable changes", id);
            ctx.client()
                .server(id)
                .await
                .context("Error retrieving server details")?
        } else {
            tracing::debug!(
                "Server update configuration: name={:?} groups={:?} user_data={}",
                options.name,
                options.server_groups,
                options.user_data.is_some()
            );
            ctx.client()
                .update_server(id, &options)
                .await
                .context("Error updating server")?
        };

        Ok(observe(&server, planned))
    }

    async fn delete(
        &self,
        ctx: &Session,
        id: &str,
        _prior: &ServerAttributes,
        timeout: Duration,
    ) -> Result<()> {
        let client = ctx.client();
        if client
            .destroy_server(id)
            .await
            .found("Error deleting server")?
            .is_none()
        {
            tracing::warn!("Server {} already gone", id);
            return Ok(());
        }

        tracing::info!("Waiting for server ({}) to be deleted", id);
        ctx.waiter(&["deleting", "active", "inactive"], &["deleted"], timeout)
            .wait_for_state(|| refresh_status(client, id))
            .await
    }
}
