//! Authenticated provider session
//!
//! Built once per plugin invocation and shared read-only by every resource
//! operation.

use crate::config::ProviderConfig;
use brightbox_api::{ApiError, Client};
use brightbox_cloud::{CloudError, PollConfig, Result, StateWaiter};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    orbit_url: String,
    poll: PollConfig,
}

impl Session {
    /// Validate the configuration and exchange the credentials for a token
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        let http = Client::http_client().map_err(|e| CloudError::api("Error building HTTP client", e))?;

        tracing::info!(
            "Authenticating {} against {}",
            credentials.client_id,
            credentials.api_url
        );

        let client = Client::authenticate(
            http,
            &credentials.api_url,
            &credentials.client_id,
            &credentials.client_secret,
            &credentials.grant(),
            credentials.account.clone(),
        )
        .await
        .map_err(|e| match e {
            ApiError::Authentication(message) => CloudError::AuthenticationFailed(message),
            other => CloudError::api("Error authenticating", other),
        })?;

        Ok(Self::new(client, credentials.orbit_url))
    }

    /// Session over an already authenticated client
    pub fn new(client: Client, orbit_url: impl Into<String>) -> Self {
        Self {
            client,
            orbit_url: orbit_url.into(),
            poll: PollConfig::default(),
        }
    }

    /// Override the poll intervals used while waiting on remote state
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn orbit_url(&self) -> &str {
        &self.orbit_url
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    pub(crate) fn waiter(&self, pending: &[&str], target: &[&str], timeout: Duration) -> StateWaiter {
        StateWaiter::new(pending, target).with_config(self.poll.with_timeout(timeout))
    }
}
