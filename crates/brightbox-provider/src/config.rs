//! Provider configuration
//!
//! Attributes come from the host request. Any attribute left unset or empty
//! falls back to its environment variable, then to a built-in default.

use brightbox_api::{DEFAULT_API_URL, DEFAULT_ORBIT_URL, Grant};
use brightbox_cloud::{CloudError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// OAuth application registered for this provider
pub const DEFAULT_CLIENT_ID: &str = "app-dkmch";
pub const DEFAULT_CLIENT_SECRET: &str = "uogoelzgt0nwawb";

/// Client ids with this prefix identify an OAuth application
pub const APP_PREFIX: &str = "app-";

pub const ENV_CLIENT: &str = "BRIGHTBOX_CLIENT";
pub const ENV_CLIENT_SECRET: &str = "BRIGHTBOX_CLIENT_SECRET";
pub const ENV_USER_NAME: &str = "BRIGHTBOX_USER_NAME";
pub const ENV_PASSWORD: &str = "BRIGHTBOX_PASSWORD";
pub const ENV_ACCOUNT: &str = "BRIGHTBOX_ACCOUNT";
pub const ENV_API_URL: &str = "BRIGHTBOX_API_URL";
pub const ENV_ORBIT_URL: &str = "BRIGHTBOX_ORBIT_URL";

/// Provider block as sent by the host runtime
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// API client id or OAuth application id
    pub apiclient: Option<String>,
    pub apisecret: Option<String>,
    pub username: Option<String>,
    /// Password or one time authentication code
    pub password: Option<String>,
    pub account: Option<String>,
    pub apiurl: Option<String>,
    pub orbit_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderConfig")
            .field("apiclient", &self.apiclient)
            .field("apisecret", &redacted(&self.apisecret))
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("account", &self.account)
            .field("apiurl", &self.apiurl)
            .field("orbit_url", &self.orbit_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Fill unset attributes from the environment and the built-in defaults
    pub fn with_env_defaults(mut self) -> Self {
        fill(&mut self.apiclient, ENV_CLIENT, Some(DEFAULT_CLIENT_ID));
        fill(&mut self.apisecret, ENV_CLIENT_SECRET, Some(DEFAULT_CLIENT_SECRET));
        fill(&mut self.username, ENV_USER_NAME, None);
        fill(&mut self.password, ENV_PASSWORD, None);
        fill(&mut self.account, ENV_ACCOUNT, None);
        fill(&mut self.apiurl, ENV_API_URL, Some(DEFAULT_API_URL));
        fill(&mut self.orbit_url, ENV_ORBIT_URL, Some(DEFAULT_ORBIT_URL));
        self
    }

    /// Check the credential mode and resolve everything a session needs
    ///
    /// No remote call is made here.
    pub fn credentials(&self) -> Result<Credentials> {
        let client_id = required(&self.apiclient, "apiclient")?;
        let client_secret = required(&self.apisecret, "apisecret")?;
        let username = present(&self.username);
        let password = present(&self.password);
        let account = present(&self.account);

        let mode = if client_id.starts_with(APP_PREFIX) {
            tracing::debug!("Detected OAuth application, validating user details");
            let (Some(username), Some(password)) = (username, password) else {
                return Err(CloudError::InvalidConfig(
                    "user credentials are missing, please supply a username and password"
                        .to_string(),
                ));
            };
            if account.is_none() {
                return Err(CloudError::InvalidConfig(
                    "account must be specified with user credentials".to_string(),
                ));
            }
            CredentialMode::User {
                username: username.to_string(),
                password: SecretString::from(password.to_string()),
            }
        } else {
            tracing::debug!("Detected API client");
            if username.is_some() || password.is_some() {
                return Err(CloudError::InvalidConfig(
                    "user credentials should be blank with an API client".to_string(),
                ));
            }
            CredentialMode::ApiClient
        };

        let api_url = url(&self.apiurl, DEFAULT_API_URL, "apiurl")?;
        let orbit_url = url(&self.orbit_url, DEFAULT_ORBIT_URL, "orbit_url")?;

        Ok(Credentials {
            client_id: client_id.to_string(),
            client_secret: SecretString::from(client_secret.to_string()),
            mode,
            account: account.map(str::to_string),
            api_url,
            orbit_url,
        })
    }
}

/// Validated credentials and endpoints
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub mode: CredentialMode,
    pub account: Option<String>,
    pub api_url: String,
    pub orbit_url: String,
}

#[derive(Debug, Clone)]
pub enum CredentialMode {
    /// API client id and secret only
    ApiClient,
    /// User acting through an OAuth application
    User {
        username: String,
        password: SecretString,
    },
}

impl Credentials {
    pub fn grant(&self) -> Grant {
        match &self.mode {
            CredentialMode::ApiClient => Grant::ClientCredentials,
            CredentialMode::User { username, password } => Grant::Password {
                username: username.clone(),
                password: password.clone(),
            },
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.mode, CredentialMode::User { .. })
    }
}

fn fill(slot: &mut Option<String>, var: &str, default: Option<&str>) {
    if present(slot).is_some() {
        return;
    }
    *slot = std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| default.map(str::to_string));
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| CloudError::InvalidConfig(format!("{} must not be empty", name)))
}

fn url(value: &Option<String>, default: &str, name: &str) -> Result<String> {
    let raw = present(value).unwrap_or(default);
    let parsed = reqwest::Url::parse(raw)
        .map_err(|e| CloudError::InvalidConfig(format!("{} '{}' is not a valid URL: {}", name, raw, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(raw.to_string()),
        _ => Err(CloudError::InvalidConfig(format!(
            "{} '{}' must be an absolute http(s) URL",
            name, raw
        ))),
    }
}
