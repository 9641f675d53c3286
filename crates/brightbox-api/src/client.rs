//! Authenticated HTTP client
//!
//! Exchanges credentials for a bearer token at the OAuth2 token endpoint and
//! issues JSON requests against the versioned API. Sessions acting for a user
//! are scoped to one account with the `account_id` query parameter.

use crate::error::{ApiError, Result};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.gb1.brightbox.com";
pub const DEFAULT_ORBIT_URL: &str = "https://orbit.brightbox.com/v1/";

const API_VERSION: &str = "1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OAuth2 grant used to obtain a token
#[derive(Debug)]
pub enum Grant {
    /// API client credentials only
    ClientCredentials,
    /// User credentials on behalf of an OAuth application
    Password {
        username: String,
        password: SecretString,
    },
}

/// Brightbox API client bound to one access token
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Arc<SecretString>,
    account: Option<String>,
}

impl Client {
    /// Build the underlying HTTP client with the provider's defaults
    pub fn http_client() -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("brightbox-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }

    /// Exchange credentials for an access token
    ///
    /// `POST {api_url}/token` with HTTP basic auth for the client id/secret.
    pub async fn authenticate(
        http: reqwest::Client,
        api_url: &str,
        client_id: &str,
        client_secret: &SecretString,
        grant: &Grant,
        account: Option<String>,
    ) -> Result<Self> {
        let base_url = api_url.trim_end_matches('/').to_string();
        let url = format!("{}/token", base_url);

        let body = match grant {
            Grant::ClientCredentials => TokenRequest {
                grant_type: "client_credentials",
                username: None,
                password: None,
            },
            Grant::Password { username, password } => TokenRequest {
                grant_type: "password",
                username: Some(username.as_str()),
                password: Some(password.expose_secret()),
            },
        };

        tracing::debug!("Requesting {} token for {}", body.grant_type, client_id);

        let response = http
            .post(&url)
            .basic_auth(client_id, Some(client_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(ApiError::Authentication(error.describe(status.as_u16())));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        tracing::debug!("Token issued, expires in {:?}s", token.expires_in);

        Ok(Self::with_token(
            http,
            &base_url,
            SecretString::from(token.access_token),
            account,
        ))
    }

    /// Client for an already issued token
    pub fn with_token(
        http: reqwest::Client,
        api_url: &str,
        token: SecretString,
        account: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: api_url.trim_end_matches('/').to_string(),
            token: Arc::new(token),
            account,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<String> {
        let mut builder = builder.bearer_auth(self.token.expose_secret());
        if let Some(account) = &self.account {
            builder = builder.query(&[("account_id", account)]);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                name: error.name(),
                message: error.describe(status.as_u16()),
            });
        }

        Ok(text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let text = self.execute(self.http.get(&url)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let text = self.execute(self.http.post(&url).json(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("PUT {}", url);
        let text = self.execute(self.http.put(&url).json(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);
        self.execute(self.http.delete(&url)).await?;
        Ok(())
    }
}

// ============ API Types ============

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Error envelope; the API and the OAuth endpoint use different field names
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error_name: Option<String>,
    errors: Vec<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn name(&self) -> String {
        self.error_name
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown_error".to_string())
    }

    fn describe(&self, status: u16) -> String {
        if !self.errors.is_empty() {
            return self.errors.join(", ");
        }
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("request failed with HTTP {}", status))
    }
}
