//! Typed resource trait and the request envelope sent by the host runtime

use crate::error::{CloudError, Result};
use crate::state::{Attributes, Observed};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout applied to an operation when the host does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// A kind of remotely managed infrastructure object
///
/// Each resource kind (server, load balancer, firewall rule, ...) implements
/// this trait against its own typed attribute struct. Conversion from and to
/// the flat attribute set happens once, in the registry.
#[async_trait]
pub trait Resource<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Typed attributes, covering both configured and computed fields
    type Attributes: Serialize + DeserializeOwned + Default + Send + Sync;

    /// Returns the resource kind name (e.g., "brightbox_server")
    fn kind(&self) -> &'static str;

    /// Check planned attributes before any remote call is made
    fn validate(&self, _planned: &Self::Attributes) -> Result<()> {
        Ok(())
    }

    /// Create the resource and wait until it is usable
    async fn create(
        &self,
        ctx: &C,
        planned: &Self::Attributes,
        timeout: Duration,
    ) -> Result<Observed<Self::Attributes>>;

    /// Refresh the resource; `None` when it no longer exists
    async fn read(
        &self,
        ctx: &C,
        id: &str,
        prior: &Self::Attributes,
    ) -> Result<Option<Observed<Self::Attributes>>>;

    /// Apply changed attributes in place
    async fn update(
        &self,
        ctx: &C,
        id: &str,
        prior: &Self::Attributes,
        planned: &Self::Attributes,
        timeout: Duration,
    ) -> Result<Observed<Self::Attributes>>;

    /// Destroy the resource and wait until it is gone
    async fn delete(
        &self,
        ctx: &C,
        id: &str,
        prior: &Self::Attributes,
        timeout: Duration,
    ) -> Result<()>;
}

/// Lifecycle verb requested by the host runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Create,
    Read,
    Update,
    Delete,
    /// Accept an existing id verbatim
    Import,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Create => write!(f, "create"),
            Lifecycle::Read => write!(f, "read"),
            Lifecycle::Update => write!(f, "update"),
            Lifecycle::Delete => write!(f, "delete"),
            Lifecycle::Import => write!(f, "import"),
        }
    }
}

/// Per-operation timeouts, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<u64>,
}

impl Timeouts {
    pub fn create(&self) -> Duration {
        self.create.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    pub fn update(&self) -> Duration {
        self.update.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    pub fn delete(&self) -> Duration {
        self.delete.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }
}

/// One lifecycle call for one resource instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Resource kind (e.g., "brightbox_server")
    pub kind: String,

    pub operation: Lifecycle,

    /// Resource identifier; absent on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Last known state (read, update, delete)
    #[serde(default)]
    pub prior: Attributes,

    /// Desired configuration (create, update)
    #[serde(default)]
    pub planned: Attributes,

    #[serde(default)]
    pub timeouts: Timeouts,
}

impl ResourceRequest {
    fn new(kind: impl Into<String>, operation: Lifecycle) -> Self {
        Self {
            kind: kind.into(),
            operation,
            id: None,
            prior: Attributes::new(),
            planned: Attributes::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn create(kind: impl Into<String>, planned: Attributes) -> Self {
        Self {
            planned,
            ..Self::new(kind, Lifecycle::Create)
        }
    }

    pub fn read(kind: impl Into<String>, id: impl Into<String>, prior: Attributes) -> Self {
        Self {
            id: Some(id.into()),
            prior,
            ..Self::new(kind, Lifecycle::Read)
        }
    }

    pub fn update(
        kind: impl Into<String>,
        id: impl Into<String>,
        prior: Attributes,
        planned: Attributes,
    ) -> Self {
        Self {
            id: Some(id.into()),
            prior,
            planned,
            ..Self::new(kind, Lifecycle::Update)
        }
    }

    pub fn delete(kind: impl Into<String>, id: impl Into<String>, prior: Attributes) -> Self {
        Self {
            id: Some(id.into()),
            prior,
            ..Self::new(kind, Lifecycle::Delete)
        }
    }

    pub fn import(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(kind, Lifecycle::Import)
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The resource id, which every verb but create requires
    pub fn require_id(&self) -> Result<&str> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(CloudError::Validation(format!(
                "{} of {} requires a resource id",
                self.operation, self.kind
            ))),
        }
    }
}
