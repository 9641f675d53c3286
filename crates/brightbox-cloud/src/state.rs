//! Resource instance state exchanged with the host runtime

use serde::{Deserialize, Serialize};

/// Flat attribute set, keyed by attribute name
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// State of a single resource instance as seen by the host runtime
///
/// An instance without an id has been removed (deleted remotely, or never
/// created).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstance {
    /// Provider-specific resource ID
    pub id: Option<String>,

    /// Resource attributes (IP, hostname, etc.)
    #[serde(default)]
    pub attributes: Attributes,

    /// Connection details for out-of-band provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
}

impl ResourceInstance {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: Some(id.into()),
            attributes,
            connection: None,
        }
    }

    /// Instance with a cleared id
    pub fn removed() -> Self {
        Self::default()
    }

    /// Instance carrying only an imported id; a later read fills the rest
    pub fn imported(id: impl Into<String>) -> Self {
        Self::new(id, Attributes::new())
    }

    pub fn is_removed(&self) -> bool {
        self.id.is_none()
    }

    pub fn with_connection(mut self, connection: Option<ConnectionInfo>) -> Self {
        self.connection = connection;
        self
    }

    /// Get an attribute as a specific type
    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// How provisioning tooling should reach a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "type")]
    pub kind: String,

    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ConnectionInfo {
    pub fn ssh(host: impl Into<String>) -> Self {
        Self {
            kind: "ssh".to_string(),
            host: host.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }
}

/// Typed result of a resource operation
#[derive(Debug, Clone, PartialEq)]
pub struct Observed<A> {
    pub id: String,
    pub attributes: A,
    pub connection: Option<ConnectionInfo>,
}

impl<A> Observed<A> {
    pub fn new(id: impl Into<String>, attributes: A) -> Self {
        Self {
            id: id.into(),
            attributes,
            connection: None,
        }
    }

    pub fn with_connection(mut self, connection: Option<ConnectionInfo>) -> Self {
        self.connection = connection;
        self
    }
}

/// Planned attributes paired with the prior state they replace
///
/// On create there is no prior state, and a field counts as changed when it
/// differs from its default value.
#[derive(Debug)]
pub struct Diff<'a, T> {
    prior: Option<&'a T>,
    planned: &'a T,
}

impl<T> Clone for Diff<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Diff<'_, T> {}

impl<'a, T> Diff<'a, T> {
    pub fn create(planned: &'a T) -> Self {
        Self {
            prior: None,
            planned,
        }
    }

    pub fn update(prior: &'a T, planned: &'a T) -> Self {
        Self {
            prior: Some(prior),
            planned,
        }
    }

    pub fn is_create(&self) -> bool {
        self.prior.is_none()
    }

    pub fn prior(&self) -> Option<&'a T> {
        self.prior
    }

    pub fn planned(&self) -> &'a T {
        self.planned
    }

    /// Whether the selected field differs between prior and planned state
    pub fn has_change<V, F>(&self, field: F) -> bool
    where
        V: PartialEq + Default,
        F: Fn(&T) -> &V,
    {
        let planned = field(self.planned);
        match self.prior {
            Some(prior) => field(prior) != planned,
            None => *planned != V::default(),
        }
    }

    /// The planned value of the selected field, if it changed
    pub fn changed<V, F>(&self, field: F) -> Option<V>
    where
        V: PartialEq + Default + Clone,
        F: Fn(&T) -> &V,
    {
        if self.has_change(&field) {
            Some(field(self.planned).clone())
        } else {
            None
        }
    }
}
