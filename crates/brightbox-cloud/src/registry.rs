//! Resource registry
//!
//! Maps resource kind names to their handlers. The registry is built once at
//! startup and passed by reference to whatever dispatches host requests.

use crate::error::{CloudError, Result};
use crate::provider::{Lifecycle, Resource, ResourceRequest};
use crate::state::{Attributes, Observed, ResourceInstance};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Object-safe view of a [`Resource`] working on flat attribute sets
#[async_trait]
pub trait ResourceHandler<C>: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn handle(&self, ctx: &C, request: &ResourceRequest) -> Result<ResourceInstance>;
}

#[async_trait]
impl<C, R> ResourceHandler<C> for R
where
    C: Send + Sync,
    R: Resource<C>,
{
    fn kind(&self) -> &'static str {
        <R as Resource<C>>::kind(self)
    }

    async fn handle(&self, ctx: &C, request: &ResourceRequest) -> Result<ResourceInstance> {
        let kind = <R as Resource<C>>::kind(self);

        match request.operation {
            Lifecycle::Create => {
                let planned: R::Attributes = decode(kind, &request.planned)?;
                self.validate(&planned)?;
                let observed = self
                    .create(ctx, &planned, request.timeouts.create())
                    .await?;
                encode(observed)
            }
            Lifecycle::Read => {
                let id = request.require_id()?;
                let prior: R::Attributes = decode(kind, &request.prior)?;
                match self.read(ctx, id, &prior).await? {
                    Some(observed) => encode(observed),
                    None => {
                        tracing::warn!("{} not found, removing from state: {}", kind, id);
                        Ok(ResourceInstance::removed())
                    }
                }
            }
            Lifecycle::Update => {
                let id = request.require_id()?;
                let prior: R::Attributes = decode(kind, &request.prior)?;
                let planned: R::Attributes = decode(kind, &request.planned)?;
                self.validate(&planned)?;
                let observed = self
                    .update(ctx, id, &prior, &planned, request.timeouts.update())
                    .await?;
                encode(observed)
            }
            Lifecycle::Delete => {
                let id = request.require_id()?;
                let prior: R::Attributes = decode(kind, &request.prior)?;
                self.delete(ctx, id, &prior, request.timeouts.delete())
                    .await?;
                Ok(ResourceInstance::removed())
            }
            Lifecycle::Import => {
                let id = request.require_id()?;
                tracing::debug!("Importing {} {}", kind, id);
                Ok(ResourceInstance::imported(id))
            }
        }
    }
}

fn decode<A: DeserializeOwned>(kind: &str, attributes: &Attributes) -> Result<A> {
    serde_json::from_value(serde_json::Value::Object(attributes.clone()))
        .map_err(|e| CloudError::Validation(format!("invalid {} attributes: {}", kind, e)))
}

fn encode<A: Serialize>(observed: Observed<A>) -> Result<ResourceInstance> {
    let attributes = match serde_json::to_value(&observed.attributes)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(CloudError::Validation(format!(
                "resource attributes must encode to an object, got {}",
                other
            )));
        }
    };
    Ok(ResourceInstance::new(observed.id, attributes).with_connection(observed.connection))
}

/// Registry of resource handlers, keyed by kind
pub struct ResourceRegistry<C> {
    handlers: BTreeMap<&'static str, Box<dyn ResourceHandler<C>>>,
}

impl<C> Default for ResourceRegistry<C> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<C> ResourceRegistry<C>
where
    C: Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource kind, replacing any handler registered under the same name
    pub fn register<R>(mut self, resource: R) -> Self
    where
        R: Resource<C> + 'static,
    {
        let kind = <R as Resource<C>>::kind(&resource);
        self.handlers.insert(kind, Box::new(resource));
        self
    }

    pub fn get(&self, kind: &str) -> Result<&dyn ResourceHandler<C>> {
        self.handlers
            .get(kind)
            .map(|h| h.as_ref())
            .ok_or_else(|| CloudError::UnknownResource(kind.to_string()))
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route a host request to the handler for its kind
    pub async fn dispatch(&self, ctx: &C, request: &ResourceRequest) -> Result<ResourceInstance> {
        let handler = self.get(&request.kind)?;
        tracing::debug!(
            "Dispatching {} for {}{}",
            request.operation,
            request.kind,
            request.id.as_deref().map(|id| format!(" ({})", id)).unwrap_or_default()
        );
        handler.handle(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConnectionInfo;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct NoteAttributes {
        text: Option<String>,
        length: Option<usize>,
    }

    /// In-memory resource used to exercise the registry plumbing
    #[derive(Default)]
    struct NoteResource {
        calls: Mutex<Vec<String>>,
    }

    impl NoteResource {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl Resource<()> for NoteResource {
        type Attributes = NoteAttributes;

        fn kind(&self) -> &'static str {
            "note"
        }

        fn validate(&self, planned: &NoteAttributes) -> Result<()> {
            if planned.text.is_none() {
                return Err(CloudError::Validation("text is required".to_string()));
            }
            Ok(())
        }

        async fn create(
            &self,
            _ctx: &(),
            planned: &NoteAttributes,
            _timeout: Duration,
        ) -> Result<Observed<NoteAttributes>> {
            self.record("create");
            let text = planned.text.clone().unwrap_or_default();
            Ok(Observed::new(
                "note-1",
                NoteAttributes {
                    length: Some(text.len()),
                    text: Some(text),
                },
            )
            .with_connection(Some(ConnectionInfo::ssh("notes.example.com"))))
        }

        async fn read(
            &self,
            _ctx: &(),
            id: &str,
            _prior: &NoteAttributes,
        ) -> Result<Option<Observed<NoteAttributes>>> {
            self.record("read");
            if id == "note-gone" {
                return Ok(None);
            }
            Ok(Some(Observed::new(id, NoteAttributes::default())))
        }

        async fn update(
            &self,
            _ctx: &(),
            id: &str,
            _prior: &NoteAttributes,
            planned: &NoteAttributes,
            _timeout: Duration,
        ) -> Result<Observed<NoteAttributes>> {
            self.record("update");
            Ok(Observed::new(
                id,
                NoteAttributes {
                    text: planned.text.clone(),
                    length: None,
                },
            ))
        }

        async fn delete(
            &self,
            _ctx: &(),
            _id: &str,
            _prior: &NoteAttributes,
            _timeout: Duration,
        ) -> Result<()> {
            self.record("delete");
            Ok(())
        }
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_create_encodes_typed_attributes() {
        let registry = ResourceRegistry::new().register(NoteResource::default());

        let request = ResourceRequest::create("note", attrs(serde_json::json!({ "text": "hi" })));
        let instance = registry.dispatch(&(), &request).await.unwrap();

        assert_eq!(instance.id.as_deref(), Some("note-1"));
        assert_eq!(instance.get_attribute::<usize>("length"), Some(2));
        assert_eq!(
            instance.connection.map(|c| c.host),
            Some("notes.example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected() {
        let registry: ResourceRegistry<()> = ResourceRegistry::new();
        let request = ResourceRequest::import("brightbox_nothing", "x-1");

        let err = registry.dispatch(&(), &request).await.unwrap_err();
        assert!(matches!(err, CloudError::UnknownResource(kind) if kind == "brightbox_nothing"));
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_a_validation_error() {
        let resource = NoteResource::default();
        let request = ResourceRequest::create(
            "note",
            attrs(serde_json::json!({ "text": "hi", "colour": "red" })),
        );

        let err = resource.handle(&(), &request).await.unwrap_err();
        assert!(matches!(err, CloudError::Validation(_)));
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_runs_before_create() {
        let resource = NoteResource::default();
        let request = ResourceRequest::create("note", Attributes::new());

        let err = resource.handle(&(), &request).await.unwrap_err();
        assert!(matches!(err, CloudError::Validation(_)));
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_of_vanished_resource_clears_id() {
        let registry = ResourceRegistry::new().register(NoteResource::default());
        let request = ResourceRequest::read("note", "note-gone", Attributes::new());

        let instance = registry.dispatch(&(), &request).await.unwrap();
        assert!(instance.is_removed());
    }

    #[tokio::test]
    async fn test_import_is_pass_through() {
        let resource = NoteResource::default();
        let request = ResourceRequest::import("note", "note-42");

        let instance = resource.handle(&(), &request).await.unwrap();
        assert_eq!(instance, ResourceInstance::imported("note-42"));
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_id() {
        let resource = NoteResource::default();
        let request = ResourceRequest::delete("note", "note-1", Attributes::new());

        let instance = resource.handle(&(), &request).await.unwrap();
        assert!(instance.is_removed());
        assert_eq!(*resource.calls.lock().unwrap(), vec!["delete".to_string()]);
    }

    #[test]
    fn test_kinds_are_sorted() {
        let registry: ResourceRegistry<()> = ResourceRegistry::new().register(NoteResource::default());
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["note"]);
        assert_eq!(registry.len(), 1);
    }
}
