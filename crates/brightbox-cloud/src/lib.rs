//! Brightbox Cloud resource abstraction
//!
//! This crate holds the provider-independent half of the Brightbox provider
//! plugin: the error taxonomy, the flat resource instance exchanged with the
//! host runtime, the typed resource trait with its registry, and the state
//! reconciler used to wait for asynchronous provisioning.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Host runtime                    │
//! │           (create/read/update/delete)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ResourceRequest
//! ┌─────────────────▼───────────────────────────────┐
//! │                brightbox-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   ResourceRegistry  ─▶  trait Resource    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Diff / Attr │  │ StateWaiter  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────┐   ┌───────────────────┐
//! │ brightbox-provider│──▶│   brightbox-api   │
//! └───────────────────┘   └───────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod state;

// Re-exports
pub use error::{CloudError, Result};
pub use provider::{Lifecycle, Resource, ResourceRequest, Timeouts};
pub use reconcile::{PollConfig, StateWaiter};
pub use registry::{ResourceHandler, ResourceRegistry};
pub use state::{Attributes, ConnectionInfo, Diff, Observed, ResourceInstance};
