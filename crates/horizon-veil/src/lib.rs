//! Hidden-state maintenance for Horizon Veil.
//!
//! While a dialog or other focused region is open, everything outside it
//! should be hidden from assistive technology. This crate keeps that true
//! on a live tree:
//!
//! - **Path Resolver**: Finds the siblings of every node on the path from a
//!   context down to each target
//! - **Marker Registry**: Reference-counted `aria-hidden` bookkeeping, so
//!   overlapping sessions never unhide each other's nodes
//! - **Mutation Reactor**: Recomputes after each mutation delivery
//! - **Sessions**: [`HiddenHandle`] with an idempotent disengage
//!
//! The tree is reached through the traits in [`host`];
//! [`SharedDocument`](horizon_veil_core::SharedDocument) implements them.
//!
//! # Example
//!
//! ```
//! use horizon_veil::{DisengageOptions, HiddenConfig, SharedMarkerRegistry, maintain_hidden};
//! use horizon_veil_core::{ElementSpec, SharedDocument};
//!
//! let document = SharedDocument::new();
//! let body = document.body();
//! let uncle = document.build(body, ElementSpec::new("div").id("uncle-1")).unwrap();
//! let family = document.build(
//!     body,
//!     ElementSpec::new("div").id("family").child(ElementSpec::new("div").id("target")),
//! ).unwrap();
//!
//! let registry = SharedMarkerRegistry::new();
//! let handle = maintain_hidden(&document, &registry, HiddenConfig::new("#target")).unwrap();
//! assert_eq!(document.attribute(uncle, "aria-hidden").unwrap().as_deref(), Some("true"));
//! assert_eq!(document.attribute(family, "aria-hidden").unwrap(), None);
//!
//! // New siblings of path nodes are hidden after the next delivery cycle.
//! let late = document.create_element("div");
//! document.append_child(body, late).unwrap();
//! document.deliver_mutations();
//! assert!(registry.is_marked(late));
//!
//! handle.disengage(DisengageOptions::default());
//! assert_eq!(document.attribute(uncle, "aria-hidden").unwrap(), None);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod host;
pub mod logging;
pub mod maintainer;
pub mod reactor;
pub mod registry;
pub mod resolver;
pub mod session;

pub use config::{ContextRef, ContextScope, HiddenConfig, MaintainerSettings};
pub use error::{HostError, RegistryError, Result, VeilError};
pub use host::{ChangeCallback, Host, MarkerAccess, MutationSource, SelectorMatch, TreeAccess};
pub use maintainer::{HiddenMaintainer, maintain_hidden};
pub use reactor::{MutationReactor, ObservationCapability, ReactorToken};
pub use registry::{MarkRecord, MarkerRegistry, MarkerSpec, SharedMarkerRegistry};
pub use resolver::{Resolution, resolve_paths};
pub use session::{DisengageOptions, HiddenHandle};

pub use horizon_veil_selector::{SelectorError, SelectorList};
