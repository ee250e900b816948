//! Core systems for Horizon Veil.
//!
//! This crate provides the in-memory document that the hidden-state
//! maintainer runs against:
//!
//! - **Document**: An arena of elements with ordered children and attributes
//! - **Mutation Records**: Journaled child-list changes
//! - **Observers**: Subtree observers fed by explicit delivery cycles
//! - **Markup**: Declarative subtree construction for fixtures
//! - **Logging**: Tracing targets and tree dumps
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use horizon_veil_core::{ElementSpec, SharedDocument};
//!
//! let document = SharedDocument::new();
//! let family = document
//!     .build(document.body(), ElementSpec::new("div").id("family"))
//!     .unwrap();
//! document.deliver_mutations();
//!
//! let changes = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&changes);
//! document.observe(family, move |records| {
//!     counter.fetch_add(records.len(), Ordering::SeqCst);
//! });
//!
//! let child = document.create_element("div");
//! document.append_child(family, child).unwrap();
//!
//! // Nothing is delivered until the next cycle.
//! assert_eq!(changes.load(Ordering::SeqCst), 0);
//! document.deliver_mutations();
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//! ```

pub mod document;
pub mod error;
pub mod logging;
pub mod markup;
pub mod mutation;
pub mod observer;

pub use document::{Document, NodeId, SharedDocument};
pub use error::{DocumentError, DocumentResult};
pub use markup::ElementSpec;
pub use mutation::{MutationQueue, MutationRecord};
pub use observer::{MutationCallback, ObserverId, ObserverSet};

pub use horizon_veil_selector::{SelectorError, SelectorList};
