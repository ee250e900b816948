//! Reference-counted hidden markers.
//!
//! Several sessions may want the same node hidden. The registry applies the
//! marker on the first acquire, remembers the value it replaced, and restores
//! that value when the last holder releases the node.
//!
//! # Key Types
//!
//! - [`MarkerRegistry`] - The bookkeeping table
//! - [`SharedMarkerRegistry`] - Cloneable, lockable handle shared by sessions
//! - [`MarkerSpec`] - Which attribute to write and what value means hidden
//!
//! # Example
//!
//! ```
//! use horizon_veil::SharedMarkerRegistry;
//! use horizon_veil_core::SharedDocument;
//!
//! let document = SharedDocument::new();
//! let node = document.create_element("div");
//! document.append_child(document.body(), node).unwrap();
//! document.set_attribute(node, "aria-hidden", "false").unwrap();
//!
//! let registry = SharedMarkerRegistry::new();
//! registry.acquire(&document, node).unwrap();
//! registry.acquire(&document, node).unwrap();
//! assert_eq!(document.attribute(node, "aria-hidden").unwrap().as_deref(), Some("true"));
//!
//! registry.release(&document, node).unwrap();
//! assert_eq!(document.attribute(node, "aria-hidden").unwrap().as_deref(), Some("true"));
//! registry.release(&document, node).unwrap();
//! assert_eq!(document.attribute(node, "aria-hidden").unwrap().as_deref(), Some("false"));
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{HostError, RegistryError};
use crate::host::MarkerAccess;

/// The marker attribute and the value that means "hidden".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpec {
    /// Attribute name, `aria-hidden` by default.
    pub attribute: String,
    /// Value written while a node is hidden, `true` by default.
    pub hidden_value: String,
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            attribute: "aria-hidden".to_string(),
            hidden_value: "true".to_string(),
        }
    }
}

impl MarkerSpec {
    /// Create a spec for a custom attribute.
    pub fn new(attribute: impl Into<String>, hidden_value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            hidden_value: hidden_value.into(),
        }
    }
}

/// Bookkeeping for one marked node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRecord {
    /// Number of outstanding acquires. Always at least one.
    pub count: usize,
    /// The marker value before the first acquire, `None` if absent.
    pub prior_value: Option<String>,
}

/// Reference-counted marker table keyed by node.
#[derive(Debug)]
pub struct MarkerRegistry<N> {
    records: HashMap<N, MarkRecord>,
    marker: MarkerSpec,
}

impl<N> Default for MarkerRegistry<N> {
    fn default() -> Self {
        Self::with_marker(MarkerSpec::default())
    }
}

impl<N> MarkerRegistry<N> {
    /// Create an empty registry writing `aria-hidden="true"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry writing a custom marker.
    pub fn with_marker(marker: MarkerSpec) -> Self {
        Self {
            records: HashMap::new(),
            marker,
        }
    }

    /// The marker this registry writes.
    pub fn marker(&self) -> &MarkerSpec {
        &self.marker
    }

    /// Number of nodes currently marked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no node is marked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<N: Copy + Eq + Hash + Debug> MarkerRegistry<N> {
    /// Number of outstanding acquires for a node, zero if unmarked.
    pub fn reference_count(&self, node: N) -> usize {
        self.records.get(&node).map_or(0, |r| r.count)
    }

    /// Whether the registry holds a mark on the node.
    pub fn is_marked(&self, node: N) -> bool {
        self.records.contains_key(&node)
    }

    /// The bookkeeping record for a node.
    pub fn record(&self, node: N) -> Option<&MarkRecord> {
        self.records.get(&node)
    }

    /// Hide a node, or add one more holder if it is already hidden.
    ///
    /// Returns the new reference count. On a host error no record is
    /// created.
    pub fn acquire<H>(&mut self, host: &H, node: N) -> Result<usize, RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
    {
        if let Some(record) = self.records.get_mut(&node) {
            record.count += 1;
            tracing::trace!(target: "horizon_veil::registry", ?node, count = record.count, "mark shared");
            return Ok(record.count);
        }

        let prior_value = host.attribute(node, &self.marker.attribute)?;
        host.set_attribute(node, &self.marker.attribute, &self.marker.hidden_value)?;
        tracing::trace!(target: "horizon_veil::registry", ?node, ?prior_value, "marked");
        self.records.insert(
            node,
            MarkRecord {
                count: 1,
                prior_value,
            },
        );
        Ok(1)
    }

    /// Drop one holder. The last release restores the prior value.
    ///
    /// Returns the remaining reference count. Releasing an unmarked node is
    /// [`RegistryError::Underflow`]. When the restore write fails the record
    /// is still dropped and the host error is returned; a node the host no
    /// longer knows has nothing to restore and is not an error.
    pub fn release<H>(&mut self, host: &H, node: N) -> Result<usize, RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
    {
        let Some(record) = self.records.get_mut(&node) else {
            tracing::error!(target: "horizon_veil::registry", ?node, "release without a mark");
            return Err(RegistryError::Underflow);
        };

        record.count -= 1;
        if record.count > 0 {
            tracing::trace!(target: "horizon_veil::registry", ?node, count = record.count, "mark still shared");
            return Ok(record.count);
        }

        let prior_value = self
            .records
            .remove(&node)
            .and_then(|record| record.prior_value);
        let restored = match &prior_value {
            Some(value) => host.set_attribute(node, &self.marker.attribute, value),
            None => host.remove_attribute(node, &self.marker.attribute),
        };
        match restored {
            Ok(()) => {
                tracing::trace!(target: "horizon_veil::registry", ?node, ?prior_value, "restored");
                Ok(0)
            }
            Err(HostError::UnknownNode) => {
                tracing::debug!(target: "horizon_veil::registry", ?node, "released node no longer exists");
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Acquire every node, returning the ones that were acquired.
    ///
    /// Host failures are logged and the node is left out of the result.
    pub fn acquire_all<H, I>(&mut self, host: &H, nodes: I) -> Vec<N>
    where
        H: MarkerAccess<Node = N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        let mut acquired = Vec::new();
        for node in nodes {
            match self.acquire(host, node) {
                Ok(_) => acquired.push(node),
                Err(err) => {
                    tracing::warn!(target: "horizon_veil::registry", ?node, %err, "failed to hide node");
                }
            }
        }
        acquired
    }

    /// Release every node.
    ///
    /// All nodes are processed. Host failures are logged; the first
    /// underflow is returned after the batch completes.
    pub fn release_all<H, I>(&mut self, host: &H, nodes: I) -> Result<(), RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        let mut underflow = None;
        for node in nodes {
            match self.release(host, node) {
                Ok(_) => {}
                Err(RegistryError::Underflow) => underflow = underflow.or(Some(RegistryError::Underflow)),
                Err(err) => {
                    tracing::warn!(target: "horizon_veil::registry", ?node, %err, "failed to restore node");
                }
            }
        }
        underflow.map_or(Ok(()), Err)
    }
}

/// A thread-safe, cloneable handle to a [`MarkerRegistry`].
///
/// Clones share one table. Sessions that may overlap on the same nodes must
/// share one registry.
pub struct SharedMarkerRegistry<N> {
    inner: Arc<Mutex<MarkerRegistry<N>>>,
}

impl<N> Clone for SharedMarkerRegistry<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N> Default for SharedMarkerRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Debug> Debug for SharedMarkerRegistry<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMarkerRegistry")
            .field("marked", &self.inner.lock().len())
            .finish()
    }
}

impl<N> SharedMarkerRegistry<N> {
    /// Create an empty shared registry writing `aria-hidden="true"`.
    pub fn new() -> Self {
        Self::with_marker(MarkerSpec::default())
    }

    /// Create an empty shared registry writing a custom marker.
    pub fn with_marker(marker: MarkerSpec) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MarkerRegistry::with_marker(marker))),
        }
    }

    /// Run a closure with exclusive access to the registry.
    pub fn with_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MarkerRegistry<N>) -> R,
    {
        f(&mut self.inner.lock())
    }

    /// The marker this registry writes.
    pub fn marker(&self) -> MarkerSpec {
        self.inner.lock().marker().clone()
    }

    /// Number of nodes currently marked.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no node is marked.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Check whether two handles share one table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<N: Copy + Eq + Hash + Debug> SharedMarkerRegistry<N> {
    /// Number of outstanding acquires for a node.
    pub fn reference_count(&self, node: N) -> usize {
        self.inner.lock().reference_count(node)
    }

    /// Whether the registry holds a mark on the node.
    pub fn is_marked(&self, node: N) -> bool {
        self.inner.lock().is_marked(node)
    }

    /// Hide a node. See [`MarkerRegistry::acquire`].
    pub fn acquire<H>(&self, host: &H, node: N) -> Result<usize, RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
    {
        self.inner.lock().acquire(host, node)
    }

    /// Release a node. See [`MarkerRegistry::release`].
    pub fn release<H>(&self, host: &H, node: N) -> Result<usize, RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
    {
        self.inner.lock().release(host, node)
    }

    /// Acquire a batch under one lock. See [`MarkerRegistry::acquire_all`].
    pub fn acquire_all<H, I>(&self, host: &H, nodes: I) -> Vec<N>
    where
        H: MarkerAccess<Node = N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        self.inner.lock().acquire_all(host, nodes)
    }

    /// Release a batch under one lock. See [`MarkerRegistry::release_all`].
    pub fn release_all<H, I>(&self, host: &H, nodes: I) -> Result<(), RegistryError>
    where
        H: MarkerAccess<Node = N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        self.inner.lock().release_all(host, nodes)
    }
}

static_assertions::assert_impl_all!(SharedMarkerRegistry<horizon_veil_core::NodeId>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_veil_core::{NodeId, SharedDocument};

    fn setup() -> (SharedDocument, NodeId) {
        let document = SharedDocument::new();
        let node = document.create_element("div");
        document.append_child(document.body(), node).unwrap();
        (document, node)
    }

    fn marker(document: &SharedDocument, node: NodeId) -> Option<String> {
        document.attribute(node, "aria-hidden").unwrap()
    }

    #[test]
    fn first_acquire_marks_and_last_release_removes() {
        let (document, node) = setup();
        let mut registry = MarkerRegistry::new();

        assert_eq!(registry.acquire(&document, node), Ok(1));
        assert_eq!(marker(&document, node).as_deref(), Some("true"));
        assert_eq!(registry.record(node).unwrap().prior_value, None);

        assert_eq!(registry.release(&document, node), Ok(0));
        assert_eq!(marker(&document, node), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn prior_value_is_restored() {
        let (document, node) = setup();
        document.set_attribute(node, "aria-hidden", "false").unwrap();
        let mut registry = MarkerRegistry::new();

        registry.acquire(&document, node).unwrap();
        assert_eq!(marker(&document, node).as_deref(), Some("true"));
        registry.release(&document, node).unwrap();
        assert_eq!(marker(&document, node).as_deref(), Some("false"));
    }

    #[test]
    fn overlapping_holders_keep_the_mark() {
        let (document, node) = setup();
        let mut registry = MarkerRegistry::new();

        registry.acquire(&document, node).unwrap();
        // A second holder must not capture "true" as the prior value.
        assert_eq!(registry.acquire(&document, node), Ok(2));
        assert_eq!(registry.reference_count(node), 2);

        assert_eq!(registry.release(&document, node), Ok(1));
        assert_eq!(marker(&document, node).as_deref(), Some("true"));
        assert_eq!(registry.release(&document, node), Ok(0));
        assert_eq!(marker(&document, node), None);
    }

    #[test]
    fn release_without_acquire_underflows() {
        let (document, node) = setup();
        let mut registry = MarkerRegistry::new();
        assert_eq!(registry.release(&document, node), Err(RegistryError::Underflow));
    }

    #[test]
    fn acquire_of_missing_node_creates_no_record() {
        let (document, node) = setup();
        document.destroy(node).unwrap();
        let mut registry = MarkerRegistry::new();

        assert_eq!(
            registry.acquire(&document, node),
            Err(RegistryError::Host(HostError::UnknownNode))
        );
        assert!(!registry.is_marked(node));
        assert!(registry.acquire_all(&document, [node]).is_empty());
    }

    #[test]
    fn release_of_destroyed_node_drops_record() {
        let (document, node) = setup();
        let mut registry = MarkerRegistry::new();
        registry.acquire(&document, node).unwrap();
        document.destroy(node).unwrap();

        assert_eq!(registry.release(&document, node), Ok(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn release_all_finishes_the_batch_before_reporting_underflow() {
        let (document, node) = setup();
        let other = document.create_element("div");
        document.append_child(document.body(), other).unwrap();
        let mut registry = MarkerRegistry::new();
        registry.acquire(&document, node).unwrap();

        assert_eq!(
            registry.release_all(&document, [other, node]),
            Err(RegistryError::Underflow)
        );
        assert!(!registry.is_marked(node));
        assert_eq!(marker(&document, node), None);
    }

    #[test]
    fn custom_marker() {
        let (document, node) = setup();
        let registry = SharedMarkerRegistry::with_marker(MarkerSpec::new("inert", ""));

        registry.acquire(&document, node).unwrap();
        assert_eq!(document.attribute(node, "inert").unwrap().as_deref(), Some(""));
        assert_eq!(marker(&document, node), None);
        registry.release(&document, node).unwrap();
        assert_eq!(document.attribute(node, "inert").unwrap(), None);
    }

    #[test]
    fn shared_handles_share_one_table() {
        let (document, node) = setup();
        let first = SharedMarkerRegistry::new();
        let second = first.clone();

        first.acquire(&document, node).unwrap();
        assert!(second.is_marked(node));
        assert_eq!(second.reference_count(node), 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(second.acquire_all(&document, [node]), vec![node]);
        assert_eq!(first.reference_count(node), 2);
        second.release_all(&document, [node, node]).unwrap();
        assert!(first.is_empty());
    }
}
