//! Document tree for Horizon Veil.
//!
//! This module provides the in-memory element tree that the hidden-state
//! maintainer operates on.
//!
//! # Key Types
//!
//! - [`NodeId`] - A generational handle to an element
//! - [`Document`] - The arena owning every element of one document
//! - [`SharedDocument`] - A thread-safe, observable handle to a document
//!
//! # Tree Model
//!
//! Every document has an `html` root with a `body` child. Elements are
//! created detached and become part of the document when they are inserted
//! under a connected node. Detached subtrees stay alive until
//! [`Document::destroy`] removes them.
//!
//! Child-list changes are journaled as [`MutationRecord`]s and delivered to
//! observers by [`SharedDocument::deliver_mutations`]. Attribute writes are
//! not journaled.
//!
//! # Example
//!
//! ```
//! use horizon_veil_core::{Document, ElementSpec};
//!
//! let mut document = Document::new();
//! let body = document.body();
//! let family = document.build(
//!     body,
//!     ElementSpec::new("div")
//!         .id("family")
//!         .child(ElementSpec::new("div").id("target")),
//! ).unwrap();
//!
//! let target = document.element_by_id("target").unwrap();
//! assert_eq!(document.parent(target).unwrap(), Some(family));
//! assert!(document.is_connected(target));
//! ```

use std::sync::Arc;

use horizon_veil_selector::{ElementTree, SelectorList, SelectorMatcher, SiblingInfo};
use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use crate::error::{DocumentError, DocumentResult};
use crate::logging::DocumentTreeDebug;
use crate::mutation::{MutationQueue, MutationRecord};
use crate::observer::{ObserverId, ObserverSet};

new_key_type! {
    /// A unique identifier for an element in a [`Document`].
    ///
    /// Uses generational indexing: an ID of a destroyed element never
    /// aliases a newly created one.
    pub struct NodeId;
}

/// Internal storage for a single element.
#[derive(Debug, Clone)]
struct NodeData {
    /// Lowercase tag name.
    local_name: String,
    /// Attributes in insertion order.
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(local_name: &str) -> Self {
        Self {
            local_name: local_name.to_ascii_lowercase(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An arena of elements forming one document.
///
/// # Related
///
/// - [`SharedDocument`] - Thread-safe wrapper with mutation delivery
/// - [`DocumentTreeDebug`](crate::logging::DocumentTreeDebug) - Tree dumps
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
    mutations: MutationQueue,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing `html > body`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new("html"));
        let mut body_data = NodeData::new("body");
        body_data.parent = Some(root);
        let body = nodes.insert(body_data);
        if let Some(root_data) = nodes.get_mut(root) {
            root_data.children.push(body);
        }

        Self {
            nodes,
            root,
            body,
            mutations: MutationQueue::new(),
        }
    }

    /// The document root (`html`).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `body` element created with the document.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        let id = self.nodes.insert(NodeData::new(local_name));
        tracing::trace!(target: "horizon_veil_core::document", ?id, local_name, "created element");
        id
    }

    /// Check if an element exists (it may be detached).
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get the number of live elements, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn data(&self, id: NodeId) -> DocumentResult<&NodeData> {
        self.nodes.get(id).ok_or(DocumentError::InvalidNodeId)
    }

    fn data_mut(&mut self, id: NodeId) -> DocumentResult<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(DocumentError::InvalidNodeId)
    }

    /// Get the tag name of an element.
    pub fn local_name(&self, id: NodeId) -> DocumentResult<&str> {
        self.data(id).map(|d| d.local_name.as_str())
    }

    /// Get the parent of an element.
    pub fn parent(&self, id: NodeId) -> DocumentResult<Option<NodeId>> {
        self.data(id).map(|d| d.parent)
    }

    /// Get the children of an element in order.
    pub fn children(&self, id: NodeId) -> DocumentResult<&[NodeId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    /// Get the ancestors of an element, nearest first.
    pub fn ancestors(&self, id: NodeId) -> DocumentResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.data(id)?.parent;
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.nodes.get(ancestor).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// Get the descendants of an element in document (pre-)order.
    ///
    /// The element itself is not included.
    pub fn descendants(&self, id: NodeId) -> DocumentResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.data(id)?.children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            if let Some(data) = self.nodes.get(node) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        Ok(result)
    }

    /// Check whether `ancestor` is `id` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(node).and_then(|d| d.parent);
        }
        false
    }

    /// Check whether an element is attached to the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference`, or last if `None`.
    #[tracing::instrument(skip(self), target = "horizon_veil_core::document", level = "trace")]
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DocumentResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(DocumentError::InvalidNodeId);
        }
        if child == self.root {
            return Err(DocumentError::RootMutation);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DocumentError::HierarchyViolation);
        }
        if let Some(reference) = reference {
            if self.data(reference)?.parent != Some(parent) || reference == child {
                return Err(DocumentError::NotAChild);
            }
        }

        self.unlink(child);

        let children = &mut self.data_mut(parent)?.children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        self.mutations.push(MutationRecord::added(parent, child));

        Ok(())
    }

    /// Remove `child` from `parent`, leaving it detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        if !self.contains(parent) {
            return Err(DocumentError::InvalidNodeId);
        }
        if self.data(child)?.parent != Some(parent) {
            return Err(DocumentError::NotAChild);
        }
        self.unlink(child);
        Ok(())
    }

    /// Detach an element from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) -> DocumentResult<()> {
        if id == self.root {
            return Err(DocumentError::RootMutation);
        }
        self.data(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Remove an element from its parent's child list and journal the removal.
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|d| d.parent.take()) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.retain(|&c| c != id);
        }
        self.mutations.push(MutationRecord::removed(parent, id));
    }

    /// Remove an element and all its descendants from the document.
    #[tracing::instrument(skip(self), target = "horizon_veil_core::document", level = "trace")]
    pub fn destroy(&mut self, id: NodeId) -> DocumentResult<()> {
        if id == self.root || id == self.body {
            return Err(DocumentError::RootMutation);
        }
        let descendants = self.descendants(id)?;
        tracing::trace!(target: "horizon_veil_core::document", ?id, descendant_count = descendants.len(), "destroying element tree");

        self.unlink(id);
        for node in descendants {
            self.nodes.remove(node);
        }
        self.nodes.remove(id);
        Ok(())
    }

    /// Get the value of an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> DocumentResult<Option<&str>> {
        Ok(self
            .data(id)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str()))
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DocumentResult<()> {
        let attributes = &mut self.data_mut(id)?.attributes;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Remove an attribute. Returns the previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DocumentResult<Option<String>> {
        let attributes = &mut self.data_mut(id)?.attributes;
        Ok(attributes
            .iter()
            .position(|(n, _)| n == name)
            .map(|index| attributes.remove(index).1))
    }

    /// Get all attributes of an element in insertion order.
    pub fn attributes(&self, id: NodeId) -> DocumentResult<&[(String, String)]> {
        self.data(id).map(|d| d.attributes.as_slice())
    }

    /// Find the first connected element with the given `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .ok()?
            .into_iter()
            .find(|&node| self.attribute(node, "id").ok().flatten() == Some(id))
    }

    /// Find every descendant of `scope` matching the selector list, in
    /// document order.
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> DocumentResult<Vec<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .filter(|&node| SelectorMatcher::matches_list(selectors, self, node))
            .collect())
    }

    /// Find the first descendant of `scope` matching the selector list.
    pub fn query_selector(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> DocumentResult<Option<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .find(|&node| SelectorMatcher::matches_list(selectors, self, node)))
    }

    /// Check if there are undelivered mutation records.
    pub fn has_pending_mutations(&self) -> bool {
        self.mutations.has_pending()
    }

    /// Take every undelivered mutation record, oldest first.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.mutations.take_all()
    }

    /// Check whether a record concerns the subtree rooted at `scope`.
    ///
    /// True when the record's target lies inside the subtree, when an added
    /// or removed child was `scope` or one of its ancestors, or when `scope`
    /// no longer exists.
    pub fn record_touches(&self, scope: NodeId, record: &MutationRecord) -> bool {
        if !self.contains(scope) {
            return true;
        }
        self.is_inclusive_ancestor(scope, record.target)
            || record
                .added
                .iter()
                .chain(&record.removed)
                .any(|&child| self.is_inclusive_ancestor(child, scope))
    }
}

impl ElementTree for Document {
    type Element = NodeId;

    fn local_name(&self, element: NodeId) -> &str {
        self.nodes
            .get(element)
            .map(|d| d.local_name.as_str())
            .unwrap_or("")
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        Document::attribute(self, element, name).ok().flatten()
    }

    fn parent_element(&self, element: NodeId) -> Option<NodeId> {
        self.nodes.get(element).and_then(|d| d.parent)
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        let info = self.sibling_info(element)?;
        let parent = self.nodes.get(element)?.parent?;
        let index = info.index.checked_sub(1)?;
        self.nodes.get(parent)?.children.get(index).copied()
    }

    fn sibling_info(&self, element: NodeId) -> Option<SiblingInfo> {
        let parent = self.nodes.get(element)?.parent?;
        let siblings = &self.nodes.get(parent)?.children;
        let index = siblings.iter().position(|&c| c == element)?;
        Some(SiblingInfo {
            index,
            count: siblings.len(),
        })
    }

    fn child_count(&self, element: NodeId) -> usize {
        self.nodes.get(element).map_or(0, |d| d.children.len())
    }
}

struct SharedInner {
    document: RwLock<Document>,
    observers: ObserverSet,
}

/// A thread-safe, cloneable handle to a [`Document`].
///
/// Clones share the same document and observer set. Structural changes made
/// through any clone are queued and reach observers on the next
/// [`deliver_mutations`](Self::deliver_mutations) call.
///
/// # Related
///
/// - [`Document`] - The underlying arena
/// - [`ObserverSet`] - Observer bookkeeping
#[derive(Clone)]
pub struct SharedDocument {
    inner: Arc<SharedInner>,
}

impl Default for SharedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDocument")
            .field("node_count", &self.node_count())
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

impl SharedDocument {
    /// Create a new shared document containing `html > body`.
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    /// Wrap an existing document.
    pub fn from_document(document: Document) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                document: RwLock::new(document),
                observers: ObserverSet::new(),
            }),
        }
    }

    /// Run a closure with read access to the document.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        f(&self.inner.document.read())
    }

    /// Run a closure with write access to the document.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Document) -> R,
    {
        f(&mut self.inner.document.write())
    }

    /// Check whether two handles share the same document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.inner.document.read().root()
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.inner.document.read().body()
    }

    /// Create a detached element.
    pub fn create_element(&self, local_name: &str) -> NodeId {
        self.inner.document.write().create_element(local_name)
    }

    /// Build a subtree from a spec and append it under `parent`.
    pub fn build(&self, parent: NodeId, spec: crate::markup::ElementSpec) -> DocumentResult<NodeId> {
        self.inner.document.write().build(parent, spec)
    }

    /// Check if an element exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.document.read().contains(id)
    }

    /// Get the number of live elements.
    pub fn node_count(&self) -> usize {
        self.inner.document.read().node_count()
    }

    /// Get the parent of an element.
    pub fn parent(&self, id: NodeId) -> DocumentResult<Option<NodeId>> {
        self.inner.document.read().parent(id)
    }

    /// Get the children of an element (returns owned Vec for thread safety).
    pub fn children(&self, id: NodeId) -> DocumentResult<Vec<NodeId>> {
        self.inner.document.read().children(id).map(|c| c.to_vec())
    }

    /// Check whether an element is attached to the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.inner.document.read().is_connected(id)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.inner.document.write().append_child(parent, child)
    }

    /// Insert `child` under `parent` before `reference`.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DocumentResult<()> {
        self.inner
            .document
            .write()
            .insert_before(parent, child, reference)
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.inner.document.write().remove_child(parent, child)
    }

    /// Detach an element from its parent.
    pub fn detach(&self, id: NodeId) -> DocumentResult<()> {
        self.inner.document.write().detach(id)
    }

    /// Destroy an element and its descendants.
    pub fn destroy(&self, id: NodeId) -> DocumentResult<()> {
        self.inner.document.write().destroy(id)
    }

    /// Get the value of an attribute (owned for thread safety).
    pub fn attribute(&self, id: NodeId, name: &str) -> DocumentResult<Option<String>> {
        self.inner
            .document
            .read()
            .attribute(id, name)
            .map(|v| v.map(str::to_string))
    }

    /// Set an attribute.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> DocumentResult<()> {
        self.inner.document.write().set_attribute(id, name, value)
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove_attribute(&self, id: NodeId, name: &str) -> DocumentResult<Option<String>> {
        self.inner.document.write().remove_attribute(id, name)
    }

    /// Find the first connected element with the given `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.document.read().element_by_id(id)
    }

    /// Find every descendant of `scope` matching the selector list.
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> DocumentResult<Vec<NodeId>> {
        self.inner.document.read().query_selector_all(scope, selectors)
    }

    /// Find the first descendant of `scope` matching the selector list.
    pub fn query_selector(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> DocumentResult<Option<NodeId>> {
        self.inner.document.read().query_selector(scope, selectors)
    }

    /// Observe child-list changes in the subtree rooted at `scope`.
    pub fn observe<F>(&self, scope: NodeId, callback: F) -> ObserverId
    where
        F: Fn(&[MutationRecord]) + Send + Sync + 'static,
    {
        self.inner.observers.observe(scope, callback)
    }

    /// Stop an observer. Returns `false` if it was already disconnected.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.inner.observers.disconnect(id)
    }

    /// Get the number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.observer_count()
    }

    /// Block or unblock delivery. Records delivered while blocked are dropped.
    pub fn set_delivery_blocked(&self, blocked: bool) {
        self.inner.observers.set_blocked(blocked);
    }

    /// Check if there are undelivered mutation records.
    pub fn has_pending_mutations(&self) -> bool {
        self.inner.document.read().has_pending_mutations()
    }

    /// Render the whole tree with [`DocumentTreeDebug`].
    pub fn debug_tree(&self) -> String {
        let document = self.inner.document.read();
        DocumentTreeDebug::new()
            .format_subtree(&document, document.root())
            .unwrap_or_default()
    }

    /// Run one delivery cycle.
    ///
    /// Drains the pending records and invokes each observer at most once
    /// with the records that touch its scope. No lock is held while a
    /// callback runs, so callbacks may read and write the document; their
    /// structural changes are delivered on the next cycle. An observer
    /// disconnected by an earlier callback in the same cycle is skipped.
    ///
    /// Returns the number of callbacks invoked.
    #[tracing::instrument(skip(self), target = "horizon_veil_core::document", level = "trace")]
    pub fn deliver_mutations(&self) -> usize {
        let records = self.inner.document.write().take_records();
        if records.is_empty() {
            return 0;
        }
        if self.inner.observers.is_blocked() {
            tracing::trace!(target: "horizon_veil_core::document", dropped = records.len(), "delivery blocked");
            return 0;
        }
        if tracing::enabled!(target: "horizon_veil_core::document", tracing::Level::TRACE) {
            tracing::trace!(
                target: "horizon_veil_core::document",
                records = records.len(),
                "delivering against\n{}",
                self.debug_tree()
            );
        }

        let mut delivered = 0;
        for (id, scope, callback) in self.inner.observers.snapshot() {
            if !self.inner.observers.is_connected(id) {
                continue;
            }
            let relevant: Vec<MutationRecord> = {
                let document = self.inner.document.read();
                records
                    .iter()
                    .filter(|record| document.record_touches(scope, record))
                    .cloned()
                    .collect()
            };
            if relevant.is_empty() {
                continue;
            }
            tracing::trace!(target: "horizon_veil_core::document", observer = ?id, records = relevant.len(), "delivering mutations");
            callback(&relevant);
            delivered += 1;
        }
        delivered
    }
}

static_assertions::assert_impl_all!(SharedDocument: Send, Sync);
static_assertions::assert_impl_all!(Document: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(selector: &str) -> SelectorList {
        SelectorList::parse(selector).unwrap()
    }

    #[test]
    fn new_document_has_html_and_body() {
        let document = Document::new();
        assert_eq!(document.local_name(document.root()).unwrap(), "html");
        assert_eq!(document.local_name(document.body()).unwrap(), "body");
        assert_eq!(document.children(document.root()).unwrap(), &[document.body()]);
        assert_eq!(document.node_count(), 2);
        assert!(!document.has_pending_mutations());
    }

    #[test]
    fn append_and_insert_preserve_order() {
        let mut document = Document::new();
        let body = document.body();
        let a = document.create_element("div");
        let b = document.create_element("div");
        let c = document.create_element("div");

        document.append_child(body, a).unwrap();
        document.append_child(body, c).unwrap();
        document.insert_before(body, b, Some(c)).unwrap();

        assert_eq!(document.children(body).unwrap(), &[a, b, c]);
        assert_eq!(document.parent(b).unwrap(), Some(body));
    }

    #[test]
    fn moving_a_node_journals_removal_and_addition() {
        let mut document = Document::new();
        let body = document.body();
        let first = document.create_element("div");
        let second = document.create_element("div");
        let child = document.create_element("span");
        document.append_child(body, first).unwrap();
        document.append_child(body, second).unwrap();
        document.append_child(first, child).unwrap();
        document.take_records();

        document.append_child(second, child).unwrap();

        let records = document.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], MutationRecord::removed(first, child));
        assert_eq!(records[1], MutationRecord::added(second, child));
        assert!(document.children(first).unwrap().is_empty());
    }

    #[test]
    fn insertion_rejects_cycles_and_root() {
        let mut document = Document::new();
        let body = document.body();
        let outer = document.create_element("div");
        let inner = document.create_element("div");
        document.append_child(body, outer).unwrap();
        document.append_child(outer, inner).unwrap();

        assert_eq!(
            document.append_child(inner, outer),
            Err(DocumentError::HierarchyViolation)
        );
        assert_eq!(
            document.append_child(outer, outer),
            Err(DocumentError::HierarchyViolation)
        );
        assert_eq!(
            document.append_child(inner, document.root()),
            Err(DocumentError::RootMutation)
        );
        assert_eq!(
            document.insert_before(body, inner, Some(body)),
            Err(DocumentError::NotAChild)
        );
    }

    #[test]
    fn remove_child_requires_parent_relationship() {
        let mut document = Document::new();
        let body = document.body();
        let a = document.create_element("div");
        let b = document.create_element("div");
        document.append_child(body, a).unwrap();
        document.append_child(a, b).unwrap();

        assert_eq!(document.remove_child(body, b), Err(DocumentError::NotAChild));
        document.remove_child(a, b).unwrap();
        assert_eq!(document.parent(b).unwrap(), None);
        assert!(document.contains(b));
        assert!(!document.is_connected(b));
    }

    #[test]
    fn destroy_cascades() {
        let mut document = Document::new();
        let body = document.body();
        let a = document.create_element("div");
        let b = document.create_element("div");
        let c = document.create_element("div");
        document.append_child(body, a).unwrap();
        document.append_child(a, b).unwrap();
        document.append_child(b, c).unwrap();

        document.destroy(a).unwrap();

        assert!(!document.contains(a));
        assert!(!document.contains(b));
        assert!(!document.contains(c));
        assert!(document.children(body).unwrap().is_empty());
        assert_eq!(document.destroy(a), Err(DocumentError::InvalidNodeId));
        assert_eq!(document.destroy(body), Err(DocumentError::RootMutation));
    }

    #[test]
    fn ancestors_and_descendants() {
        let mut document = Document::new();
        let body = document.body();
        let a = document.create_element("div");
        let b = document.create_element("div");
        let c = document.create_element("div");
        document.append_child(body, a).unwrap();
        document.append_child(a, b).unwrap();
        document.append_child(body, c).unwrap();

        assert_eq!(document.ancestors(b).unwrap(), vec![a, body, document.root()]);
        assert_eq!(document.descendants(body).unwrap(), vec![a, b, c]);
        assert!(document.is_inclusive_ancestor(body, b));
        assert!(document.is_inclusive_ancestor(b, b));
        assert!(!document.is_inclusive_ancestor(c, b));
    }

    #[test]
    fn attributes_round_trip() {
        let mut document = Document::new();
        let node = document.create_element("div");

        assert_eq!(document.attribute(node, "aria-hidden").unwrap(), None);
        document.set_attribute(node, "aria-hidden", "false").unwrap();
        document.set_attribute(node, "aria-hidden", "true").unwrap();
        assert_eq!(document.attribute(node, "aria-hidden").unwrap(), Some("true"));
        assert_eq!(document.attributes(node).unwrap().len(), 1);

        assert_eq!(
            document.remove_attribute(node, "aria-hidden").unwrap(),
            Some("true".to_string())
        );
        assert_eq!(document.remove_attribute(node, "aria-hidden").unwrap(), None);
    }

    #[test]
    fn attribute_writes_are_not_journaled() {
        let mut document = Document::new();
        document.set_attribute(document.body(), "class", "x").unwrap();
        assert!(!document.has_pending_mutations());
    }

    #[test]
    fn selector_queries_are_scoped_and_ordered() {
        let mut document = Document::new();
        let body = document.body();
        let outer = document.create_element("section");
        let first = document.create_element("div");
        let second = document.create_element("div");
        let outside = document.create_element("div");
        document.set_attribute(first, "class", "item").unwrap();
        document.set_attribute(second, "class", "item").unwrap();
        document.set_attribute(outside, "class", "item").unwrap();
        document.append_child(body, outer).unwrap();
        document.append_child(outer, first).unwrap();
        document.append_child(outer, second).unwrap();
        document.append_child(body, outside).unwrap();

        let items = parse(".item");
        assert_eq!(
            document.query_selector_all(outer, &items).unwrap(),
            vec![first, second]
        );
        assert_eq!(
            document.query_selector_all(body, &items).unwrap(),
            vec![first, second, outside]
        );
        assert_eq!(document.query_selector(outer, &items).unwrap(), Some(first));
        // Scope is excluded, ancestors outside the scope still take part.
        assert_eq!(
            document.query_selector_all(outer, &parse("body .item")).unwrap(),
            vec![first, second]
        );
        assert!(document.query_selector_all(outer, &parse("section")).unwrap().is_empty());
    }

    #[test]
    fn element_by_id_ignores_detached() {
        let mut document = Document::new();
        let node = document.create_element("div");
        document.set_attribute(node, "id", "loose").unwrap();
        assert_eq!(document.element_by_id("loose"), None);

        document.append_child(document.body(), node).unwrap();
        assert_eq!(document.element_by_id("loose"), Some(node));
    }

    #[test]
    fn record_relevance() {
        let mut document = Document::new();
        let body = document.body();
        let scope = document.create_element("div");
        let inside = document.create_element("div");
        let outside = document.create_element("div");
        document.append_child(body, scope).unwrap();
        document.append_child(scope, inside).unwrap();
        document.append_child(body, outside).unwrap();

        assert!(document.record_touches(scope, &MutationRecord::added(inside, outside)));
        assert!(document.record_touches(scope, &MutationRecord::added(scope, inside)));
        assert!(!document.record_touches(scope, &MutationRecord::added(outside, inside)));
        assert!(!document.record_touches(scope, &MutationRecord::added(body, outside)));
        assert!(document.record_touches(inside, &MutationRecord::removed(body, scope)));
        assert!(document.record_touches(inside, &MutationRecord::added(body, scope)));
    }

    #[test]
    fn shared_document_delivers_once_per_cycle() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let document = SharedDocument::new();
        let body = document.body();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let seen_clone = Arc::clone(&seen);
        document.observe(body, move |records| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            seen_clone.fetch_add(records.len(), Ordering::SeqCst);
        });

        for _ in 0..3 {
            let node = document.create_element("div");
            document.append_child(body, node).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(document.has_pending_mutations());

        assert_eq!(document.deliver_mutations(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(document.deliver_mutations(), 0);
    }

    #[test]
    fn blocked_delivery_drops_records() {
        let document = SharedDocument::new();
        let body = document.body();
        document.observe(body, |_| panic!("delivery should be blocked"));
        document.set_delivery_blocked(true);

        let node = document.create_element("div");
        document.append_child(body, node).unwrap();

        assert_eq!(document.deliver_mutations(), 0);
        assert!(!document.has_pending_mutations());
    }

    #[test]
    fn debug_tree_shows_markers() {
        let document = SharedDocument::new();
        let node = document.create_element("div");
        document.set_attribute(node, "id", "uncle-1").unwrap();
        document.set_attribute(node, "aria-hidden", "true").unwrap();
        document.append_child(document.body(), node).unwrap();

        let tree = document.debug_tree();
        assert!(tree.starts_with("html\n"));
        assert!(tree.contains("div#uncle-1 [aria-hidden=\"true\"]"));
    }

    #[test]
    fn delivery_with_trace_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let document = SharedDocument::new();
            let body = document.body();
            document.observe(body, |records| assert_eq!(records.len(), 1));
            let node = document.create_element("div");
            document.append_child(body, node).unwrap();
            assert_eq!(document.deliver_mutations(), 1);
        });
    }
}
