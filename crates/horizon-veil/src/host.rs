//! Host tree abstraction.
//!
//! The maintainer never owns a tree. It reads structure, resolves selectors,
//! writes one marker attribute and listens for child-list changes through the
//! traits in this module. [`SharedDocument`](horizon_veil_core::SharedDocument)
//! implements all of them; see [`crate::document`].
//!
//! # Key Traits
//!
//! - [`TreeAccess`] - Node identity and structure
//! - [`MarkerAccess`] - Attribute reads and writes
//! - [`SelectorMatch`] - Selector resolution
//! - [`MutationSource`] - Subtree change notification
//! - [`Host`] - Everything above, cloneable and thread-safe

use std::fmt::Debug;
use std::hash::Hash;

use horizon_veil_selector::SelectorList;

use crate::error::HostError;

/// Read access to the tree structure.
pub trait TreeAccess {
    /// Opaque node handle. Identity is `Eq + Hash`.
    type Node: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The absolute root of the tree.
    fn root(&self) -> Self::Node;

    /// Whether the node exists, attached or not.
    fn contains(&self, node: Self::Node) -> bool;

    /// The node's parent, or `None` for the root and detached subtree roots.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The node's children in order. Empty for unknown nodes.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether the node is attached under the root.
    fn is_connected(&self, node: Self::Node) -> bool;
}

/// Access to node attributes.
pub trait MarkerAccess: TreeAccess {
    /// Read an attribute.
    fn attribute(&self, node: Self::Node, name: &str) -> Result<Option<String>, HostError>;

    /// Write an attribute.
    fn set_attribute(&self, node: Self::Node, name: &str, value: &str) -> Result<(), HostError>;

    /// Remove an attribute. Removing an absent attribute is not an error.
    fn remove_attribute(&self, node: Self::Node, name: &str) -> Result<(), HostError>;
}

/// Selector resolution.
pub trait SelectorMatch: TreeAccess {
    /// Every descendant of `scope` matching the list, in document order.
    fn match_all(&self, scope: Self::Node, selectors: &SelectorList) -> Vec<Self::Node>;
}

/// Callback invoked when a subtree changed.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Subtree change notification.
pub trait MutationSource: TreeAccess {
    /// Handle returned by [`observe`](Self::observe).
    type Subscription: Send + Sync + 'static;

    /// Call `on_change` after descendants of `scope` are added or removed.
    ///
    /// Returns `None` when the host cannot observe mutations.
    fn observe(&self, scope: Self::Node, on_change: ChangeCallback) -> Option<Self::Subscription>;

    /// Stop a subscription.
    fn unobserve(&self, subscription: Self::Subscription);
}

/// A complete host: structure, markers, selectors and mutations.
///
/// Implemented automatically for every type providing the component traits.
pub trait Host:
    TreeAccess + MarkerAccess + SelectorMatch + MutationSource + Clone + Send + Sync + 'static
{
}

impl<T> Host for T where
    T: TreeAccess + MarkerAccess + SelectorMatch + MutationSource + Clone + Send + Sync + 'static
{
}
