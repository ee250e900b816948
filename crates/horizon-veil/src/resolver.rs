//! Path resolution: which nodes must be hidden.
//!
//! For every target, the resolver walks from the target up to the context.
//! The nodes visited form the path set. Every child of a non-target path
//! node that is not itself on a path must be hidden.
//!
//! ```text
//! family                 context
//! ├── parent             path
//! │   ├── target         target
//! │   └── sibling        hidden
//! └── uncle-2            hidden
//!     └── cousin-2       untouched (inside a hidden subtree)
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use crate::config::ContextScope;
use crate::host::TreeAccess;

/// The outcome of one resolution pass.
#[derive(Debug, Clone)]
pub struct Resolution<N> {
    /// Targets that lie under the context and are not covered by another
    /// target, in input order.
    pub targets: Vec<N>,
    /// Nodes on any context-to-target path, context and targets inclusive.
    pub path: HashSet<N>,
    /// Nodes that must carry the hidden marker.
    pub must_hide: HashSet<N>,
}

impl<N: Eq + Hash> PartialEq for Resolution<N> {
    fn eq(&self, other: &Self) -> bool {
        self.targets == other.targets && self.path == other.path && self.must_hide == other.must_hide
    }
}

impl<N: Eq + Hash> Eq for Resolution<N> {}

impl<N> Default for Resolution<N> {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            path: HashSet::new(),
            must_hide: HashSet::new(),
        }
    }
}

/// Compute the path and must-hide sets for `targets` under `context`.
///
/// Targets outside the context and targets lying beneath another target
/// contribute nothing. With [`ContextScope::Document`] the siblings along
/// the path from the tree root down to the context are hidden too, as long
/// as at least one target resolved. A sibling that is a target, or holds
/// one, stays visible.
#[tracing::instrument(skip(tree, targets), target = "horizon_veil::resolver", level = "trace")]
pub fn resolve_paths<T>(
    tree: &T,
    context: T::Node,
    targets: &[T::Node],
    scope: ContextScope,
) -> Resolution<T::Node>
where
    T: TreeAccess + ?Sized,
{
    let target_set: HashSet<T::Node> = targets.iter().copied().collect();
    let mut resolution = Resolution::default();

    for &target in targets {
        if let Some(chain) = path_to_context(tree, context, target, &target_set) {
            resolution.path.extend(chain);
            resolution.targets.push(target);
        } else {
            tracing::trace!(target: "horizon_veil::resolver", node = ?target, "target contributes nothing");
        }
    }

    if resolution.targets.is_empty() {
        return resolution;
    }

    for &node in &resolution.path {
        if target_set.contains(&node) {
            continue;
        }
        for child in tree.children(node) {
            if !resolution.path.contains(&child) {
                resolution.must_hide.insert(child);
            }
        }
    }

    if scope == ContextScope::Document {
        let holders = target_holders(tree, targets);
        let mut current = context;
        while let Some(parent) = tree.parent(current) {
            resolution.path.insert(parent);
            for sibling in tree.children(parent) {
                if sibling != current && !holders.contains(&sibling) {
                    resolution.must_hide.insert(sibling);
                }
            }
            current = parent;
        }
    }

    tracing::trace!(
        target: "horizon_veil::resolver",
        targets = resolution.targets.len(),
        path = resolution.path.len(),
        must_hide = resolution.must_hide.len(),
        "resolved"
    );
    resolution
}

/// Every target together with all of its ancestors.
fn target_holders<T>(tree: &T, targets: &[T::Node]) -> HashSet<T::Node>
where
    T: TreeAccess + ?Sized,
{
    let mut holders = HashSet::new();
    for &target in targets {
        let mut current = Some(target);
        while let Some(node) = current {
            if !holders.insert(node) {
                break;
            }
            current = tree.parent(node);
        }
    }
    holders
}

/// Walk from `target` up to `context`.
///
/// Returns `None` when the walk leaves the tree without meeting the context,
/// or meets another target first.
fn path_to_context<T>(
    tree: &T,
    context: T::Node,
    target: T::Node,
    targets: &HashSet<T::Node>,
) -> Option<Vec<T::Node>>
where
    T: TreeAccess + ?Sized,
{
    let mut chain = vec![target];
    let mut current = target;
    while current != context {
        let parent = tree.parent(current)?;
        if targets.contains(&parent) {
            return None;
        }
        chain.push(parent);
        current = parent;
    }
    Some(chain)
}
