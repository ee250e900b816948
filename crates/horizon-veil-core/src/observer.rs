//! Subtree mutation observers.
//!
//! An observer is a callback connected to a scope node. During a delivery
//! cycle it is invoked at most once, with every pending record that touched
//! its scope's subtree.
//!
//! # Key Types
//!
//! - [`ObserverId`] - Returned by [`ObserverSet::observe`], used to disconnect
//! - [`MutationCallback`] - The shared callback type
//!
//! # Example
//!
//! ```
//! use horizon_veil_core::SharedDocument;
//!
//! let document = SharedDocument::new();
//! let root = document.root();
//!
//! let id = document.observe(root, |records| {
//!     println!("{} child-list changes", records.len());
//! });
//!
//! let child = document.create_element("div");
//! document.append_child(root, child).unwrap();
//! assert_eq!(document.deliver_mutations(), 1);
//!
//! document.unobserve(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::document::NodeId;
use crate::mutation::MutationRecord;

new_key_type! {
    /// A unique identifier for an observer connection.
    ///
    /// The ID remains valid until the observer is disconnected.
    pub struct ObserverId;
}

/// Callback invoked with the records relevant to an observer's scope.
pub type MutationCallback = Arc<dyn Fn(&[MutationRecord]) + Send + Sync>;

/// Internal storage for a single observer.
struct Observer {
    /// The node whose subtree is observed.
    scope: NodeId,
    /// The callback to invoke (Arc-wrapped so delivery can run unlocked).
    callback: MutationCallback,
}

/// The table of connected observers.
pub struct ObserverSet {
    observers: Mutex<SlotMap<ObserverId, Observer>>,
    /// Whether delivery is temporarily blocked.
    blocked: AtomicBool,
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverSet {
    /// Create an empty observer set.
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a callback observing the subtree of `scope`.
    pub fn observe<F>(&self, scope: NodeId, callback: F) -> ObserverId
    where
        F: Fn(&[MutationRecord]) + Send + Sync + 'static,
    {
        let id = self.observers.lock().insert(Observer {
            scope,
            callback: Arc::new(callback),
        });
        tracing::trace!(target: "horizon_veil_core::observer", ?id, ?scope, "observer connected");
        id
    }

    /// Disconnect an observer.
    ///
    /// Returns `true` if the observer was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let removed = self.observers.lock().remove(id).is_some();
        tracing::trace!(target: "horizon_veil_core::observer", ?id, removed, "observer disconnected");
        removed
    }

    /// Disconnect every observer.
    pub fn disconnect_all(&self) {
        self.observers.lock().clear();
    }

    /// Check whether an observer is still connected.
    pub fn is_connected(&self, id: ObserverId) -> bool {
        self.observers.lock().contains_key(id)
    }

    /// Get the number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Block delivery temporarily.
    ///
    /// While blocked, delivery cycles discard their records.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if delivery is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Copy out the connected observers so callbacks can run without the lock.
    pub(crate) fn snapshot(&self) -> Vec<(ObserverId, NodeId, MutationCallback)> {
        self.observers
            .lock()
            .iter()
            .map(|(id, observer)| (id, observer.scope, Arc::clone(&observer.callback)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn scope() -> NodeId {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        keys.insert(())
    }

    #[test]
    fn observe_and_disconnect() {
        let set = ObserverSet::new();
        let id = set.observe(scope(), |_| {});

        assert_eq!(set.observer_count(), 1);
        assert!(set.is_connected(id));

        assert!(set.disconnect(id));
        assert!(!set.disconnect(id));
        assert!(!set.is_connected(id));
        assert_eq!(set.observer_count(), 0);
    }

    #[test]
    fn snapshot_shares_callbacks() {
        let set = ObserverSet::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        set.observe(scope(), move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let snapshot = set.snapshot();
        set.disconnect_all();
        (snapshot[0].2)(&[]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(set.observer_count(), 0);
    }

    #[test]
    fn blocking_flag() {
        let set = ObserverSet::new();
        assert!(!set.is_blocked());
        set.set_blocked(true);
        assert!(set.is_blocked());
    }
}
