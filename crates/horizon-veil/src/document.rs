//! Host implementation for [`SharedDocument`].

use horizon_veil_core::{DocumentError, NodeId, ObserverId, SharedDocument};
use horizon_veil_selector::SelectorList;

use crate::error::HostError;
use crate::host::{ChangeCallback, MarkerAccess, MutationSource, SelectorMatch, TreeAccess};

impl From<DocumentError> for HostError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidNodeId => Self::UnknownNode,
            other => Self::Rejected(other.to_string()),
        }
    }
}

impl TreeAccess for SharedDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        SharedDocument::root(self)
    }

    fn contains(&self, node: NodeId) -> bool {
        SharedDocument::contains(self, node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        SharedDocument::parent(self, node).ok().flatten()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        SharedDocument::children(self, node).unwrap_or_default()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        SharedDocument::is_connected(self, node)
    }
}

impl MarkerAccess for SharedDocument {
    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, HostError> {
        Ok(SharedDocument::attribute(self, node, name)?)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        Ok(SharedDocument::set_attribute(self, node, name, value)?)
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), HostError> {
        SharedDocument::remove_attribute(self, node, name)?;
        Ok(())
    }
}

impl SelectorMatch for SharedDocument {
    fn match_all(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.query_selector_all(scope, selectors).unwrap_or_default()
    }
}

impl MutationSource for SharedDocument {
    type Subscription = ObserverId;

    fn observe(&self, scope: NodeId, on_change: ChangeCallback) -> Option<ObserverId> {
        Some(SharedDocument::observe(self, scope, move |_records| on_change()))
    }

    fn unobserve(&self, subscription: ObserverId) {
        SharedDocument::unobserve(self, subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_veil_core::ElementSpec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn document_errors_map_to_host_errors() {
        assert_eq!(HostError::from(DocumentError::InvalidNodeId), HostError::UnknownNode);
        assert!(matches!(
            HostError::from(DocumentError::RootMutation),
            HostError::Rejected(_)
        ));
    }

    #[test]
    fn marker_access_on_destroyed_node_fails() {
        let document = SharedDocument::new();
        let node = document.create_element("div");
        document.destroy(node).unwrap();

        assert_eq!(
            MarkerAccess::set_attribute(&document, node, "aria-hidden", "true"),
            Err(HostError::UnknownNode)
        );
        assert!(TreeAccess::children(&document, node).is_empty());
    }

    #[test]
    fn observe_wraps_records_into_change_notifications() {
        let document = SharedDocument::new();
        let family = document
            .build(document.body(), ElementSpec::new("div").id("family"))
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let subscription = MutationSource::observe(
            &document,
            family,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let child = document.create_element("div");
        document.append_child(family, child).unwrap();
        document.deliver_mutations();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        MutationSource::unobserve(&document, subscription);
        document.append_child(family, document.create_element("div")).unwrap();
        document.deliver_mutations();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
