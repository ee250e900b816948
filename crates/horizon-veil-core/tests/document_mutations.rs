//! Integration tests for mutation delivery on shared documents.

use std::sync::Arc;

use horizon_veil_core::{ElementSpec, MutationRecord, NodeId, SharedDocument};
use parking_lot::Mutex;

fn setup() -> (SharedDocument, NodeId, NodeId) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();

    let document = SharedDocument::new();
    let family = document
        .build(
            document.body(),
            ElementSpec::new("div").id("family").children([
                ElementSpec::new("div").id("parent").child(ElementSpec::new("div").id("target")),
                ElementSpec::new("div").id("uncle"),
            ]),
        )
        .unwrap();
    let unrelated = document
        .build(document.body(), ElementSpec::new("div").id("unrelated"))
        .unwrap();
    document.deliver_mutations();
    (document, family, unrelated)
}

fn recorder(document: &SharedDocument, scope: NodeId) -> Arc<Mutex<Vec<Vec<MutationRecord>>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    document.observe(scope, move |records| sink.lock().push(records.to_vec()));
    log
}

#[test]
fn observers_only_see_their_subtree() {
    let (document, family, unrelated) = setup();
    let family_log = recorder(&document, family);
    let unrelated_log = recorder(&document, unrelated);

    let parent = document.element_by_id("parent").unwrap();
    let node = document.create_element("div");
    document.append_child(parent, node).unwrap();

    assert_eq!(document.deliver_mutations(), 1);
    assert_eq!(family_log.lock().len(), 1);
    assert_eq!(family_log.lock()[0], vec![MutationRecord::added(parent, node)]);
    assert!(unrelated_log.lock().is_empty());
}

#[test]
fn bursts_are_coalesced_into_one_callback() {
    let (document, family, _) = setup();
    let log = recorder(&document, family);

    let uncle = document.element_by_id("uncle").unwrap();
    let a = document.create_element("div");
    let b = document.create_element("div");
    document.append_child(family, a).unwrap();
    document.append_child(uncle, b).unwrap();
    document.remove_child(family, a).unwrap();

    document.deliver_mutations();
    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].len(), 3);
}

#[test]
fn removing_an_ancestor_of_the_scope_notifies() {
    let (document, family, _) = setup();
    let parent = document.element_by_id("parent").unwrap();
    let log = recorder(&document, parent);

    document.detach(family).unwrap();

    assert_eq!(document.deliver_mutations(), 1);
    assert!(!document.is_connected(parent));
    assert_eq!(log.lock()[0][0].removed, vec![family]);
}

#[test]
fn destroying_the_scope_notifies() {
    let (document, family, _) = setup();
    let parent = document.element_by_id("parent").unwrap();
    let log = recorder(&document, parent);

    document.destroy(family).unwrap();

    assert_eq!(document.deliver_mutations(), 1);
    assert!(!document.contains(parent));
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn unobserve_stops_delivery_within_a_cycle() {
    let (document, family, _) = setup();
    let second_log = Arc::new(Mutex::new(0usize));

    // The first observer disconnects the second before it runs.
    let slot: Arc<Mutex<Option<horizon_veil_core::ObserverId>>> = Arc::new(Mutex::new(None));
    let slot_for_first = Arc::clone(&slot);
    let doc_for_first = document.clone();
    document.observe(family, move |_| {
        if let Some(id) = slot_for_first.lock().take() {
            doc_for_first.unobserve(id);
        }
    });
    let counter = Arc::clone(&second_log);
    let second = document.observe(family, move |_| *counter.lock() += 1);
    *slot.lock() = Some(second);

    let node = document.create_element("div");
    document.append_child(family, node).unwrap();

    assert_eq!(document.deliver_mutations(), 1);
    assert_eq!(*second_log.lock(), 0);
    assert_eq!(document.observer_count(), 1);
}

#[test]
fn callbacks_may_mutate_and_see_changes_next_cycle() {
    let (document, family, _) = setup();
    let doc = document.clone();
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    document.observe(family, move |_| {
        let mut calls = counter.lock();
        *calls += 1;
        if *calls == 1 {
            let extra = doc.create_element("span");
            doc.append_child(family, extra).unwrap();
        }
    });

    let node = document.create_element("div");
    document.append_child(family, node).unwrap();

    document.deliver_mutations();
    assert_eq!(*calls.lock(), 1);
    assert!(document.has_pending_mutations());

    document.deliver_mutations();
    assert_eq!(*calls.lock(), 2);
    assert!(!document.has_pending_mutations());
}
