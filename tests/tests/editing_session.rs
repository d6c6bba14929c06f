//! A single editor's session: primitives, undo and change notification.

use pagegraph_tests::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

// ========== TEST: create, merge, revert the whole transaction ==========
#[test]
fn test_create_merge_revert() {
    init_tracing();

    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    let txn = TxnId::new(5);

    // WHEN
    let created = ctx
        .create_vertex(txn, labeled("-1", "Page", props! { "key" => "Home" }))
        .unwrap();
    let merged = ctx
        .merge_vertex_properties(txn, &VertexId::new("-1"), props! { "key" => "Home2" })
        .unwrap();

    // THEN
    assert_eq!(created.txn_detail_index, Some(0));
    assert_eq!(merged.txn_detail_index, Some(1));
    let page = ctx.graph().get_vertex(&VertexId::new("-1")).unwrap();
    assert_eq!(page.get_prop("key"), Some(&Value::from("Home2")));
    let records = ctx.log().records(txn).unwrap();
    assert_eq!(records[1].original_data(), json!({ "P": { "key": "Home" } }));

    // WHEN
    ctx.revert_transaction_up_to_index(txn, -1).unwrap();

    // THEN
    assert!(!ctx.graph().contains_vertex(&VertexId::new("-1")));
    assert!(!ctx.graph().label_contains("Page", &VertexId::new("-1")));
}

// ========== TEST: merge touches only the supplied keys ==========
#[test]
fn test_merge_keeps_other_keys() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    ctx.create_vertex(
        TxnId::UNTRACKED,
        labeled("p", "Page", props! { "key" => "Home", "title" => "Welcome" }),
    )
    .unwrap();

    // WHEN
    ctx.merge_vertex_properties(TxnId::UNTRACKED, &VertexId::new("p"), props! { "key" => "Start" })
        .unwrap();

    // THEN
    let page = ctx.graph().get_vertex(&VertexId::new("p")).unwrap();
    assert_eq!(page.props, props! { "key" => "Start", "title" => "Welcome" });
}

// ========== TEST: a vertex with edges must be detached before deletion ==========
#[test]
fn test_delete_requires_detached_vertex() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    let txn = ctx.begin_transaction();
    ctx.create_vertex(txn, labeled("p", "Page", Props::new())).unwrap();
    ctx.create_vertex(txn, labeled("b", "Block", Props::new())).unwrap();
    ctx.create_edge(txn, Edge::new("e", "p", "b", "child", Props::new()))
        .unwrap();

    // WHEN
    let blocked_parent = ctx.delete_vertex(txn, &VertexId::new("p"));
    let blocked_child = ctx.delete_vertex(txn, &VertexId::new("b"));

    // THEN
    assert!(matches!(
        blocked_parent,
        Err(SessionError::Mutation(MutationError::HasChildren { .. }))
    ));
    assert!(matches!(
        blocked_child,
        Err(SessionError::Mutation(MutationError::HasParents { .. }))
    ));
    assert_eq!(ctx.log().len(txn), 3);

    // WHEN the edge goes first
    ctx.delete_edge(txn, &EdgeId::new("e")).unwrap();
    ctx.delete_vertex(txn, &VertexId::new("b")).unwrap();

    // THEN
    let page = ctx.graph().get_vertex(&VertexId::new("p")).unwrap();
    assert!(page.out_of_type("child").is_empty());
    assert!(!ctx.graph().contains_vertex(&VertexId::new("b")));

    // AND reverting back to the first two records brings the pair back unlinked
    ctx.revert_transaction_up_to_index(txn, 1).unwrap();
    assert_eq!(ctx.graph().vertex_count(), 2);
    assert_eq!(ctx.graph().edge_count(), 0);
}

// ========== TEST: a burst of peer operations notifies once ==========
#[test]
fn test_receive_notifies_once() {
    // GIVEN
    let topic = SyncTopic::new("burst");
    let mut peers = connected(&topic, &["host", "guest"], |c| c).unwrap();
    let mut guest = peers.pop().unwrap();
    let mut host = peers.pop().unwrap();
    for i in 0..5 {
        host.create_vertex(TxnId::UNTRACKED, labeled(&format!("v{i}"), "Block", Props::new()))
            .unwrap();
    }
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    guest.subscribe(move |_| seen.set(seen.get() + 1));

    // WHEN
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.applied, 5);
    assert_eq!(calls.get(), 1);
    assert_eq!(guest.revision(&StorePath::Label("Block".into())), 5);
}

// ========== TEST: unknown transactions and bad indices are state errors ==========
#[test]
fn test_revert_rejects_bad_requests() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    let txn = ctx.begin_transaction();
    ctx.create_vertex(txn, labeled("p", "Page", Props::new())).unwrap();

    // WHEN
    let unknown = ctx.revert_transaction_up_to_index(TxnId::new(999), -1);
    let below = ctx.revert_transaction_up_to_index(txn, -2);

    // THEN
    assert!(unknown.is_err());
    assert!(below.is_err());
    assert!(ctx.graph().contains_vertex(&VertexId::new("p")));
    assert_eq!(ctx.log().len(txn), 1);
}
