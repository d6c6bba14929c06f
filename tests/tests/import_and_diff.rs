//! Bulk paths: structural import and server diffs, through a context.

use pagegraph_tests::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const FRAGMENT: &str = r#"{
    "vertexes": {
        "A": {"L": ["Button"], "P": {"text": "OK"}},
        "B": {"L": ["Label"], "P": {"text": "Confirm"}}
    },
    "edges": {
        "t": {"S": "A", "E": "B", "T": "labelledBy"}
    }
}"#;

// ========== TEST: an import reaches peers as ordinary primitives ==========
#[test]
fn test_import_is_broadcast() {
    init_tracing();

    // GIVEN
    let topic = SyncTopic::new("import-1");
    let mut peers = connected(&topic, &["host", "guest"], |c| c).unwrap();
    let mut guest = peers.pop().unwrap();
    let mut host = peers.pop().unwrap();
    let fragment = Fragment::from_json(FRAGMENT).unwrap();

    // WHEN
    let outcome = host.import(&fragment, &BTreeMap::new(), None).unwrap();
    let stats = guest.receive();

    // THEN
    assert!(outcome.created_container);
    assert_eq!(outcome.roots.len(), 1);
    assert_eq!(host.graph().vertex_count(), 3);
    assert_eq!(host.graph().edge_count(), 2);
    assert_eq!(stats.applied, 5);
    assert!(stats.rejected.is_empty());
    assert_eq!(guest.graph().snapshot(), host.graph().snapshot());
}

// ========== TEST: a whole import reverts as one transaction ==========
#[test]
fn test_import_reverts_in_one_call() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("solo"));
    let fragment = Fragment::from_json(FRAGMENT).unwrap();
    let outcome = ctx.import(&fragment, &BTreeMap::new(), None).unwrap();
    assert_eq!(ctx.log().len(outcome.txn_id), 5);

    // WHEN
    let reverted = ctx
        .revert_transaction_up_to_index(outcome.txn_id, -1)
        .unwrap();

    // THEN
    assert_eq!(reverted, 5);
    assert!(ctx.graph().is_empty());
}

// ========== TEST: commit, confirm server ids, converge on the server diff ==========
#[test]
fn test_commit_confirm_and_apply_server_diff() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    let txn = ctx.begin_transaction();
    ctx.create_vertex(txn, labeled("-1", "Page", props! { "key" => "Home" }))
        .unwrap();
    ctx.create_vertex(txn, labeled("-2", "Block", Props::new()))
        .unwrap();
    ctx.create_edge(txn, Edge::new("-3", "-1", "-2", "child", Props::new()))
        .unwrap();

    // WHEN the diff goes out
    let diff = ctx.commit(txn).unwrap();

    // THEN it carries every new entity, detached
    assert_eq!(diff.vertexes.len(), 2);
    assert_eq!(diff.edges.len(), 1);
    assert!(diff.vertexes[&VertexId::new("-1")].outs.is_empty());

    // WHEN the server answers with confirmed ids
    let renamed = ctx
        .confirm_ids([("-1", "p1"), ("-2", "b1"), ("-3", "e1")])
        .unwrap();

    // THEN every stored entity is re-keyed
    assert_eq!(renamed, 3);
    let edge = ctx.graph().get_edge(&EdgeId::new("e1")).unwrap().clone();
    assert_eq!(edge.start, VertexId::new("p1"));
    assert_eq!(edge.end, VertexId::new("b1"));

    // WHEN the server's authoritative state is applied
    let mut server = TxnDiff::new();
    server.vertexes.insert(
        VertexId::new("p1"),
        labeled("p1", "Page", props! { "key" => "Home", "createdAt" => 100 }),
    );
    server
        .vertexes
        .insert(VertexId::new("b1"), labeled("b1", "Block", Props::new()));
    server.edges.insert(EdgeId::new("e1"), edge);
    server.deleted_vertexes.push(VertexId::new("never-synced"));
    let next = ctx.remove_txn_id_and_create_new(txn);
    let report = ctx.apply_diff(next, &server, DiffOptions::default()).unwrap();

    // THEN only the page changed
    assert_eq!(report.updated_vertexes, vec![VertexId::new("p1")]);
    assert_eq!(report.changes(), 1);
    assert_eq!(report.unchanged, 3);
    let page = ctx.graph().get_vertex(&VertexId::new("p1")).unwrap();
    assert_eq!(page.get_prop("createdAt"), Some(&Value::from(100)));
    assert_eq!(ctx.log().len(next), 1);
    assert!(ctx.log().records(txn).is_none());
}

// ========== TEST: provisional ids keep working after confirmation ==========
#[test]
fn test_provisional_ids_resolve_after_confirmation() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    let txn = ctx.begin_transaction();
    let page = ctx.next_vertex_id();
    let block = ctx.next_vertex_id();
    ctx.create_vertex(txn, labeled(page.as_str(), "Page", Props::new()))
        .unwrap();
    ctx.confirm_ids([(page.as_str(), "p1")]).unwrap();

    // WHEN an edge still names the provisional id
    let edge_id = ctx.next_edge_id();
    ctx.create_vertex(txn, labeled(block.as_str(), "Block", Props::new()))
        .unwrap();
    ctx.create_edge(
        txn,
        Edge::new(edge_id.as_str(), page.as_str(), block.as_str(), "child", Props::new()),
    )
    .unwrap();

    // THEN it lands on the confirmed vertex
    let stored = ctx.graph().get_edge(&edge_id).unwrap();
    assert_eq!(stored.start, VertexId::new("p1"));
    assert_ne!(page, block);
}

// ========== TEST: id strings inside props are rewritten ==========
#[test]
fn test_props_referencing_provisional_ids_are_rewritten() {
    // GIVEN
    let mut ctx = GraphContext::new(ContextConfig::new("editor"));
    ctx.create_vertex(TxnId::UNTRACKED, labeled("-1", "Page", Props::new()))
        .unwrap();
    ctx.confirm_ids([("-1", "p1")]).unwrap();

    // WHEN
    ctx.create_vertex(
        TxnId::UNTRACKED,
        labeled("-2", "Link", props! { "target" => "-1" }),
    )
    .unwrap();

    // THEN
    let link = ctx.graph().get_vertex(&VertexId::new("-2")).unwrap();
    assert_eq!(link.get_prop("target"), Some(&Value::from("p1")));
}
