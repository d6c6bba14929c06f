//! Contexts sharing one graph over a topic.

use pagegraph_core::Classify;
use pagegraph_core::ErrorClass;
use pagegraph_tests::prelude::*;
use pretty_assertions::assert_eq;

fn host_and_guest(topic: &SyncTopic) -> (GraphContext, GraphContext) {
    let mut peers = connected(topic, &["host", "guest"], |c| c).unwrap();
    let guest = peers.pop().unwrap();
    let host = peers.pop().unwrap();
    (host, guest)
}

// ========== TEST: local op reaches the peer, never echoes back ==========
#[test]
fn test_local_op_applies_once_on_each_side() {
    init_tracing();

    // GIVEN
    let topic = SyncTopic::new("session-1");
    let (mut host, mut guest) = host_and_guest(&topic);
    host.receive();
    let txn = host.begin_transaction();

    // WHEN
    host.create_vertex(txn, labeled("-1", "Page", props! { "key" => "Home" }))
        .unwrap();
    host.merge_vertex_properties(txn, &VertexId::new("-1"), props! { "key" => "Home2" })
        .unwrap();
    let received = guest.receive();
    let echoed = host.receive();

    // THEN
    assert_eq!(received.applied, 2);
    assert_eq!(echoed.total(), 0);
    assert_eq!(host.graph().snapshot(), guest.graph().snapshot());
    assert_eq!(host.log().len(txn), 2);
    assert!(guest.log().records(txn).is_none());
}

// ========== TEST: remote ops can be logged on request ==========
#[test]
fn test_remote_ops_logged_when_configured() {
    // GIVEN
    let topic = SyncTopic::new("session-logged");
    let mut peers = connected(&topic, &["host", "guest"], |c| c.with_log_remote_ops(true)).unwrap();
    let mut guest = peers.pop().unwrap();
    let mut host = peers.pop().unwrap();
    let txn = host.begin_transaction();

    // WHEN
    host.create_vertex(txn, labeled("v", "Block", Props::new())).unwrap();
    guest.receive();

    // THEN
    assert_eq!(guest.log().len(txn), 1);
}

// ========== TEST: late joiner adopts a snapshot ==========
#[test]
fn test_empty_joiner_adopts_snapshot() {
    // GIVEN
    let topic = SyncTopic::new("session-2");
    let mut host = GraphContext::new(ContextConfig::new("host"));
    host.create_vertex(TxnId::UNTRACKED, labeled("p", "Page", props! { "key" => "Home" }))
        .unwrap();
    host.create_vertex(TxnId::UNTRACKED, labeled("b", "Block", Props::new()))
        .unwrap();
    host.create_edge(TxnId::UNTRACKED, Edge::new("e", "p", "b", "child", Props::new()))
        .unwrap();
    host.connect(&topic).unwrap();

    // WHEN
    let mut guest = GraphContext::new(ContextConfig::new("guest"));
    guest.connect(&topic).unwrap();
    let served = host.receive();
    let adopted = guest.receive();

    // THEN
    assert_eq!(served.snapshots_sent, 1);
    assert_eq!(adopted.snapshots_adopted, 1);
    assert_eq!(guest.graph().snapshot(), host.graph().snapshot());
    assert!(guest.graph().label_contains("Page", &VertexId::new("p")));

    // AND a second snapshot is ignored
    host.send_snapshot(guest.peer_id()).unwrap();
    assert_eq!(guest.receive().snapshots_ignored, 1);
}

// ========== TEST: populated joiner offers its snapshot ==========
#[test]
fn test_populated_joiner_offers_snapshot() {
    // GIVEN
    let topic = SyncTopic::new("session-3");
    let mut guest = GraphContext::new(ContextConfig::new("guest"));
    guest.connect(&topic).unwrap();
    let mut host = GraphContext::new(ContextConfig::new("host"));
    host.create_vertex(TxnId::UNTRACKED, labeled("p", "Page", Props::new()))
        .unwrap();

    // WHEN
    host.connect(&topic).unwrap();
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.snapshots_adopted, 1);
    assert!(guest.graph().contains_vertex(&VertexId::new("p")));
}

// ========== TEST: replayed delivery is idempotent ==========
#[test]
fn test_duplicate_delivery_is_ignored() {
    // GIVEN
    let topic = SyncTopic::new("session-4");
    let (_host, mut guest) = host_and_guest(&topic);
    let editor = topic.join(PeerId::new("editor")).unwrap();
    let message = SyncMessage::AddNewVertex {
        txn_id: TxnId::new(1),
        vertex: labeled("v", "Block", Props::new()),
    };

    // WHEN
    editor.publish(&message, None);
    editor.publish(&message, None);
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.duplicates, 1);
    assert!(stats.rejected.is_empty());
    assert_eq!(guest.graph().vertex_count(), 1);
}

// ========== TEST: malformed payloads are dropped and counted ==========
#[test]
fn test_malformed_payload_is_counted() {
    // GIVEN
    let topic = SyncTopic::new("session-5");
    let (_host, mut guest) = host_and_guest(&topic);
    let editor = topic.join(PeerId::new("editor")).unwrap();

    // WHEN
    editor.publish_raw("{not json", None);
    editor.publish_raw(r#"{"sender": "editor", "message": {"explode": {}}}"#, None);
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.malformed, 2);
    assert!(guest.graph().is_empty());
}

// ========== TEST: revert is broadcast so peers converge ==========
#[test]
fn test_revert_converges_peer() {
    // GIVEN
    let topic = SyncTopic::new("session-6");
    let (mut host, mut guest) = host_and_guest(&topic);
    host.create_vertex(TxnId::UNTRACKED, labeled("p", "Page", props! { "title" => "Keep" }))
        .unwrap();
    let txn = host.begin_transaction();
    host.create_vertex(txn, labeled("b", "Block", Props::new())).unwrap();
    host.create_edge(txn, Edge::new("e", "p", "b", "child", Props::new()))
        .unwrap();
    host.merge_vertex_properties(txn, &VertexId::new("p"), props! { "title" => "Changed" })
        .unwrap();
    guest.receive();
    let before_txn = {
        let mut g = Graph::new();
        g.insert_vertex(labeled("p", "Page", props! { "title" => "Keep" }))
            .unwrap();
        g.snapshot()
    };

    // WHEN
    host.revert_transaction_up_to_index(txn, -1).unwrap();
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.applied, 3);
    assert_eq!(host.graph().snapshot(), before_txn);
    assert_eq!(guest.graph().snapshot(), before_txn);
}

// ========== TEST: id confirmation reaches peers ==========
#[test]
fn test_confirmed_ids_propagate() {
    // GIVEN
    let topic = SyncTopic::new("session-7");
    let (mut host, mut guest) = host_and_guest(&topic);
    let txn = host.begin_transaction();
    host.create_vertex(txn, labeled("-1", "Page", Props::new())).unwrap();
    guest.receive();

    // WHEN
    host.confirm_ids([("-1", "page-17")]).unwrap();
    host.merge_vertex_properties(txn, &VertexId::new("-1"), props! { "key" => "Home" })
        .unwrap();
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.applied, 2);
    let vertex = guest.graph().get_vertex(&VertexId::new("page-17")).unwrap();
    assert_eq!(vertex.get_prop("key"), Some(&Value::from("Home")));
    assert_eq!(guest.ids().resolve("-1"), "page-17");
}

// ========== TEST: structural conflicts error instead of reconciling ==========
#[test]
fn test_delete_racing_replace_is_rejected() {
    // GIVEN
    let topic = SyncTopic::new("session-8");
    let (mut host, mut guest) = host_and_guest(&topic);
    host.receive();
    host.create_vertex(TxnId::UNTRACKED, labeled("v", "Block", props! { "n" => 1 }))
        .unwrap();
    guest.receive();

    // WHEN both edit before hearing from the other
    guest.delete_vertex(TxnId::new(1), &VertexId::new("v")).unwrap();
    host.replace_vertex_properties(TxnId::new(2), &VertexId::new("v"), props! { "n" => 2 })
        .unwrap();
    let at_host = host.receive();
    let at_guest = guest.receive();

    // THEN
    assert_eq!(at_host.applied, 1);
    assert_eq!(at_guest.rejected.len(), 1);
    let (sender, error) = &at_guest.rejected[0];
    assert_eq!(sender, &PeerId::new("host"));
    assert_eq!(error, &MutationError::NotFound(VertexId::new("v")));
    assert_eq!(error.class(), ErrorClass::Referential);
    assert!(host.graph().is_empty());
    assert!(guest.graph().is_empty());
}

// ========== TEST: relaying peers never send an op back to its sender ==========
#[test]
fn test_relay_does_not_loop() {
    // GIVEN
    let topic = SyncTopic::new("session-9");
    let mut peers = connected(&topic, &["a", "b", "c"], |c| c.with_relay_remote_ops(true)).unwrap();

    // WHEN
    peers[0]
        .create_vertex(TxnId::UNTRACKED, labeled("v", "Block", Props::new()))
        .unwrap();
    let at_b = peers[1].receive();
    let at_c = peers[2].receive();
    let at_b_again = peers[1].receive();
    let at_a = peers[0].receive();

    // THEN
    assert_eq!(at_b.applied, 1);
    assert_eq!((at_c.applied, at_c.duplicates), (1, 1));
    assert_eq!(at_b_again.duplicates, 1);
    assert_eq!(at_a.total(), 0);
}

// ========== TEST: relayed non-create ops are applied once and die out ==========
#[test]
fn test_relayed_merge_applies_once_per_peer() {
    // GIVEN three relaying peers that share a vertex
    let topic = SyncTopic::new("session-relay-merge");
    let mut peers = connected(&topic, &["a", "b", "c"], |c| c.with_relay_remote_ops(true)).unwrap();
    peers[0]
        .create_vertex(TxnId::UNTRACKED, labeled("v", "Block", props! { "n" => 0 }))
        .unwrap();
    settle(&mut peers);

    // WHEN a merges and everyone keeps receiving
    peers[0]
        .merge_vertex_properties(TxnId::UNTRACKED, &VertexId::new("v"), props! { "n" => 1 })
        .unwrap();
    let mut applied = [0usize; 3];
    let mut last_round = 0;
    for _ in 0..20 {
        last_round = 0;
        for (i, peer) in peers.iter_mut().enumerate() {
            let stats = peer.receive();
            assert!(stats.rejected.is_empty());
            applied[i] += stats.applied;
            last_round += stats.total();
        }
    }

    // THEN
    assert_eq!(applied, [0, 1, 1]);
    assert_eq!(last_round, 0);
    for peer in &peers[1..] {
        assert_eq!(peer.graph().snapshot(), peers[0].graph().snapshot());
    }
}

// ========== TEST: ops sent before the snapshot do not block adoption ==========
#[test]
fn test_joiner_adopts_snapshot_after_early_op() {
    // GIVEN a populated host and an empty guest that has asked for a snapshot
    let topic = SyncTopic::new("session-early-op");
    let mut host = GraphContext::new(ContextConfig::new("host"));
    host.create_vertex(TxnId::UNTRACKED, labeled("p", "Page", Props::new()))
        .unwrap();
    host.connect(&topic).unwrap();
    let mut guest = GraphContext::new(ContextConfig::new("guest"));
    guest.connect(&topic).unwrap();
    assert!(guest.is_awaiting_snapshot());

    // WHEN the host edits before answering the request
    host.create_vertex(TxnId::UNTRACKED, labeled("q", "Block", Props::new()))
        .unwrap();
    let served = host.receive();
    let stats = guest.receive();

    // THEN the snapshot wins and the earlier op is not applied twice
    assert_eq!(served.snapshots_sent, 1);
    assert_eq!(stats.held, 1);
    assert_eq!(stats.snapshots_adopted, 1);
    assert_eq!(stats.superseded, 1);
    assert_eq!(stats.applied, 0);
    assert!(!guest.is_awaiting_snapshot());
    assert_eq!(guest.graph().snapshot(), host.graph().snapshot());
    assert!(guest.graph().contains_vertex(&VertexId::new("p")));
}

// ========== TEST: held ops from other peers replay after adoption ==========
#[test]
fn test_held_ops_from_third_peer_replay() {
    // GIVEN
    let topic = SyncTopic::new("session-held");
    let mut host = GraphContext::new(ContextConfig::new("host"));
    host.create_vertex(TxnId::UNTRACKED, labeled("p", "Page", Props::new()))
        .unwrap();
    host.connect(&topic).unwrap();
    let mut guest = GraphContext::new(ContextConfig::new("guest"));
    guest.connect(&topic).unwrap();
    let editor = topic.join(PeerId::new("editor")).unwrap();

    // WHEN another peer publishes before the host answers
    editor.publish(
        &SyncMessage::AddNewVertex {
            txn_id: TxnId::new(4),
            vertex: labeled("r", "Block", Props::new()),
        },
        None,
    );
    host.receive();
    let stats = guest.receive();

    // THEN
    assert_eq!(stats.held, 1);
    assert_eq!(stats.snapshots_adopted, 1);
    assert_eq!(stats.applied, 1);
    assert!(guest.graph().contains_vertex(&VertexId::new("p")));
    assert!(guest.graph().contains_vertex(&VertexId::new("r")));
}

// ========== TEST: hub hands out one topic per session ==========
#[test]
fn test_hub_topics_are_isolated() {
    // GIVEN
    let hub = pagegraph_sync::BroadcastHub::new();
    let mut first = connected(&hub.topic("one"), &["x", "y"], |c| c).unwrap();
    let mut second = connected(&hub.topic("two"), &["x", "y"], |c| c).unwrap();

    // WHEN
    first[0]
        .create_vertex(TxnId::UNTRACKED, labeled("v", "Block", Props::new()))
        .unwrap();

    // THEN
    assert_eq!(first[1].receive().applied, 1);
    assert_eq!(second[1].receive().applied, 0);
}
