use parley_core::{SignalKind, SignalMessage};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{SIGNAL_TIMEOUT_MS, candidate_from, offer_from, peer, room, settle, wait_for_kind};

#[tokio::test]
async fn test_malformed_candidate_discarded() {
    init_tracing();

    let mut bob = create_test_peer("bob");

    bob.inbound_tx
        .send(offer_from("alice"))
        .await
        .expect("Registry gone");
    wait_for_kind(&mut bob.outbound_rx, SignalKind::Answer, SIGNAL_TIMEOUT_MS)
        .await
        .expect("No answer produced");

    // Unparseable payload: the single message dies, the session does not.
    bob.inbound_tx
        .send(SignalMessage::candidate(
            room(),
            "this is not json".into(),
            peer("alice"),
            peer("bob"),
        ))
        .await
        .expect("Registry gone");
    settle().await;

    let engine = bob.engines.engine_for(&peer("alice")).await.expect("Engine");
    assert!(engine.added_candidates().await.is_empty());
    assert_eq!(bob.registry.session_count(), 1);

    // A well-formed candidate still goes through afterwards.
    bob.inbound_tx
        .send(candidate_from("alice", 1))
        .await
        .expect("Registry gone");
    settle().await;
    assert_eq!(engine.added_candidates().await, vec!["candidate:1"]);
}
