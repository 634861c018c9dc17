use parley_core::SignalKind;

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{
    SIGNAL_TIMEOUT_MS, answer_from, candidate_from, peer, settle, wait_for_kind,
};

#[tokio::test]
async fn test_candidate_buffering_order() {
    init_tracing();

    let mut alice = create_test_peer("alice");

    let session = alice
        .registry
        .create_outbound_session(peer("bob"))
        .await
        .expect("Session for bob");
    session.request_offer().await;
    wait_for_kind(&mut alice.outbound_rx, SignalKind::Offer, SIGNAL_TIMEOUT_MS)
        .await
        .expect("No offer sent");

    // Candidates race ahead of the answer; the engine must not see them yet.
    for n in 1..=3 {
        alice
            .inbound_tx
            .send(candidate_from("bob", n))
            .await
            .expect("Registry gone");
    }
    settle().await;

    let engine = alice.engines.engine_for(&peer("bob")).await.expect("Engine");
    assert!(engine.added_candidates().await.is_empty());

    alice
        .inbound_tx
        .send(answer_from("bob", "alice"))
        .await
        .expect("Registry gone");
    settle().await;

    // Exactly one remote description, then the buffer in arrival order.
    assert_eq!(engine.remote_description_kinds().await.len(), 1);
    assert_eq!(
        engine.added_candidates().await,
        vec!["candidate:1", "candidate:2", "candidate:3"]
    );

    // Late candidates skip the buffer entirely.
    alice
        .inbound_tx
        .send(candidate_from("bob", 4))
        .await
        .expect("Registry gone");
    settle().await;
    assert_eq!(engine.added_candidates().await.len(), 4);
}
