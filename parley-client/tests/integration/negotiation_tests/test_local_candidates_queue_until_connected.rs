use parley_client::EngineEvent;
use parley_core::{CandidateInit, SignalKind};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{
    SIGNAL_TIMEOUT_MS, answer_from, peer, settle, wait_for_kind,
};

fn local_candidate(n: u32) -> CandidateInit {
    CandidateInit {
        candidate: format!("candidate:{n}"),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn test_local_candidates_queue_until_connected() {
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

    // Transport drops; candidates generated meanwhile must be held.
    alice.transport.set_connected(false);

    let engine = alice.engines.engine_for(&peer("bob")).await.expect("Engine");
    engine.emit(EngineEvent::LocalCandidate(local_candidate(1))).await;
    engine.emit(EngineEvent::LocalCandidate(local_candidate(2))).await;
    settle().await;

    assert!(
        alice
            .transport
            .sent_of_kind(SignalKind::IceCandidate)
            .await
            .is_empty()
    );

    // Connectivity returns; the next inbound frame triggers the flush.
    alice.transport.set_connected(true);
    alice
        .inbound_tx
        .send(answer_from("bob", "alice"))
        .await
        .expect("Registry gone");
    settle().await;

    let flushed = alice.transport.sent_of_kind(SignalKind::IceCandidate).await;
    let payloads: Vec<String> = flushed.iter().filter_map(|m| m.sdp.clone()).collect();
    assert_eq!(payloads.len(), 2);
    assert!(payloads[0].contains("candidate:1"));
    assert!(payloads[1].contains("candidate:2"));
}
