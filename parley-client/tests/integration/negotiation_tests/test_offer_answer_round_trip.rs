use parley_core::SignalKind;

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{SIGNAL_TIMEOUT_MS, offer_from, peer, room, wait_for_kind};

#[tokio::test]
async fn test_offer_answer_round_trip() {
    init_tracing();

    let mut bob = create_test_peer("bob");

    bob.inbound_tx
        .send(offer_from("alice"))
        .await
        .expect("Registry gone");

    let answer = wait_for_kind(&mut bob.outbound_rx, SignalKind::Answer, SIGNAL_TIMEOUT_MS)
        .await
        .expect("No answer produced");

    assert_eq!(answer.to, Some(peer("alice")));
    assert_eq!(answer.from, Some(peer("bob")));
    assert_eq!(answer.room_id, room());
    assert!(answer.sdp.is_some());

    assert_eq!(bob.registry.session_count(), 1);
}
