use parley_core::{RoomId, SignalMessage};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{peer, settle};

#[tokio::test]
async fn test_room_mismatch_discarded() {
    init_tracing();

    let bob = create_test_peer("bob");

    let foreign = SignalMessage::offer(
        RoomId::new("r2").unwrap(),
        "offer-sdp-for-alice".into(),
        peer("alice"),
        None,
    );
    bob.inbound_tx.send(foreign).await.expect("Registry gone");
    settle().await;

    assert_eq!(bob.registry.session_count(), 0);
    assert_eq!(bob.engines.created_count().await, 0);
    assert!(bob.transport.sent_messages().await.is_empty());
}
