use parley_client::RoomEvent;
use parley_core::{SignalError, SignalKind};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{offer_from, peer, settle};

#[tokio::test]
async fn test_engine_rejection_closes_session() {
    init_tracing();

    let mut bob = create_test_peer("bob");
    bob.engines.fail_remote_description();

    bob.inbound_tx
        .send(offer_from("alice"))
        .await
        .expect("Registry gone");

    let event = tokio::time::timeout(std::time::Duration::from_secs(5), bob.events.recv())
        .await
        .expect("No room event")
        .expect("Event stream closed");

    match event {
        RoomEvent::SessionFailed { peer_id, error } => {
            assert_eq!(peer_id, peer("alice"));
            assert!(matches!(error, SignalError::EngineRejection(_)));
        }
        _ => panic!("Expected SessionFailed"),
    }

    settle().await;
    assert_eq!(bob.registry.session_count(), 0);
    assert!(bob.transport.sent_of_kind(SignalKind::Answer).await.is_empty());
}
