use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{peer, settle};

#[tokio::test]
async fn test_remove_session_idempotent() {
    init_tracing();

    let alice = create_test_peer("alice");

    alice
        .registry
        .create_outbound_session(peer("bob"))
        .await
        .expect("Session for bob");
    assert_eq!(alice.registry.session_count(), 1);

    alice.registry.remove_session(&peer("bob")).await;
    alice.registry.remove_session(&peer("bob")).await;
    settle().await;

    assert_eq!(alice.registry.session_count(), 0);

    // Cleanup ran once, not twice.
    let engine = alice.engines.engine_for(&peer("bob")).await.expect("Engine");
    assert_eq!(engine.close_count(), 1);
}
