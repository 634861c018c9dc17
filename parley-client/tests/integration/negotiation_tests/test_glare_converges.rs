use parley_client::DescriptionKind;
use parley_core::{SignalKind, SignalMessage};
use tokio::sync::mpsc;

use crate::integration::{TestPeer, create_test_peer, init_tracing};
use crate::utils::{peer, settle};

fn pump(
    mut from: mpsc::UnboundedReceiver<SignalMessage>,
    to: mpsc::Sender<SignalMessage>,
) {
    tokio::spawn(async move {
        while let Some(msg) = from.recv().await {
            if to.send(msg).await.is_err() {
                break;
            }
        }
    });
}

fn wire(a: &mut TestPeer, b: &mut TestPeer) {
    let (a_out, b_out) = (
        std::mem::replace(&mut a.outbound_rx, mpsc::unbounded_channel().1),
        std::mem::replace(&mut b.outbound_rx, mpsc::unbounded_channel().1),
    );
    pump(a_out, b.inbound_tx.clone());
    pump(b_out, a.inbound_tx.clone());
}

#[tokio::test]
async fn test_glare_converges() {
    init_tracing();

    let mut alice = create_test_peer("alice");
    let mut bob = create_test_peer("bob");
    wire(&mut alice, &mut bob);

    // Both sides call at the same time.
    let alice_session = alice
        .registry
        .create_outbound_session(peer("bob"))
        .await
        .expect("Session for bob");
    let bob_session = bob
        .registry
        .create_outbound_session(peer("alice"))
        .await
        .expect("Session for alice");
    alice_session.request_offer().await;
    bob_session.request_offer().await;

    settle().await;

    // alice holds priority: one offer out, never an answer.
    let alice_sent = alice.transport.sent_messages().await;
    assert_eq!(
        alice_sent.iter().filter(|m| m.kind == SignalKind::Offer).count(),
        1
    );
    assert_eq!(
        alice_sent.iter().filter(|m| m.kind == SignalKind::Answer).count(),
        0
    );

    // bob yields: his own offer went out once, then he answered alice's.
    let bob_sent = bob.transport.sent_messages().await;
    assert_eq!(
        bob_sent.iter().filter(|m| m.kind == SignalKind::Offer).count(),
        1
    );
    assert_eq!(
        bob_sent.iter().filter(|m| m.kind == SignalKind::Answer).count(),
        1
    );

    // Each engine saw exactly one remote description of the expected kind.
    let alice_engine = alice.engines.engine_for(&peer("bob")).await.expect("Engine");
    assert_eq!(
        alice_engine.remote_description_kinds().await,
        vec![DescriptionKind::Answer]
    );

    let bob_engine = bob.engines.engine_for(&peer("alice")).await.expect("Engine");
    assert_eq!(
        bob_engine.remote_description_kinds().await,
        vec![DescriptionKind::Offer]
    );

    // One session per side.
    assert_eq!(alice.registry.session_count(), 1);
    assert_eq!(bob.registry.session_count(), 1);
}
