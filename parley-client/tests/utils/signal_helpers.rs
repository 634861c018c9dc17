use anyhow::Result;
use parley_core::{CandidateInit, PeerId, RoomId, SignalKind, SignalMessage};
use tokio::sync::mpsc;

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Settle time for fire-and-forget message processing (ms).
pub const SETTLE_MS: u64 = 200;

pub fn room() -> RoomId {
    RoomId::new("r1").unwrap()
}

pub fn peer(name: &str) -> PeerId {
    PeerId::new(name).unwrap()
}

pub fn offer_from(name: &str) -> SignalMessage {
    SignalMessage::offer(room(), format!("offer-sdp-for-{}", name), peer(name), None)
}

pub fn answer_from(name: &str, to: &str) -> SignalMessage {
    SignalMessage::answer(
        room(),
        format!("answer-sdp-for-{}", name),
        peer(name),
        peer(to),
    )
}

/// ICE_CANDIDATE frame with the double-encoded payload used on the wire.
pub fn candidate_from(name: &str, n: u32) -> SignalMessage {
    let payload = serde_json::to_string(&CandidateInit {
        candidate: format!("candidate:{n}"),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    })
    .unwrap();
    SignalMessage::candidate(room(), payload, peer(name), peer("local"))
}

/// Wait until a message of the given kind shows up on the outbound stream,
/// skipping everything else.
pub async fn wait_for_kind(
    rx: &mut mpsc::UnboundedReceiver<SignalMessage>,
    kind: SignalKind,
    timeout_ms: u64,
) -> Result<SignalMessage> {
    let deadline = std::time::Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        while let Some(msg) = rx.recv().await {
            if msg.kind == kind {
                return Ok(msg);
            }
        }
        anyhow::bail!("Outbound stream closed")
    })
    .await
    .map_err(|_| anyhow::anyhow!("Timeout waiting for {:?}", kind))?
}

pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(SETTLE_MS)).await;
}
