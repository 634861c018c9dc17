use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// One signaling frame.
///
/// For `IceCandidate` the `sdp` field carries a JSON-encoded [`CandidateInit`]
/// (double-encoded on the wire, kept for compatibility with existing rooms).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    pub sdp: Option<String>,
    pub from: Option<PeerId>,
    pub to: Option<PeerId>,
}

impl SignalMessage {
    pub fn offer(room_id: RoomId, sdp: String, from: PeerId, to: Option<PeerId>) -> Self {
        Self {
            kind: SignalKind::Offer,
            room_id,
            sdp: Some(sdp),
            from: Some(from),
            to,
        }
    }

    pub fn answer(room_id: RoomId, sdp: String, from: PeerId, to: PeerId) -> Self {
        Self {
            kind: SignalKind::Answer,
            room_id,
            sdp: Some(sdp),
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn candidate(room_id: RoomId, payload: String, from: PeerId, to: PeerId) -> Self {
        Self {
            kind: SignalKind::IceCandidate,
            room_id,
            sdp: Some(payload),
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Decoded network-path candidate descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}
