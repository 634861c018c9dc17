use crate::model::{PeerId, RoomId};
use thiserror::Error;

/// Everything that can go wrong while coordinating a signaling session.
///
/// Per-message failures (`InvalidRoom`, `UnknownPeer`, `MalformedPayload`)
/// are contained where they occur; `EngineRejection` is session-fatal and
/// propagates to the registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error("message for room {0} does not belong to this room")]
    InvalidRoom(RoomId),

    #[error("no active session for peer {0}")]
    UnknownPeer(PeerId),

    #[error("malformed signal payload: {0}")]
    MalformedPayload(String),

    #[error("connection engine rejected the session: {0}")]
    EngineRejection(String),

    #[error("signal transport is not connected")]
    TransportUnavailable,

    #[error("session is closed")]
    SessionClosed,

    #[error("identity must not be empty")]
    InvalidIdentity,
}
