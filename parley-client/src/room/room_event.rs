use crate::engine::RemoteChannel;
use bytes::Bytes;
use parley_core::{PeerId, SignalError};
use std::sync::Arc;

/// What the room surfaces to presentation collaborators.
pub enum RoomEvent {
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    RemoteChannel {
        peer_id: PeerId,
        channel: Arc<dyn RemoteChannel>,
    },
    ChannelData {
        peer_id: PeerId,
        data: Bytes,
    },
    SessionFailed {
        peer_id: PeerId,
        error: SignalError,
    },
}
