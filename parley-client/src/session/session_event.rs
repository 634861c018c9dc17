use crate::engine::{EngineConnectionState, RemoteChannel};
use crate::signal::TransportError;
use bytes::Bytes;
use parley_core::{PeerId, SignalError};
use std::sync::Arc;

/// Events a peer session reports back to its registry.
pub(crate) enum SessionEvent {
    Connected(PeerId),
    EngineDown(PeerId, EngineConnectionState),
    RemoteChannel(PeerId, Arc<dyn RemoteChannel>),
    ChannelData(PeerId, Bytes),
    /// Session-fatal failure; the registry removes the session.
    Fatal(PeerId, SignalError),
    /// A non-candidate send failed. Not fatal on its own: teardown follows
    /// only when the transport itself reports disconnected.
    SendFailed(PeerId, TransportError),
    Closed(PeerId),
}
