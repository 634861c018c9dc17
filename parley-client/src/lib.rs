pub mod engine;
pub mod room;
pub mod session;
pub mod signal;

pub use engine::{
    ConnectionEngine, DescriptionKind, EngineConfig, EngineConnectionState, EngineError,
    EngineEvent, EngineFactory, RemoteChannel, WebRtcEngine, WebRtcEngineFactory,
};
pub use room::{RoomEvent, RoomRegistry};
pub use session::{NegotiationCoordinator, NegotiationState, PeerSession};
pub use signal::{SignalTransport, TransportError, WsSignalTransport};
