mod engine_config;
mod webrtc_engine;

pub use engine_config::EngineConfig;
pub use webrtc_engine::{WebRtcEngine, WebRtcEngineFactory};

use async_trait::async_trait;
use bytes::Bytes;
use parley_core::{CandidateInit, PeerId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
#[error("connection engine failure: {0}")]
pub struct EngineError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Offer,
    Answer,
}

/// Lifecycle of the underlying peer-to-peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Inbound media/data subchannel opened by the remote peer.
pub trait RemoteChannel: Send + Sync {
    fn label(&self) -> String;
}

/// Events the engine pushes back to its owning session.
pub enum EngineEvent {
    LocalCandidate(CandidateInit),
    ConnectionStateChanged(EngineConnectionState),
    RemoteChannel(Arc<dyn RemoteChannel>),
    ChannelData(Bytes),
}

/// Black-box negotiation primitive, one instance per peer session.
///
/// The coordinator drives it; it never decides anything on its own. All
/// callbacks are wired once at creation and surface through the event
/// receiver handed out by the factory.
#[async_trait]
pub trait ConnectionEngine: Send + Sync {
    async fn create_offer(&self) -> Result<String, EngineError>;

    async fn create_answer(&self) -> Result<String, EngineError>;

    async fn set_local_description(
        &self,
        sdp: String,
        kind: DescriptionKind,
    ) -> Result<(), EngineError>;

    async fn set_remote_description(
        &self,
        sdp: String,
        kind: DescriptionKind,
    ) -> Result<(), EngineError>;

    async fn add_remote_candidate(&self, candidate: CandidateInit) -> Result<(), EngineError>;

    async fn close(&self);
}

/// Creates one engine (and its event stream) per peer session.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create_engine(
        &self,
        peer_id: &PeerId,
    ) -> Result<(Arc<dyn ConnectionEngine>, mpsc::Receiver<EngineEvent>), EngineError>;
}
