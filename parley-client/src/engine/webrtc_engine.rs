use crate::engine::{
    ConnectionEngine, DescriptionKind, EngineConfig, EngineConnectionState, EngineError,
    EngineEvent, EngineFactory, RemoteChannel,
};
use async_trait::async_trait;
use bytes::Bytes;
use parley_core::{CandidateInit, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Default [`ConnectionEngine`] backed by a `webrtc` peer connection.
pub struct WebRtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcEngine {
    /// Build a peer connection and register its callbacks.
    ///
    /// Callbacks are wired exactly once here; `event_tx` is the only path
    /// engine events take back to the owning session.
    pub async fn new(
        peer_id: PeerId,
        config: EngineConfig,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| EngineError(e.to_string()))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| EngineError(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .into_iter()
                .map(|s| RTCIceServer {
                    urls: s.urls,
                    username: s.username.unwrap_or_default(),
                    credential: s.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| EngineError(e.to_string()))?,
        );

        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Connection state changed for peer {}: {:?}", uid, s);
                    let mapped = match s {
                        RTCPeerConnectionState::New => EngineConnectionState::New,
                        RTCPeerConnectionState::Connecting => EngineConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => EngineConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => EngineConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => EngineConnectionState::Failed,
                        RTCPeerConnectionState::Closed => EngineConnectionState::Closed,
                        _ => return,
                    };
                    let _ = tx.send(EngineEvent::ConnectionStateChanged(mapped)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let init = CandidateInit {
                    candidate: json_candidate.candidate,
                    sdp_mid: json_candidate.sdp_mid,
                    sdp_m_line_index: json_candidate.sdp_mline_index,
                };
                let _ = tx.send(EngineEvent::LocalCandidate(init)).await;
            })
        }));

        let dc_tx = event_tx.clone();
        let uid_dc = peer_id.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let uid = uid_dc.clone();

            Box::pin(async move {
                debug!("Inbound data channel '{}' from peer {}", dc.label(), uid);

                let msg_tx = tx.clone();
                dc.on_message(Box::new(move |msg: DataChannelMessage| {
                    let tx = msg_tx.clone();
                    Box::pin(async move {
                        let data = Bytes::from(msg.data.to_vec());
                        let _ = tx.send(EngineEvent::ChannelData(data)).await;
                    })
                }));

                let channel: Arc<dyn RemoteChannel> = Arc::new(WebRtcDataChannel { inner: dc });
                let _ = tx.send(EngineEvent::RemoteChannel(channel)).await;
            })
        }));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl ConnectionEngine for WebRtcEngine {
    async fn create_offer(&self) -> Result<String, EngineError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| EngineError(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, EngineError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| EngineError(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_local_description(
        &self,
        sdp: String,
        kind: DescriptionKind,
    ) -> Result<(), EngineError> {
        let desc = build_description(sdp, kind)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| EngineError(e.to_string()))
    }

    async fn set_remote_description(
        &self,
        sdp: String,
        kind: DescriptionKind,
    ) -> Result<(), EngineError> {
        let desc = build_description(sdp, kind)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| EngineError(e.to_string()))
    }

    async fn add_remote_candidate(&self, candidate: CandidateInit) -> Result<(), EngineError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| EngineError(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Error closing peer connection: {:?}", e);
        }
    }
}

fn build_description(
    sdp: String,
    kind: DescriptionKind,
) -> Result<RTCSessionDescription, EngineError> {
    let desc = match kind {
        DescriptionKind::Offer => RTCSessionDescription::offer(sdp),
        DescriptionKind::Answer => RTCSessionDescription::answer(sdp),
    };
    desc.map_err(|e| EngineError(e.to_string()))
}

struct WebRtcDataChannel {
    inner: Arc<RTCDataChannel>,
}

impl RemoteChannel for WebRtcDataChannel {
    fn label(&self) -> String {
        self.inner.label().to_owned()
    }
}

/// Builds one [`WebRtcEngine`] per session from a shared [`EngineConfig`].
pub struct WebRtcEngineFactory {
    config: EngineConfig,
}

impl WebRtcEngineFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for WebRtcEngineFactory {
    async fn create_engine(
        &self,
        peer_id: &PeerId,
    ) -> Result<(Arc<dyn ConnectionEngine>, mpsc::Receiver<EngineEvent>), EngineError> {
        let (event_tx, event_rx) = mpsc::channel(256);
        let engine = WebRtcEngine::new(peer_id.clone(), self.config.clone(), event_tx).await?;
        Ok((Arc::new(engine), event_rx))
    }
}
