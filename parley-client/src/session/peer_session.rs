use crate::engine::{ConnectionEngine, DescriptionKind, EngineConnectionState, EngineError, EngineEvent};
use crate::session::coordinator::{NegotiationCoordinator, NegotiationEvent, NegotiationState, Step};
use crate::session::SessionEvent;
use crate::signal::SignalTransport;
use parley_core::{CandidateInit, PeerId, RoomId, SignalError, SignalKind, SignalMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

enum SessionCommand {
    Signal(SignalMessage),
    RequestOffer,
    Close,
}

/// Handle to one per-peer negotiation session.
///
/// The session itself runs as a task that processes signaling commands and
/// engine events one at a time, so every state transition for this peer is
/// serialized. Distinct sessions share nothing and never wait on each other.
#[derive(Clone)]
pub struct PeerSession {
    peer_id: PeerId,
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl PeerSession {
    pub(crate) fn spawn(
        local_id: PeerId,
        peer_id: PeerId,
        room_id: RoomId,
        engine: Arc<dyn ConnectionEngine>,
        engine_rx: mpsc::Receiver<EngineEvent>,
        transport: Arc<dyn SignalTransport>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let worker = SessionWorker {
            coordinator: NegotiationCoordinator::new(local_id.clone(), peer_id.clone()),
            local_id,
            peer_id: peer_id.clone(),
            room_id,
            engine,
            engine_rx,
            transport,
            events,
            cmd_rx,
            pending_remote: Vec::new(),
            pending_local: VecDeque::new(),
        };
        tokio::spawn(worker.run());

        Self { peer_id, cmd_tx }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Queue an inbound signaling message for this session.
    pub async fn handle_signal(&self, msg: SignalMessage) {
        let _ = self.cmd_tx.send(SessionCommand::Signal(msg)).await;
    }

    /// Initiate (or renegotiate) the connection from the local side.
    pub async fn request_offer(&self) {
        let _ = self.cmd_tx.send(SessionCommand::RequestOffer).await;
    }

    /// Shut the session down. Cleanup runs once any in-flight engine call
    /// settles; calling this on an already-closed session is harmless.
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Close).await;
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.cmd_tx.is_closed()
    }
}

struct SessionWorker {
    local_id: PeerId,
    peer_id: PeerId,
    room_id: RoomId,
    coordinator: NegotiationCoordinator,
    engine: Arc<dyn ConnectionEngine>,
    engine_rx: mpsc::Receiver<EngineEvent>,
    transport: Arc<dyn SignalTransport>,
    events: mpsc::Sender<SessionEvent>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    pending_remote: Vec<CandidateInit>,
    pending_local: VecDeque<CandidateInit>,
}

impl SessionWorker {
    async fn run(mut self) {
        debug!("Session loop started for peer {}", self.peer_id);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(SessionCommand::Signal(msg)) => self.handle_signal(msg).await,
                    Some(SessionCommand::RequestOffer) => {
                        self.drive(NegotiationEvent::LocalOfferRequested).await;
                    }
                    Some(SessionCommand::Close) | None => {
                        self.coordinator.close();
                    }
                },

                evt = self.engine_rx.recv() => match evt {
                    Some(e) => self.handle_engine_event(e).await,
                    None => {
                        warn!("Engine event channel closed for peer {}", self.peer_id);
                        self.coordinator.close();
                    }
                }
            }

            if self.coordinator.state() == NegotiationState::Closed {
                break;
            }
        }

        // Mark the command channel closed before reporting, so the registry
        // can tell this handle apart from a fresh session for the same peer.
        self.cmd_rx.close();
        self.engine.close().await;
        let _ = self
            .events
            .send(SessionEvent::Closed(self.peer_id.clone()))
            .await;
        debug!("Session loop finished for peer {}", self.peer_id);
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        // Inbound traffic proves the transport is writable again; retry
        // anything we queued while it was down.
        if !self.pending_local.is_empty() && self.transport.is_connected() {
            self.flush_local_candidates().await;
        }

        let kind = msg.kind;
        let event = match self.validate(msg) {
            Ok(event) => event,
            Err(e) => {
                warn!("Discarding {:?} from {}: {}", kind, self.peer_id, e);
                return;
            }
        };

        self.drive(event).await;
    }

    /// Payload validation happens before the state machine sees the event;
    /// a malformed message is rejected without a transition.
    fn validate(&self, msg: SignalMessage) -> Result<NegotiationEvent, SignalError> {
        match msg.kind {
            SignalKind::Offer => {
                let sdp = msg
                    .sdp
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| SignalError::MalformedPayload("offer without sdp".into()))?;
                Ok(NegotiationEvent::RemoteOffer { sdp })
            }
            SignalKind::Answer => {
                let sdp = msg
                    .sdp
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| SignalError::MalformedPayload("answer without sdp".into()))?;
                Ok(NegotiationEvent::RemoteAnswer { sdp })
            }
            SignalKind::IceCandidate => {
                let payload = msg.sdp.ok_or_else(|| {
                    SignalError::MalformedPayload("candidate without payload".into())
                })?;
                let candidate = serde_json::from_str::<CandidateInit>(&payload)
                    .map_err(|e| SignalError::MalformedPayload(e.to_string()))?;
                Ok(NegotiationEvent::RemoteCandidate { candidate })
            }
        }
    }

    async fn drive(&mut self, event: NegotiationEvent) {
        let step = match self.coordinator.handle(event) {
            Ok(step) => step,
            Err(e) => {
                warn!("Rejected event for peer {}: {}", self.peer_id, e);
                return;
            }
        };

        match step {
            Step::SendOffer => self.send_offer().await,
            Step::SendAnswer { remote_sdp } => self.send_answer(remote_sdp).await,
            Step::ApplyAnswer { remote_sdp } => self.apply_answer(remote_sdp).await,
            Step::ApplyCandidate { candidate } => self.apply_candidate(candidate).await,
            Step::BufferCandidate { candidate } => self.pending_remote.push(candidate),
            Step::EnterStable => {
                info!("Session with peer {} is stable", self.peer_id);
                self.flush_remote_candidates().await;
            }
            Step::Ignore(reason) => {
                debug!("Ignoring event for peer {}: {}", self.peer_id, reason);
            }
        }
    }

    async fn send_offer(&mut self) {
        let sdp = match self.engine.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => return self.fail(e).await,
        };
        if let Err(e) = self
            .engine
            .set_local_description(sdp.clone(), DescriptionKind::Offer)
            .await
        {
            return self.fail(e).await;
        }

        let msg = SignalMessage::offer(
            self.room_id.clone(),
            sdp,
            self.local_id.clone(),
            Some(self.peer_id.clone()),
        );
        self.send_signal(msg).await;
    }

    async fn send_answer(&mut self, remote_sdp: String) {
        if let Err(e) = self
            .engine
            .set_remote_description(remote_sdp, DescriptionKind::Offer)
            .await
        {
            return self.fail(e).await;
        }

        let sdp = match self.engine.create_answer().await {
            Ok(sdp) => sdp,
            Err(e) => return self.fail(e).await,
        };
        if let Err(e) = self
            .engine
            .set_local_description(sdp.clone(), DescriptionKind::Answer)
            .await
        {
            return self.fail(e).await;
        }

        self.coordinator.answer_sent();

        let msg = SignalMessage::answer(
            self.room_id.clone(),
            sdp,
            self.local_id.clone(),
            self.peer_id.clone(),
        );
        self.send_signal(msg).await;

        // Remote description is in place now.
        self.flush_remote_candidates().await;
    }

    async fn apply_answer(&mut self, remote_sdp: String) {
        if let Err(e) = self
            .engine
            .set_remote_description(remote_sdp, DescriptionKind::Answer)
            .await
        {
            return self.fail(e).await;
        }

        self.coordinator.answer_applied();
        self.flush_remote_candidates().await;
    }

    async fn apply_candidate(&mut self, candidate: CandidateInit) {
        if let Err(e) = self.engine.add_remote_candidate(candidate).await {
            warn!("Failed to add candidate for peer {}: {}", self.peer_id, e);
        }
    }

    /// Apply everything buffered, in arrival order, exactly once.
    async fn flush_remote_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_remote) {
            self.apply_candidate(candidate).await;
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LocalCandidate(candidate) => {
                self.pending_local.push_back(candidate);
                if self.transport.is_connected() {
                    self.flush_local_candidates().await;
                }
            }

            EngineEvent::ConnectionStateChanged(state) => match state {
                EngineConnectionState::Connected => {
                    self.drive(NegotiationEvent::EngineConnected).await;
                    let _ = self
                        .events
                        .send(SessionEvent::Connected(self.peer_id.clone()))
                        .await;
                }
                EngineConnectionState::Failed
                | EngineConnectionState::Disconnected
                | EngineConnectionState::Closed => {
                    debug!("Engine reported {:?} for peer {}", state, self.peer_id);
                    let _ = self
                        .events
                        .send(SessionEvent::EngineDown(self.peer_id.clone(), state))
                        .await;
                }
                _ => {}
            },

            EngineEvent::RemoteChannel(channel) => {
                let _ = self
                    .events
                    .send(SessionEvent::RemoteChannel(self.peer_id.clone(), channel))
                    .await;
            }

            EngineEvent::ChannelData(data) => {
                let _ = self
                    .events
                    .send(SessionEvent::ChannelData(self.peer_id.clone(), data))
                    .await;
            }
        }
    }

    /// Drain the local-candidate queue in generation order, keeping whatever
    /// could not be handed to the transport.
    async fn flush_local_candidates(&mut self) {
        while let Some(candidate) = self.pending_local.pop_front() {
            let payload = match serde_json::to_string(&candidate) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Dropping unencodable candidate: {}", e);
                    continue;
                }
            };
            let msg = SignalMessage::candidate(
                self.room_id.clone(),
                payload,
                self.local_id.clone(),
                self.peer_id.clone(),
            );
            if self.transport.send(msg).await.is_err() {
                self.pending_local.push_front(candidate);
                break;
            }
        }
    }

    async fn send_signal(&mut self, msg: SignalMessage) {
        let kind = msg.kind;
        if let Err(e) = self.transport.send(msg).await {
            warn!("Failed to send {:?} to {}: {}", kind, self.peer_id, e);
            let _ = self
                .events
                .send(SessionEvent::SendFailed(self.peer_id.clone(), e))
                .await;
        }
    }

    async fn fail(&mut self, error: EngineError) {
        let error = SignalError::EngineRejection(error.0);
        warn!("Session with peer {} failed: {}", self.peer_id, error);
        self.coordinator.close();
        self.pending_remote.clear();
        self.pending_local.clear();
        let _ = self
            .events
            .send(SessionEvent::Fatal(self.peer_id.clone(), error))
            .await;
    }
}
