use crate::engine::EngineFactory;
use crate::room::RoomEvent;
use crate::session::{PeerSession, SessionEvent};
use crate::signal::SignalTransport;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parley_core::{PeerId, RoomId, SignalError, SignalKind, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

/// Per-room authority over peer sessions.
///
/// Routes inbound signaling to the owning session, creates answering
/// sessions for unseen offerers, and is the only place sessions are created
/// or destroyed. Message routing reads the map concurrently; creation and
/// removal are short exclusive sections.
pub struct RoomRegistry {
    local_id: PeerId,
    room_id: RoomId,
    transport: Arc<dyn SignalTransport>,
    engines: Arc<dyn EngineFactory>,
    sessions: DashMap<PeerId, PeerSession>,
    session_tx: mpsc::Sender<SessionEvent>,
    session_rx: Mutex<mpsc::Receiver<SessionEvent>>,
    room_tx: mpsc::Sender<RoomEvent>,
}

impl RoomRegistry {
    pub fn new(
        local_id: PeerId,
        room_id: RoomId,
        transport: Arc<dyn SignalTransport>,
        engines: Arc<dyn EngineFactory>,
    ) -> (Arc<Self>, mpsc::Receiver<RoomEvent>) {
        let (session_tx, session_rx) = mpsc::channel(256);
        let (room_tx, room_rx) = mpsc::channel(256);

        let registry = Arc::new(Self {
            local_id,
            room_id,
            transport,
            engines,
            sessions: DashMap::new(),
            session_tx,
            session_rx: Mutex::new(session_rx),
            room_tx,
        });
        (registry, room_rx)
    }

    /// Drive the registry until the transport's inbound stream ends, then
    /// tear down every session. Sessions failing individually never stop
    /// this loop.
    pub async fn run(&self, mut inbound: mpsc::Receiver<SignalMessage>) {
        info!("Room registry started for room {}", self.room_id);

        let mut session_rx = self.session_rx.lock().await;
        loop {
            tokio::select! {
                msg = inbound.recv() => match msg {
                    Some(m) => self.on_inbound_message(m).await,
                    None => {
                        info!("Signal stream closed. Tearing down room {}", self.room_id);
                        break;
                    }
                },

                evt = session_rx.recv() => {
                    // recv cannot return None: the registry holds a sender.
                    if let Some(e) = evt {
                        self.handle_session_event(e).await;
                    }
                }
            }
        }
        drop(session_rx);

        self.teardown().await;
        info!("Room registry finished for room {}", self.room_id);
    }

    /// Route one inbound signaling message.
    pub async fn on_inbound_message(&self, msg: SignalMessage) {
        if msg.room_id != self.room_id {
            debug!("Discarding message for foreign room {}", msg.room_id);
            return;
        }

        let Some(from) = msg.from.clone() else {
            warn!("Discarding {:?} without sender identity", msg.kind);
            return;
        };
        if from == self.local_id {
            debug!("Discarding fan-out echo of our own {:?}", msg.kind);
            return;
        }

        let existing = self.sessions.get(&from).map(|s| s.clone());
        if let Some(session) = existing {
            session.handle_signal(msg).await;
            return;
        }

        match msg.kind {
            SignalKind::Offer => {
                info!("Creating answering session for peer {}", from);
                match self.create_session(from.clone()).await {
                    Ok(session) => session.handle_signal(msg).await,
                    Err(e) => {
                        error!("Failed to create session for {}: {}", from, e);
                        let _ = self
                            .room_tx
                            .send(RoomEvent::SessionFailed {
                                peer_id: from,
                                error: e,
                            })
                            .await;
                    }
                }
            }
            // Out-of-order or stale; must not crash the registry.
            _ => warn!("{}", SignalError::UnknownPeer(from)),
        }
    }

    /// Create (or return the existing) session in the offering role. The
    /// caller starts the call with [`PeerSession::request_offer`].
    pub async fn create_outbound_session(
        &self,
        peer_id: PeerId,
    ) -> Result<PeerSession, SignalError> {
        if peer_id == self.local_id {
            return Err(SignalError::InvalidIdentity);
        }
        if let Some(session) = self.sessions.get(&peer_id).map(|s| s.clone()) {
            return Ok(session);
        }
        self.create_session(peer_id).await
    }

    /// Close the session's engine, discard its buffers, drop the map entry.
    /// Idempotent.
    pub async fn remove_session(&self, peer_id: &PeerId) {
        if let Some((_, session)) = self.sessions.remove(peer_id) {
            session.close().await;
            info!("Removed session for peer {}", peer_id);
        }
    }

    /// Remove every session; used on user-initiated disconnect.
    pub async fn teardown(&self) {
        let peers: Vec<PeerId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for peer in peers {
            self.remove_session(&peer).await;
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    async fn create_session(&self, peer_id: PeerId) -> Result<PeerSession, SignalError> {
        let (engine, engine_rx) = self
            .engines
            .create_engine(&peer_id)
            .await
            .map_err(|e| SignalError::EngineRejection(e.0))?;

        let session = PeerSession::spawn(
            self.local_id.clone(),
            peer_id.clone(),
            self.room_id.clone(),
            engine,
            engine_rx,
            self.transport.clone(),
            self.session_tx.clone(),
        );

        let raced = match self.sessions.entry(peer_id) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                None
            }
        };

        // A concurrent create won; keep the established session.
        if let Some(winner) = raced {
            session.close().await;
            return Ok(winner);
        }
        Ok(session)
    }

    async fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected(peer_id) => {
                let _ = self.room_tx.send(RoomEvent::PeerConnected(peer_id)).await;
            }

            SessionEvent::EngineDown(peer_id, state) => {
                info!("Engine down for peer {}: {:?}", peer_id, state);
                self.remove_session(&peer_id).await;
                let _ = self
                    .room_tx
                    .send(RoomEvent::PeerDisconnected(peer_id))
                    .await;
            }

            SessionEvent::RemoteChannel(peer_id, channel) => {
                let _ = self
                    .room_tx
                    .send(RoomEvent::RemoteChannel { peer_id, channel })
                    .await;
            }

            SessionEvent::ChannelData(peer_id, data) => {
                let _ = self
                    .room_tx
                    .send(RoomEvent::ChannelData { peer_id, data })
                    .await;
            }

            SessionEvent::Fatal(peer_id, error) => {
                error!("Session with peer {} failed: {}", peer_id, error);
                self.remove_session(&peer_id).await;
                let _ = self
                    .room_tx
                    .send(RoomEvent::SessionFailed { peer_id, error })
                    .await;
            }

            SessionEvent::SendFailed(peer_id, error) => {
                // Policy: a single send failure is not a teardown; the room
                // goes down when the transport itself disconnects.
                warn!("Send failed for peer {}: {}", peer_id, error);
            }

            SessionEvent::Closed(peer_id) => {
                // Only drop the entry if it still refers to the finished
                // session; a replacement may already be in place.
                let stale = self
                    .sessions
                    .get(&peer_id)
                    .map(|s| s.is_finished())
                    .unwrap_or(false);
                if stale {
                    self.sessions.remove(&peer_id);
                }
                debug!("Session with peer {} finished", peer_id);
            }
        }
    }
}
