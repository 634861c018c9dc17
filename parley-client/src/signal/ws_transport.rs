use crate::signal::{SignalTransport, TransportError};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::{PeerId, RoomId, SignalMessage};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

/// WebSocket signaling channel scoped to one `(userId, roomId)` pair.
///
/// The socket is split into a writer task fed by an unbounded queue and a
/// reader task that decodes frames into [`SignalMessage`]s. Malformed frames
/// are dropped with a warning; the peer never sees them.
pub struct WsSignalTransport {
    outgoing: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    connected: Arc<AtomicBool>,
}

impl WsSignalTransport {
    /// Dial `{url}/signal/{roomId}/{userId}` and return the transport plus
    /// the inbound message stream.
    pub async fn connect(
        url: &str,
        user_id: &PeerId,
        room_id: &RoomId,
    ) -> Result<(Self, mpsc::Receiver<SignalMessage>), TransportError> {
        let endpoint = format!("{}/signal/{}/{}", url.trim_end_matches('/'), room_id, user_id);

        let (socket, _) = connect_async(&endpoint)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("Signal channel connected: {}", endpoint);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel(256);
        let connected = Arc::new(AtomicBool::new(true));

        let writer_connected = connected.clone();
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            writer_connected.store(false, Ordering::SeqCst);
        });

        let reader_connected = connected.clone();
        tokio::spawn(async move {
            while let Some(Ok(frame)) = stream.next().await {
                match frame {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            if in_tx.send(signal).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid signal frame: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
        });

        let transport = Self {
            outgoing: Mutex::new(Some(out_tx)),
            connected,
        };
        Ok((transport, in_rx))
    }
}

#[async_trait]
impl SignalTransport for WsSignalTransport {
    async fn send(&self, msg: SignalMessage) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let json =
            serde_json::to_string(&msg).map_err(|e| TransportError::Encode(e.to_string()))?;

        let outgoing = self.outgoing.lock().expect("transport lock poisoned");
        match outgoing.as_ref() {
            Some(tx) => tx
                .send(Message::Text(json))
                .map_err(|_| TransportError::NotConnected),
            None => Err(TransportError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) {
        // Dropping the sender ends the writer task, which closes the socket.
        self.outgoing.lock().expect("transport lock poisoned").take();
        self.connected.store(false, Ordering::SeqCst);
    }
}
