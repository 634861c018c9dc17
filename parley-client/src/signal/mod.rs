mod transport;
mod ws_transport;

pub use transport::{SignalTransport, TransportError};
pub use ws_transport::WsSignalTransport;
