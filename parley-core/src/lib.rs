pub mod error;
pub mod model;

pub use error::SignalError;
pub use model::{CandidateInit, IceServerConfig, PeerId, RoomId, SignalKind, SignalMessage};
