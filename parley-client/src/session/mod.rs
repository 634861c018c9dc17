mod coordinator;
mod peer_session;
mod session_event;

pub use coordinator::{NegotiationCoordinator, NegotiationEvent, NegotiationState, Step};
pub use peer_session::PeerSession;
pub(crate) use session_event::SessionEvent;
