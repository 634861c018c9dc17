pub use parley_core::{PeerId, RoomId, SignalError, SignalMessage};

pub mod model {
    pub use parley_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use parley_client::*;
}
