pub mod signal_helpers;

pub use mock_engine::*;
pub use mock_transport::*;
pub use signal_helpers::*;
