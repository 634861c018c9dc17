use parley_core::IceServerConfig;
use serde::{Deserialize, Serialize};

/// Configuration handed to the default engine factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}
