//! Local server identity.

use crate::config::ServerConfig;
use crate::extensible::{Extensible, ExtensibleKind};

#[derive(Debug)]
pub struct ServerInfo {
    pub name: String,
    pub sid: String,
    pub network: String,
    pub description: String,
    /// Unix timestamp of startup.
    pub created: i64,
    pub ext: Extensible,
}

impl ServerInfo {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            name: config.name.clone(),
            sid: config.sid.clone(),
            network: config.network.clone(),
            description: config.description.clone(),
            created: chrono::Utc::now().timestamp(),
            ext: Extensible::new(ExtensibleKind::Server),
        }
    }
}
