//! Listener settings.

use serde::{Deserialize, Serialize};

/// HTTP / WebSocket listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Path the broker POSTs notifications to.
    pub notification_path: String,
    /// WebSocket upgrade path for client sessions.
    pub ws_path: String,
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Outbound queue depth per session before frames are dropped.
    pub session_channel_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            notification_path: "/receiveNotifications".to_string(),
            ws_path: "/orion".to_string(),
            max_body_bytes: 1_048_576,
            session_channel_capacity: 64,
        }
    }
}

impl ServerSettings {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_formats() {
        let s = ServerSettings {
            host: "127.0.0.1".into(),
            port: 1234,
            ..ServerSettings::default()
        };
        assert_eq!(s.bind_addr(), "127.0.0.1:1234");
    }
}
