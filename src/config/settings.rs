use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub client: ClientSettings,
}

/// Configuration settings for a bus client.
///
/// `destinations` lists the destinations the client may publish to; anything
/// else is rejected before reaching the transport. `host` is the address
/// consumers embed in the ack tokens they mint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientSettings {
    pub log_level: String,
    pub enable_auto_init_connections: bool,
    pub host: String,
    pub destinations: Vec<String>,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled in from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub client: Option<PartialClientSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub log_level: Option<String>,
    pub enable_auto_init_connections: Option<bool>,
    pub host: Option<String>,
    pub destinations: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client: ClientSettings {
                log_level: "info".to_string(),
                enable_auto_init_connections: true,
                host: "127.0.0.1".to_string(),
                destinations: Vec::new(),
            },
        }
    }
}
