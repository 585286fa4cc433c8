use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub hub: HubSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Where the server listens, and the path clients upgrade on.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub ws_path: String,
}

/// Bearer-token verification.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

/// Queue bounds for the hub.
///
/// `outbound_capacity` bounds each connection's delivery queue; when it is
/// full, further messages for that connection are dropped. `inbound_capacity`
/// bounds the dispatcher's inbound channel; read pumps wait when it is full.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HubSettings {
    pub outbound_capacity: usize,
    pub inbound_capacity: usize,
    pub max_frame_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    /// `json` for one JSON object per event, anything else for plain text.
    pub format: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub auth: Option<PartialAuthSettings>,
    pub hub: Option<PartialHubSettings>,
    pub storage: Option<PartialStorageSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ws_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialAuthSettings {
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialHubSettings {
    pub outbound_capacity: Option<usize>,
    pub inbound_capacity: Option<usize>,
    pub max_frame_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialStorageSettings {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

/// Secret used when none is configured. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "my_secret_key";

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                ws_path: "/ws".to_string(),
            },
            auth: AuthSettings {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_secs: 24 * 60 * 60,
            },
            hub: HubSettings::default(),
            storage: StorageSettings {
                path: "./chat-app.db".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: 32,
            inbound_capacity: 256,
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server.unwrap_or_default();
        let auth = self.auth.unwrap_or_default();
        let hub = self.hub.unwrap_or_default();
        let storage = self.storage.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
                ws_path: server.ws_path.unwrap_or(default.server.ws_path),
            },
            auth: AuthSettings {
                jwt_secret: auth.jwt_secret.unwrap_or(default.auth.jwt_secret),
                token_ttl_secs: auth.token_ttl_secs.unwrap_or(default.auth.token_ttl_secs),
            },
            hub: HubSettings {
                // A zero-capacity queue could never accept a frame.
                outbound_capacity: hub
                    .outbound_capacity
                    .unwrap_or(default.hub.outbound_capacity)
                    .max(1),
                inbound_capacity: hub
                    .inbound_capacity
                    .unwrap_or(default.hub.inbound_capacity)
                    .max(1),
                max_frame_bytes: hub.max_frame_bytes.unwrap_or(default.hub.max_frame_bytes),
            },
            storage: StorageSettings {
                path: storage.path.unwrap_or(default.storage.path),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
                format: logging.format.unwrap_or(default.logging.format),
            },
        }
    }
}
