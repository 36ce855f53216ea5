use crate::domain::error::SockShellResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Device name shown in the prompt and the `hello` reply
pub const KEY_DEVICE_NAME: &str = "devfid";
/// Listening port
pub const KEY_PORT: &str = "socport";
/// Per-line read timeout in seconds
pub const KEY_TIMEOUT: &str = "soctout";
/// Resolved hardware unique id
pub const KEY_HW_UID: &str = "hwuid";
/// Device IP address, used only for the connection hint
pub const KEY_DEVICE_IP: &str = "devip";

pub const DEFAULT_PORT: u16 = 9008;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Built-in node configuration used when no value was ever persisted
pub fn default_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        (KEY_DEVICE_NAME, "node01"),
        (KEY_PORT, "9008"),
        (KEY_TIMEOUT, "100"),
        (KEY_HW_UID, "n/a"),
        (KEY_DEVICE_IP, "n/a"),
    ]
}

/// Named configuration values shared by the server and the shell
pub trait ConfigStore: Send + Sync {
    /// Read a value, `None` if the key is unknown
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, persisting it if the store is backed by storage
    fn put(&self, key: &str, value: &str) -> SockShellResult<()>;

    /// All known keys in stable order
    fn keys(&self) -> Vec<String>;
}

/// Construction overrides for a session server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerOptions {
    /// Bind address, empty means all interfaces
    #[serde(default)]
    pub host: String,
    /// Overrides the `socport` value
    #[serde(default)]
    pub port: Option<u16>,
    /// Overrides the hardware derived unique id
    #[serde(default)]
    pub uid: Option<String>,
    /// Overrides the `soctout` value, kept raw so bad input can fall back
    #[serde(default)]
    pub user_timeout: Option<String>,
}

impl ServerOptions {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.user_timeout = Some(timeout.into());
        self
    }

    /// Host to bind, mapping the empty string to every interface
    pub fn bind_host(&self) -> &str {
        if self.host.trim().is_empty() {
            "0.0.0.0"
        } else {
            self.host.trim()
        }
    }
}

/// Resolve the listening port from the override or the store
pub fn resolve_port(explicit: Option<u16>, store: &dyn ConfigStore) -> u16 {
    if let Some(port) = explicit {
        return port;
    }

    match store.get(KEY_PORT).map(|raw| raw.trim().parse::<u16>()) {
        Some(Ok(port)) if port > 0 => port,
        Some(Ok(_)) => {
            warn!("Injected value (port <int>) error: port must be non-zero, using {}", DEFAULT_PORT);
            DEFAULT_PORT
        }
        Some(Err(e)) => {
            warn!("Injected value (port <int>) error: {}, using {}", e, DEFAULT_PORT);
            DEFAULT_PORT
        }
        None => {
            warn!("Missing {} value, using {}", KEY_PORT, DEFAULT_PORT);
            DEFAULT_PORT
        }
    }
}

/// Resolve the per-line read timeout in seconds, always positive
pub fn resolve_timeout(explicit: Option<&str>, store: &dyn ConfigStore) -> u64 {
    let (source, raw) = match explicit {
        Some(raw) => ("USER_TIMEOUT", Some(raw.to_string())),
        None => (KEY_TIMEOUT, store.get(KEY_TIMEOUT)),
    };

    let Some(raw) = raw else {
        warn!("Missing {} value, using {} sec", source, DEFAULT_TIMEOUT_SECS);
        return DEFAULT_TIMEOUT_SECS;
    };

    match parse_timeout(&raw) {
        Some(secs) => secs,
        None => {
            warn!(
                "{} value error, must be positive <int>: {:?}, using {} sec",
                source, raw, DEFAULT_TIMEOUT_SECS
            );
            DEFAULT_TIMEOUT_SECS
        }
    }
}

fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}
