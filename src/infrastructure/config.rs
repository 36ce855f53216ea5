use crate::domain::config::{default_entries, ConfigStore};
use crate::domain::error::{SockShellError, SockShellResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

type Entries = BTreeMap<String, toml::Value>;

/// Convert a raw string into the most specific TOML value
fn to_value(raw: &str) -> toml::Value {
    let trimmed = raw.trim();
    // Only canonical integers, so ids like "0a01" or "0011" keep their text
    if let Ok(int) = trimmed.parse::<i64>() {
        if int.to_string() == trimmed {
            return toml::Value::Integer(int);
        }
    }
    match trimmed {
        "true" | "True" => toml::Value::Boolean(true),
        "false" | "False" => toml::Value::Boolean(false),
        _ => toml::Value::String(raw.to_string()),
    }
}

fn to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn defaults() -> Entries {
    default_entries()
        .into_iter()
        .map(|(key, value)| (key.to_string(), to_value(value)))
        .collect()
}

fn read_lock<'a>(entries: &'a RwLock<Entries>) -> std::sync::RwLockReadGuard<'a, Entries> {
    entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<'a>(entries: &'a RwLock<Entries>) -> std::sync::RwLockWriteGuard<'a, Entries> {
    entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// File backed node configuration
pub struct TomlConfigStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl TomlConfigStore {
    /// Open the store at `path`, starting from defaults when the file is missing
    pub fn open(path: impl Into<PathBuf>) -> SockShellResult<Self> {
        let path = path.into();
        let mut entries = defaults();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| SockShellError::Config {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;
            let stored: Entries = toml::from_str(&content).map_err(|e| SockShellError::Config {
                message: format!("Failed to parse config file {}: {}", path.display(), e),
            })?;
            entries.extend(stored);
            debug!("Loaded node config from {}", path.display());
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open the store at the per-user default location
    pub fn open_default() -> SockShellResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Per-user config location, e.g. `~/.config/sockshell/node_config.toml`
    pub fn default_path() -> SockShellResult<PathBuf> {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| SockShellError::Config {
                message: "Could not determine config directory".to_string(),
            })?;

        Ok(base.join("sockshell").join("node_config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &Entries) -> SockShellResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SockShellError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(entries).map_err(|e| SockShellError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&self.path, content).map_err(|e| SockShellError::Config {
            message: format!("Failed to write config file {}: {}", self.path.display(), e),
        })
    }
}

impl ConfigStore for TomlConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        read_lock(&self.entries).get(key).map(to_string)
    }

    fn put(&self, key: &str, value: &str) -> SockShellResult<()> {
        let mut entries = write_lock(&self.entries);
        entries.insert(key.to_string(), to_value(value));
        self.save(&entries)
    }

    fn keys(&self) -> Vec<String> {
        read_lock(&self.entries).keys().cloned().collect()
    }
}

/// Volatile node configuration
pub struct MemoryConfigStore {
    entries: RwLock<Entries>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(defaults()),
        }
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = write_lock(&store.entries);
            for (key, value) in entries {
                map.insert(key.to_string(), to_value(value));
            }
        }
        store
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        read_lock(&self.entries).get(key).map(to_string)
    }

    fn put(&self, key: &str, value: &str) -> SockShellResult<()> {
        write_lock(&self.entries).insert(key.to_string(), to_value(value));
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        read_lock(&self.entries).keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{KEY_DEVICE_NAME, KEY_HW_UID, KEY_PORT};
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlConfigStore::open(temp_dir.path().join("node_config.toml")).unwrap();

        assert_eq!(store.get(KEY_DEVICE_NAME).as_deref(), Some("node01"));
        assert_eq!(store.get(KEY_PORT).as_deref(), Some("9008"));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_put_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("node_config.toml");

        let store = TomlConfigStore::open(&path).unwrap();
        store.put(KEY_DEVICE_NAME, "mydevice").unwrap();
        store.put(KEY_PORT, "9100").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("socport = 9100"));
        assert!(content.contains("devfid = \"mydevice\""));

        let reopened = TomlConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get(KEY_DEVICE_NAME).as_deref(), Some("mydevice"));
        assert_eq!(reopened.get(KEY_PORT).as_deref(), Some("9100"));
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("node_config.toml");
        fs::write(&path, "socport = [broken").unwrap();

        let result = TomlConfigStore::open(&path);
        assert!(matches!(result, Err(SockShellError::Config { .. })));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryConfigStore::with_entries([(KEY_HW_UID, "aa1b2c")]);
        assert_eq!(store.get(KEY_HW_UID).as_deref(), Some("aa1b2c"));
        assert_eq!(store.get("missing"), None);

        store.put(KEY_HW_UID, "001122").unwrap();
        assert_eq!(store.get(KEY_HW_UID).as_deref(), Some("001122"));

        store.put("flag", "true").unwrap();
        assert_eq!(store.get("flag").as_deref(), Some("true"));
        assert!(store.keys().contains(&"flag".to_string()));
    }
}
