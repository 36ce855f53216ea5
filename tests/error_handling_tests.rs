use sockshell::{ConfigStore, MemoryConfigStore, SockShellError, SockShellResult, TomlConfigStore};
use std::error::Error;

/// Error handling and resilience tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_error_types() {
        let errors = vec![
            SockShellError::Config { message: "Config error".to_string() },
            SockShellError::Transport { message: "recv failed".to_string() },
            SockShellError::NotConnected,
            SockShellError::InvalidState("accept while closed".to_string()),
            SockShellError::Shell("boom".to_string()),
            SockShellError::Reset("no supervisor".to_string()),
            SockShellError::InvalidInput("Invalid input".to_string()),
            SockShellError::Output("Output error".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty(), "Error display should not be empty");
        }

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SockShellError>();
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let error: SockShellError = io_error.into();
        assert!(matches!(error, SockShellError::Network(_)));
    }

    #[test]
    fn test_bind_error_keeps_source() {
        let error = SockShellError::Bind {
            addr: "0.0.0.0:9008".to_string(),
            attempts: 20,
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };

        let display = error.to_string();
        assert!(display.contains("0.0.0.0:9008"));
        assert!(display.contains("20 attempts"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_result_type() {
        fn failing() -> SockShellResult<u16> {
            Err(SockShellError::NotConnected)
        }

        fn propagating() -> SockShellResult<u16> {
            let port = failing()?;
            Ok(port + 1)
        }

        assert!(matches!(propagating(), Err(SockShellError::NotConnected)));
    }

    #[test]
    fn test_corrupt_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("node_config.toml");
        std::fs::write(&path, "devfid = [unterminated").unwrap();

        let result = TomlConfigStore::open(&path);
        assert!(matches!(result, Err(SockShellError::Config { .. })));
    }

    #[test]
    fn test_unwritable_config_path() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = TomlConfigStore::open(blocker.join("node_config.toml")).unwrap();
        let result = store.put("devfid", "node02");
        assert!(matches!(result, Err(SockShellError::Config { .. })));
    }

    #[test]
    fn test_memory_store_never_fails() {
        let store = MemoryConfigStore::new();
        assert!(store.put("socport", "not-a-port").is_ok());
        assert_eq!(store.get("socport").as_deref(), Some("not-a-port"));
    }
}
