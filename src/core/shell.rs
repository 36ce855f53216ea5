//! Built-in command interpreter.

use crate::core::dispatch::{Dispatcher, Outcome, SessionView};
use crate::domain::config::ConfigStore;
use crate::domain::error::SockShellResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const CONFIGURE_PREFIX: &str = "[configure] ";

const HELP: &[&str] = &[
    "[SOCKET]",
    "  exit              close the session",
    "  hello             device identification",
    "  version           protocol version",
    "[SHELL]",
    "  help              this text",
    "  echo <text>       repeat text",
    "  conf              enter configure mode",
    "[CONFIGURE]",
    "  dump              list every key",
    "  <key>             read a value",
    "  <key> <value>     write a value",
    "  noconf            leave configure mode",
];

/// Minimal shell with a configure mode over the node config
pub struct BasicShell {
    store: Arc<dyn ConfigStore>,
}

impl BasicShell {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    fn configure(&self, line: &str, session: &mut SessionView<'_>) -> Outcome {
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, Some(value.trim())),
            None => (line, None),
        };

        match (key, value) {
            ("dump", None) => {
                for key in self.store.keys() {
                    let value = self.store.get(&key).unwrap_or_default();
                    session.reply(format!("  {:<12}: {}", key, value));
                }
                Outcome::healthy("dump")
            }
            (key, None) => match self.store.get(key) {
                Some(value) => {
                    session.reply(value);
                    Outcome::healthy("get")
                }
                None => {
                    session.reply(format!("No such key: {}", key));
                    Outcome::healthy("get")
                }
            },
            (key, Some(value)) => match self.store.put(key, value) {
                Ok(()) => {
                    session.reply("Saved");
                    Outcome::healthy("set")
                }
                Err(e) => {
                    warn!("Config write {} failed: {}", key, e);
                    session.reply(format!("Save failed: {}", e));
                    Outcome::unhealthy(format!("config write {}: {}", key, e))
                }
            },
        }
    }
}

#[async_trait]
impl Dispatcher for BasicShell {
    async fn execute(&mut self, line: &str, session: &mut SessionView<'_>) -> SockShellResult<Outcome> {
        debug!("shell <- {:?} (configure: {})", line, session.configure_mode());

        match line {
            "" => return Ok(Outcome::healthy("")),
            "help" => {
                for row in HELP {
                    session.reply(*row);
                }
                return Ok(Outcome::healthy("help"));
            }
            "conf" => {
                session.set_configure_mode(true);
                session.set_prompt_prefix(CONFIGURE_PREFIX);
                return Ok(Outcome::healthy("conf"));
            }
            "noconf" => {
                session.set_configure_mode(false);
                session.set_prompt_prefix("");
                return Ok(Outcome::healthy("noconf"));
            }
            _ => {}
        }

        if session.configure_mode() {
            return Ok(self.configure(line, session));
        }

        if let Some(text) = line.strip_prefix("echo") {
            if text.is_empty() || text.starts_with(char::is_whitespace) {
                session.reply(text.trim());
                return Ok(Outcome::healthy("echo"));
            }
        }

        session.reply(format!("Unknown command: {} (try help)", line));
        Ok(Outcome::healthy("unknown"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::state::ShellState;
    use crate::domain::config::KEY_DEVICE_NAME;
    use crate::domain::error::SockShellError;
    use crate::infrastructure::config::MemoryConfigStore;

    async fn run(shell: &mut BasicShell, state: &mut ShellState, line: &str) -> (Outcome, Vec<String>) {
        let mut view = SessionView::new(state);
        let outcome = shell.execute(line, &mut view).await.unwrap();
        (outcome, view.into_replies())
    }

    struct ReadOnlyStore;

    impl ConfigStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn put(&self, _key: &str, _value: &str) -> SockShellResult<()> {
            Err(SockShellError::Config { message: "read-only".to_string() })
        }

        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_echo_and_unknown() {
        let mut shell = BasicShell::new(Arc::new(MemoryConfigStore::new()));
        let mut state = ShellState::default();

        let (outcome, replies) = run(&mut shell, &mut state, "echo hi there").await;
        assert!(outcome.healthy);
        assert_eq!(replies, vec!["hi there"]);

        let (outcome, replies) = run(&mut shell, &mut state, "echoes").await;
        assert!(outcome.healthy);
        assert!(replies[0].contains("Unknown command"));
    }

    #[tokio::test]
    async fn test_configure_mode_roundtrip() {
        let store = Arc::new(MemoryConfigStore::new());
        let mut shell = BasicShell::new(store.clone());
        let mut state = ShellState::default();

        run(&mut shell, &mut state, "conf").await;
        assert!(state.configure_mode);
        assert_eq!(state.prompt_prefix, CONFIGURE_PREFIX);

        let (_, replies) = run(&mut shell, &mut state, "devfid mydevice").await;
        assert_eq!(replies, vec!["Saved"]);
        assert_eq!(store.get(KEY_DEVICE_NAME).as_deref(), Some("mydevice"));

        let (_, replies) = run(&mut shell, &mut state, "devfid").await;
        assert_eq!(replies, vec!["mydevice"]);

        let (_, replies) = run(&mut shell, &mut state, "dump").await;
        assert!(replies.iter().any(|row| row.contains("devfid") && row.contains("mydevice")));

        run(&mut shell, &mut state, "noconf").await;
        assert_eq!(state, ShellState::default());
    }

    #[tokio::test]
    async fn test_failed_write_is_unhealthy() {
        let mut shell = BasicShell::new(Arc::new(ReadOnlyStore));
        let mut state = ShellState::default();

        run(&mut shell, &mut state, "conf").await;
        let (outcome, replies) = run(&mut shell, &mut state, "socport 1").await;
        assert!(!outcome.healthy);
        assert!(replies[0].starts_with("Save failed"));
    }

    #[test]
    fn test_help_blocking() {
        let mut shell = BasicShell::new(Arc::new(MemoryConfigStore::new()));
        let mut state = ShellState::default();

        let (outcome, replies) = tokio_test::block_on(run(&mut shell, &mut state, "help"));
        assert!(outcome.healthy);
        assert_eq!(replies.len(), HELP.len());
    }
}
