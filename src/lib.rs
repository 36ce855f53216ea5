//! SockShell Library
//!
//! Single-client, line-oriented TCP shell server for embedded devices:
//! socket lifecycle, the `exit`/`hello`/`version` control protocol,
//! timeout driven reconnection and two-tier failure recovery.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{SockShellError, SockShellResult};
pub use crate::domain::config::{ConfigStore, ServerOptions};
pub use crate::core::dispatch::{Dispatcher, Outcome, SessionView};
pub use crate::core::platform::{GenericPlatform, MacSource, Platform};
pub use crate::core::session::{RunExit, RunMode, Session, SessionDeps};
pub use crate::infrastructure::config::{MemoryConfigStore, TomlConfigStore};
pub use crate::infrastructure::platform::{ConstrainedPlatform, SysfsMacSource};
