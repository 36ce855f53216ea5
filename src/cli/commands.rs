use crate::cli::args::{Args, Command, ConfigCommand, PlatformArg, ServeArgs};
use crate::cli::output::{ConfigEntry, ConsoleWriter, OutputWriter};
use crate::core::identity::resolve_uid;
use crate::core::platform::{GenericPlatform, Platform};
use crate::core::protocol::PROTOCOL_VERSION;
use crate::core::session::{RunExit, RunMode, Session, SessionDeps};
use crate::core::shell::BasicShell;
use crate::domain::config::{ConfigStore, ServerOptions};
use crate::infrastructure::config::TomlConfigStore;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::platform::{
    ConstrainedPlatform, SysfsMacSource, DEFAULT_HEAP_BUDGET_KB, RESET_EXIT_CODE,
};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Execute CLI command, returning the process exit status
pub async fn execute_command(args: Args) -> anyhow::Result<i32> {
    let writer = ConsoleWriter::new(args.output.clone());

    if !args.quiet {
        init_logging(args.verbose).context("failed to initialize logging")?;
    }

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => TomlConfigStore::default_path()?,
    };

    match args.command {
        Command::Serve(serve_args) => execute_serve(serve_args, &config_path).await,
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &writer, &config_path)
        }
        Command::Uid { iface } => {
            let store = TomlConfigStore::open(&config_path)?;
            let mac = SysfsMacSource::new(iface);
            let uid = resolve_uid(None, Some(&mac), &store);
            writer.write_message(&uid)?;
            Ok(0)
        }
        Command::Version => {
            writer.write_message(&format!(
                "sockshell {} (protocol {})",
                env!("CARGO_PKG_VERSION"),
                PROTOCOL_VERSION
            ))?;
            Ok(0)
        }
    }
}

fn build_platform(args: &ServeArgs) -> Arc<dyn Platform> {
    match args.platform {
        PlatformArg::Constrained => Arc::new(ConstrainedPlatform::new(
            args.heap_budget_kb.unwrap_or(DEFAULT_HEAP_BUDGET_KB),
        )),
        PlatformArg::Generic => Arc::new(GenericPlatform),
    }
}

async fn execute_serve(args: ServeArgs, config_path: &Path) -> anyhow::Result<i32> {
    let store: Arc<dyn ConfigStore> = Arc::new(
        TomlConfigStore::open(config_path)
            .with_context(|| format!("failed to open {}", config_path.display()))?,
    );
    let platform = build_platform(&args);
    let mode = if args.once { RunMode::Once } else { RunMode::Loop };

    let options = ServerOptions {
        host: args.host,
        port: args.port,
        uid: args.uid,
        user_timeout: args.timeout,
    };
    let deps = SessionDeps {
        store: store.clone(),
        platform,
        dispatcher: Box::new(BasicShell::new(store)),
        mac_source: Some(Box::new(SysfsMacSource::new(args.iface))),
    };

    let mut session = Session::new(options, deps).context("failed to set up session")?;

    let result = tokio::select! {
        result = session.run(mode) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Keyboard interrupt in socket server");
            Ok(RunExit::Completed)
        }
    };
    session.shutdown();

    match result.context("session server failed")? {
        RunExit::Completed => Ok(0),
        RunExit::Halted => Ok(RESET_EXIT_CODE),
    }
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config_path: &Path,
) -> anyhow::Result<i32> {
    let store = TomlConfigStore::open(config_path)?;

    match command {
        ConfigCommand::Get { key } => match store.get(&key) {
            Some(value) => {
                writer.write_entries(&[ConfigEntry { key, value }])?;
                Ok(0)
            }
            None => {
                writer.write_error(&format!("No such key: {}", key))?;
                Ok(1)
            }
        },
        ConfigCommand::Set { key, value } => {
            store.put(&key, &value)?;
            writer.write_message(&format!("Saved {} = {}", key, value))?;
            Ok(0)
        }
        ConfigCommand::Dump => {
            let entries: Vec<ConfigEntry> = store
                .keys()
                .into_iter()
                .map(|key| {
                    let value = store.get(&key).unwrap_or_default();
                    ConfigEntry { key, value }
                })
                .collect();
            writer.write_entries(&entries)?;
            Ok(0)
        }
        ConfigCommand::Path => {
            writer.write_message(&store.path().display().to_string())?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use crate::domain::config::KEY_DEVICE_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_config_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("node_config.toml");
        let writer = ConsoleWriter::new(OutputFormat::Text);

        let status = execute_config_command(
            ConfigCommand::Set { key: KEY_DEVICE_NAME.to_string(), value: "mydevice".to_string() },
            &writer,
            &path,
        )
        .unwrap();
        assert_eq!(status, 0);

        let store = TomlConfigStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_DEVICE_NAME).as_deref(), Some("mydevice"));

        let status =
            execute_config_command(ConfigCommand::Get { key: "missing".to_string() }, &writer, &path)
                .unwrap();
        assert_eq!(status, 1);
    }

    #[test]
    fn test_build_platform() {
        let args = ServeArgs {
            host: String::new(),
            port: None,
            uid: None,
            timeout: None,
            once: false,
            platform: PlatformArg::Constrained,
            heap_budget_kb: Some(64),
            iface: None,
        };
        assert!(build_platform(&args).is_constrained());

        let args = ServeArgs { platform: PlatformArg::Generic, ..args };
        assert!(!build_platform(&args).is_constrained());
    }
}
