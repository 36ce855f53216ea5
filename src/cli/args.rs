use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments for SockShell
#[derive(Parser, Debug)]
#[command(
    name = "sockshell",
    version = env!("CARGO_PKG_VERSION"),
    about = "Single-client TCP shell server for embedded devices",
    long_about = "A line-oriented remote shell server that serves exactly one client at a time, reconnects after every session and recovers from shell failures."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Node configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the shell server
    Serve(ServeArgs),
    /// Node configuration commands
    Config(ConfigArgs),
    /// Resolve and store the device unique id
    Uid {
        /// Network interface to read the MAC address from
        #[arg(long)]
        iface: Option<String>,
    },
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

/// Device platform profile
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    /// Memory constrained device with reclaim and hard reset
    Constrained,
    /// Host without recovery primitives
    Generic,
}

/// Server arguments
#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// Bind address, all interfaces when omitted
    #[arg(long, default_value = "")]
    pub host: String,

    /// Port, overrides the stored `socport`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Unique id, overrides the MAC derived id
    #[arg(long)]
    pub uid: Option<String>,

    /// Per-line read timeout in seconds, overrides the stored `soctout`
    #[arg(short, long)]
    pub timeout: Option<String>,

    /// Serve a single line and exit
    #[arg(long)]
    pub once: bool,

    /// Platform profile
    #[arg(long, value_enum, default_value = "generic")]
    pub platform: PlatformArg,

    /// Heap budget for the constrained profile, in kilobytes
    #[arg(long)]
    pub heap_budget_kb: Option<usize>,

    /// Network interface to read the MAC address from
    #[arg(long)]
    pub iface: Option<String>,
}

/// Configuration arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Read one value
    Get {
        /// Key name
        key: String,
    },
    /// Write one value
    Set {
        /// Key name
        key: String,
        /// New value
        value: String,
    },
    /// List every value
    Dump,
    /// Show the configuration file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let args = Args::try_parse_from(["sockshell", "serve"]).unwrap();
        match args.command {
            Command::Serve(serve) => {
                assert_eq!(serve.host, "");
                assert_eq!(serve.port, None);
                assert_eq!(serve.timeout, None);
                assert!(!serve.once);
                assert_eq!(serve.platform, PlatformArg::Generic);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.output, OutputFormat::Text);
    }

    #[test]
    fn test_serve_overrides() {
        let args = Args::try_parse_from([
            "sockshell", "serve", "--host", "127.0.0.1", "-p", "9100", "--uid", "aa1b2c",
            "-t", "30", "--once", "--platform", "constrained",
        ])
        .unwrap();

        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.host, "127.0.0.1");
        assert_eq!(serve.port, Some(9100));
        assert_eq!(serve.uid.as_deref(), Some("aa1b2c"));
        assert_eq!(serve.timeout.as_deref(), Some("30"));
        assert!(serve.once);
        assert_eq!(serve.platform, PlatformArg::Constrained);
    }

    #[test]
    fn test_bad_timeout_is_accepted_raw() {
        let args = Args::try_parse_from(["sockshell", "serve", "--timeout", "soon"]).unwrap();
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.timeout.as_deref(), Some("soon"));
    }

    #[test]
    fn test_config_commands() {
        let args =
            Args::try_parse_from(["sockshell", "-o", "json", "config", "set", "devfid", "mydevice"])
                .unwrap();
        assert_eq!(args.output, OutputFormat::Json);
        match args.command {
            Command::Config(ConfigArgs { command: ConfigCommand::Set { key, value } }) => {
                assert_eq!(key, "devfid");
                assert_eq!(value, "mydevice");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_command() {
        assert!(Args::try_parse_from(["sockshell", "telnet"]).is_err());
    }
}
