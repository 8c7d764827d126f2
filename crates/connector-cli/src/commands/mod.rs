//! CLI command definitions and dispatch.

pub mod check;
pub mod config;
pub mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use connector_common::config::{ConnectorConfig, parse_socket_list};
use connector_common::constants;

/// csiplugin-connector — privileged mount daemon for the storage plugin.
#[derive(Parser, Debug)]
#[command(name = "csiplugin-connector", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Daemon settings shared by every subcommand.
    #[command(flatten)]
    pub daemon: DaemonArgs,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daemon (default).
    Serve,
    /// Validate a mount command without running it.
    Check(check::CheckArgs),
    /// Print the effective configuration as JSON.
    Config,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Settings that make up a [`ConnectorConfig`].
#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Path of the unix socket to bind.
    #[arg(long, global = true, default_value = constants::DEFAULT_SOCKET_PATH)]
    pub socket_path: PathBuf,

    /// Comma-separated peer sockets watched for liveness.
    #[arg(long, global = true, env = constants::WATCHDOG_SOCKETS_ENV, default_value = "")]
    pub watchdog_sockets: String,

    /// Maximum number of connections served at once.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Seconds a client may stay silent before being dropped.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_READ_TIMEOUT_SECS)]
    pub read_timeout_secs: u64,
}

impl DaemonArgs {
    /// Builds the daemon configuration from the parsed arguments.
    #[must_use]
    pub fn to_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            socket_path: self.socket_path.clone(),
            watchdog_sockets: parse_socket_list(&self.watchdog_sockets),
            max_connections: self.max_connections,
            read_timeout_secs: self.read_timeout_secs,
            ..ConnectorConfig::default()
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.daemon.to_config();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve::execute(&config),
        Command::Check(args) => check::execute(&args),
        Command::Config => config::execute(&config),
    }
}
