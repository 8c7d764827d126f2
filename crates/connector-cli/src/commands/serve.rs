//! `csiplugin-connector serve` — run the privileged mount daemon.

use std::process::ExitCode;

use anyhow::Context;
use connector_common::config::ConnectorConfig;
use connector_common::constants::APP_NAME;
use connector_core::executor::ProcessRunner;

/// Executes the `serve` command.
///
/// Runs until every watched peer socket is dead, then exits the process
/// with status 0. Without watched peers it runs forever.
///
/// # Errors
///
/// Returns an error if the runtime cannot start, the configuration is
/// invalid, or the socket cannot be bound.
pub fn execute(config: &ConnectorConfig) -> anyhow::Result<ExitCode> {
    tracing::info!(app = APP_NAME, version = env!("CARGO_PKG_VERSION"), "daemon is starting");
    if !nix::unistd::Uid::effective().is_root() {
        tracing::warn!("not running as root, mount commands will likely fail");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let summary = runtime
        .block_on(connector_daemon::run(config, ProcessRunner))
        .inspect_err(|e| tracing::error!(error = %e, "daemon stopped"))?;

    tracing::info!(
        dead = summary.dead,
        total = summary.total,
        "watchdog found every peer socket dead, exiting"
    );
    std::process::exit(0)
}
