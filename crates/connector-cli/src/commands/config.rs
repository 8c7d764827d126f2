//! `csiplugin-connector config` — print the effective configuration.

use std::process::ExitCode;

use connector_common::config::ConnectorConfig;

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or cannot be rendered.
#[allow(clippy::print_stdout)]
pub fn execute(config: &ConnectorConfig) -> anyhow::Result<ExitCode> {
    config.validate()?;
    println!("{}", config.to_json_pretty()?);
    Ok(ExitCode::SUCCESS)
}
