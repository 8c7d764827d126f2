//! `csiplugin-connector check` — validate a mount command offline.

use std::process::ExitCode;

use clap::Args;
use connector_common::types::MountCommand;
use connector_core::validator;
use serde::Serialize;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,

    /// The mount command, program first.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Verdict printed by `check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    accepted: bool,
    reason: Option<String>,
    command: MountCommand,
}

impl CheckReport {
    /// Judges `command` the way the daemon does, after whitespace
    /// normalization.
    fn new(command: &MountCommand) -> Self {
        let command = command.normalized();
        let reason = validator::validate(&command).err().map(|r| r.to_string());
        Self {
            accepted: reason.is_none(),
            reason,
            command,
        }
    }

    fn render_text(&self) -> String {
        match &self.reason {
            None => "accepted".to_owned(),
            Some(reason) => format!("rejected: {reason}"),
        }
    }
}

/// Executes the `check` command.
///
/// Exits with a failure code when the command is rejected.
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn execute(args: &CheckArgs) -> anyhow::Result<ExitCode> {
    let command = MountCommand::new(args.args.iter().cloned());
    let report = CheckReport::new(&command);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render_text());
    }

    Ok(if report.accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
