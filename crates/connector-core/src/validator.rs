//! Mount command grammar.
//!
//! A command is accepted only if it has the shape
//!
//! ```text
//! <launcher prefix> <mountpoint> -ourl=<endpoint> [flag | -o<value> | -o <value>]...
//! ```
//!
//! where the launcher prefix is one of [`LAUNCHER_PREFIXES`]. Nothing is
//! escaped or interpreted: rejection is purely structural, the values of
//! options are never inspected.
//!
//! Tokens are judged exactly as they will be executed. Callers that want
//! blank runs collapsed pass [`MountCommand::normalized`] and then execute
//! that same command.
//!
//! # Checks performed
//!
//! 1. The command starts with an allowed launcher prefix (longest match).
//! 2. At least three parameters follow the prefix.
//! 3. No parameter contains whitespace.
//! 4. Parameter 0 names an existing path.
//! 5. Parameter 1 carries the URL option marker.
//! 6. The remaining parameters pair every standalone `-o` with exactly one
//!    value.

use std::path::Path;

use connector_common::constants::{
    BOOLEAN_FLAGS, LAUNCHER_PREFIXES, OPTION_FLAG, URL_OPTION_MARKER,
};
use connector_common::types::MountCommand;
use thiserror::Error;

/// Reason a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The command does not start with an allowed launcher prefix.
    #[error("Oss Options: options with error prefix: {command}")]
    UnrecognizedPrefix {
        /// The full command as received.
        command: String,
    },

    /// Fewer than three parameters follow the prefix.
    #[error("Oss Options: parameters less than 3: {command}")]
    TooFewParameters {
        /// The full command as received.
        command: String,
    },

    /// A parameter contains whitespace and would not reach the program as
    /// the single argument it was checked as.
    #[error("Oss Options: parameter contains whitespace: {token:?}")]
    EmbeddedWhitespace {
        /// The offending parameter.
        token: String,
    },

    /// The mountpoint does not exist.
    #[error("Oss Options: mountpoint not exist {path}")]
    MountpointNotFound {
        /// The missing mountpoint.
        path: String,
    },

    /// Parameter 1 does not carry the URL option.
    #[error("Oss Options: url should start with -ourl: {token}")]
    MissingUrlOption {
        /// The offending parameter.
        token: String,
    },

    /// A flag appeared where the value of a standalone `-o` was expected.
    #[error("Oss Options: no expect string follow -o {token}")]
    FlagAfterOption {
        /// The offending flag.
        token: String,
    },

    /// Two standalone `-o` tokens in a row.
    #[error("Oss Options: duplicate -o, inputs must be -o string")]
    DuplicateOption,

    /// A value appeared without a preceding standalone `-o`.
    #[error("Oss Options: unexpected bare value {token}, inputs must be -o string")]
    UnexpectedBareValue {
        /// The offending value.
        token: String,
    },

    /// The command ends with a standalone `-o` that has no value.
    #[error("Oss Options: dangling -o, no value follows it")]
    DanglingOption,
}

/// Validates a mount command against the grammar.
///
/// # Errors
///
/// Returns the first [`Rejection`] encountered.
pub fn validate(command: &MountCommand) -> Result<(), Rejection> {
    let tokens = command.tokens();

    let prefix_len = match_prefix(tokens).ok_or_else(|| Rejection::UnrecognizedPrefix {
        command: command.to_string(),
    })?;
    let params = &tokens[prefix_len..];

    let [mountpoint, url_option, flags @ ..] = params else {
        return Err(Rejection::TooFewParameters {
            command: command.to_string(),
        });
    };
    if flags.is_empty() {
        return Err(Rejection::TooFewParameters {
            command: command.to_string(),
        });
    }

    if let Some(token) = params.iter().find(|t| t.contains(char::is_whitespace)) {
        return Err(Rejection::EmbeddedWhitespace {
            token: token.clone(),
        });
    }

    if !path_exists(Path::new(mountpoint)) {
        return Err(Rejection::MountpointNotFound {
            path: mountpoint.clone(),
        });
    }
    if !url_option.starts_with(URL_OPTION_MARKER) {
        return Err(Rejection::MissingUrlOption {
            token: url_option.clone(),
        });
    }

    check_flag_stream(flags.iter().map(String::as_str))?;
    tracing::debug!(command = %command, "mount command accepted");
    Ok(())
}

/// Returns the token count of the longest launcher prefix `tokens` starts
/// with.
fn match_prefix(tokens: &[String]) -> Option<usize> {
    LAUNCHER_PREFIXES
        .iter()
        .filter(|prefix| {
            prefix.len() <= tokens.len() && prefix.iter().zip(tokens).all(|(p, t)| *p == t)
        })
        .map(|prefix| prefix.len())
        .max()
}

/// Advisory existence check: only a definite "not found" counts as missing.
fn path_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != std::io::ErrorKind::NotFound,
    }
}

/// Shape of a single token in the flag stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagToken<'a> {
    /// `-s`, `-d`, `--debug`.
    Boolean(&'a str),
    /// `-o<value>` in a single token.
    CombinedOption(&'a str),
    /// A standalone `-o`.
    Option,
    /// Anything else.
    Value(&'a str),
}

impl<'a> FlagToken<'a> {
    fn classify(token: &'a str) -> Self {
        if BOOLEAN_FLAGS.contains(&token) {
            Self::Boolean(token)
        } else if token == OPTION_FLAG {
            Self::Option
        } else if token.starts_with(OPTION_FLAG) {
            Self::CombinedOption(token)
        } else {
            Self::Value(token)
        }
    }
}

/// State of the flag stream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagState {
    /// Next token must be a flag.
    ExpectFlag,
    /// Next token is the value of the preceding `-o`.
    ExpectOptionValue,
}

impl FlagState {
    fn step(self, token: FlagToken<'_>) -> Result<Self, Rejection> {
        match (self, token) {
            (Self::ExpectFlag, FlagToken::Boolean(_) | FlagToken::CombinedOption(_)) => {
                Ok(Self::ExpectFlag)
            }
            (Self::ExpectFlag, FlagToken::Option) => Ok(Self::ExpectOptionValue),
            (Self::ExpectFlag, FlagToken::Value(value)) => Err(Rejection::UnexpectedBareValue {
                token: value.to_owned(),
            }),
            (
                Self::ExpectOptionValue,
                FlagToken::Boolean(flag) | FlagToken::CombinedOption(flag),
            ) => Err(Rejection::FlagAfterOption {
                token: flag.to_owned(),
            }),
            (Self::ExpectOptionValue, FlagToken::Option) => Err(Rejection::DuplicateOption),
            (Self::ExpectOptionValue, FlagToken::Value(_)) => Ok(Self::ExpectFlag),
        }
    }
}

fn check_flag_stream<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<(), Rejection> {
    let end = tokens
        .into_iter()
        .map(FlagToken::classify)
        .try_fold(FlagState::ExpectFlag, FlagState::step)?;
    match end {
        FlagState::ExpectFlag => Ok(()),
        FlagState::ExpectOptionValue => Err(Rejection::DanglingOption),
    }
}
