//! Domain primitive types used across the connector workspace.

use std::fmt;

use serde::Serialize;

use crate::constants::TOKEN_DELIMITER;

/// A mount command as received from a client: an ordered token list.
///
/// The first token is the program, the rest are its literal arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountCommand(Vec<String>);

impl MountCommand {
    /// Creates a command from already-separated tokens.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Decodes a request payload by splitting on the NUL delimiter.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the validator sees
    /// the replacement characters and judges the tokens on their shape.
    #[must_use]
    pub fn from_wire(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        Self(text.split(TOKEN_DELIMITER).map(str::to_owned).collect())
    }

    /// Encodes the command in the wire format.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        self.0.join(TOKEN_DELIMITER).into_bytes()
    }

    /// Re-splits every token on whitespace.
    ///
    /// Runs of blanks collapse and empty tokens vanish, so the result is
    /// exactly the word list a program would see. Validation and execution
    /// both work on this form.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self(
            self.0
                .iter()
                .flat_map(|token| token.split_whitespace())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Returns the tokens in order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the command has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MountCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}
