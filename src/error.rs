// This file is part of oxsh, a POSIX-compatible command shell.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Diagnostics produced by the parsing core.

use crate::source::Location;
use thiserror::Error;

/// Fatal conditions that abort parsing.
///
/// Every variant corresponds to one of the fatal syntax errors or I/O
/// failures the core is specified to raise. The [`fmt::Display`]
/// implementation produces the short human-readable message; the
/// [`Location`] carried alongside a [`SyntaxError`] supplies the line
/// number for the `<progname>: <message> at line <N>` wire format.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum SyntaxError {
    #[error("premature end of command")]
    PrematureEndOfCommand,
    #[error("premature end of file")]
    PrematureEndOfFile,
    #[error("stray '{token}'")]
    StrayToken { token: String },
    #[error("missing right-hand side of '{operator}'")]
    MissingRedirectionOperand { operator: String },
    #[error("illegal variable name")]
    IllegalVariableName,
    #[error("invalid variable substitution")]
    InvalidVariableSubstitution,
    #[error("use of run-time evaluated expression as right-hand side of <<")]
    RuntimeExpressionAsHereDocTerminator,
    #[error("unclosed {opening}")]
    Unclosed { opening: &'static str },
    #[error("unsupported construct: {what}")]
    Unsupported { what: &'static str },
    #[error("I/O error: {message}")]
    Io { message: String },
}

/// A [`SyntaxError`] together with the location it was detected at.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{cause} at line {}", location.line_number())]
pub struct Error {
    pub cause: SyntaxError,
    pub location: Location,
}

impl Error {
    pub fn new(cause: SyntaxError, location: Location) -> Self {
        Error { cause, location }
    }

    /// Formats this error the way the CLI writes it to standard error:
    /// `<progname>: <message> at line <N>`.
    pub fn to_diagnostic(&self, progname: &str) -> String {
        format!("{progname}: {} at line {}\n", self.cause, self.location.line_number())
    }
}

/// Non-fatal conditions: parsing continues after one is raised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum Warning {
    #[error("ignoring NUL byte at line {line}")]
    IgnoredNulByte { line: u64 },
    #[error("backquote expression found, stop it!")]
    BackquoteExpressionFound,
    #[error("'{operator}' is a non-portable extension, rejected in POSIX mode")]
    NonPortableOperator { operator: String },
    #[error("meaningless escape '\\{escaped}' in backquote")]
    MeaninglessBackquoteEscape { escaped: char },
    #[error("NUL byte escape result ignored in $'...'")]
    NulEscapeIgnored,
}

/// A sink that collects [`Warning`]s as parsing proceeds.
///
/// The ring-buffer driver and tokeniser hold a `&mut dyn WarningSink`; tests
/// typically use a `Vec<(Warning, Location)>`.
pub trait WarningSink {
    fn warn(&mut self, warning: Warning, location: Location);
}

impl WarningSink for Vec<(Warning, Location)> {
    fn warn(&mut self, warning: Warning, location: Location) {
        self.push((warning, location));
    }
}

/// A sink that writes warnings to standard error in the documented format.
pub struct StderrWarningSink<'a> {
    pub progname: &'a str,
}

impl WarningSink for StderrWarningSink<'_> {
    fn warn(&mut self, warning: Warning, location: Location) {
        eprintln!(
            "{}: warning: {} at line {}",
            self.progname,
            warning,
            location.line_number()
        );
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format_matches_wire_format() {
        let err = Error::new(SyntaxError::PrematureEndOfFile, Location::dummy(""));
        assert_eq!(err.to_diagnostic("oxsh"), "oxsh: premature end of file at line 1\n");
    }
}
