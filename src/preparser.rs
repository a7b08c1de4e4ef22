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

//! The first pass over raw input: NUL scrubbing and backslash-newline
//! continuations.
//!
//! The tokeniser never sees a NUL byte or a `\`-then-newline pair; both are
//! removed here before the text reaches [`crate::lexer::scan`]. Dropping a
//! continuation does not, by itself, change the line count the tokeniser
//! sees — the newline simply isn't in the scrubbed text — so a token that
//! spans a continuation is attributed to the line it started on. What the
//! continuation *does* change is every line number from that point on in
//! the original source, which [`Preparser`] can no longer track on its own
//! once the joined line is handed off as one unit; it only counts how many
//! continuations it collapsed. The ring-buffer driver is the one with
//! access to the tokeniser's own line counter, and applies that many extra
//! increments once the token containing the join has finished parsing.

use crate::error::{Warning, WarningSink};
use crate::parser::location_at_line;

/// Scrubs NULs and collapses backslash-newline pairs out of a stream of
/// input chunks, tracking line numbers as it goes.
#[derive(Debug)]
pub struct Preparser {
    line_number: u64,
    line_continuations: u64,
}

impl Preparser {
    pub fn new() -> Self {
        Preparser { line_number: 1, line_continuations: 0 }
    }

    /// The line the next byte handed to [`Preparser::scrub`] starts on.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// How many backslash-newline pairs have been collapsed since the last
    /// [`Preparser::take_line_continuations`].
    pub fn line_continuations(&self) -> u64 {
        self.line_continuations
    }

    /// Drains the continuation counter, for the driver to fold into the
    /// tokeniser's line counter once it applies them.
    pub fn take_line_continuations(&mut self) -> u64 {
        std::mem::take(&mut self.line_continuations)
    }

    /// Scrubs as much of `input` as it can without more data, returning the
    /// cleaned text and how many bytes of `input` were consumed.
    ///
    /// A trailing lone `\` is left unconsumed when `at_eof` is false, since
    /// a newline arriving in the next chunk would turn it into a
    /// continuation rather than an ordinary backslash.
    pub fn scrub(
        &mut self,
        input: &str,
        at_eof: bool,
        tty_input: bool,
        warnings: &mut dyn WarningSink,
    ) -> (String, usize) {
        let mut out = String::with_capacity(input.len());
        let mut chars = input.char_indices().peekable();
        let mut consumed = input.len();

        while let Some(&(index, c)) = chars.peek() {
            match c {
                '\0' => {
                    if !tty_input {
                        warnings.warn(
                            Warning::IgnoredNulByte { line: self.line_number },
                            location_at_line(self.line_number),
                        );
                    }
                    chars.next();
                }
                '\n' => {
                    out.push('\n');
                    self.line_number += 1;
                    chars.next();
                }
                '\\' => {
                    chars.next();
                    match chars.peek() {
                        Some(&(_, '\n')) => {
                            chars.next();
                            self.line_continuations += 1;
                        }
                        Some(_) => out.push('\\'),
                        None if at_eof => out.push('\\'),
                        None => {
                            consumed = index;
                            break;
                        }
                    }
                }
                _ => {
                    out.push(c);
                    chars.next();
                }
            }
        }

        (out, consumed)
    }
}

impl Default for Preparser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Location;

    fn scrub(pre: &mut Preparser, input: &str, at_eof: bool) -> (String, usize, Vec<(Warning, Location)>) {
        let mut warnings = Vec::new();
        let (text, consumed) = pre.scrub(input, at_eof, false, &mut warnings);
        (text, consumed, warnings)
    }

    #[test]
    fn ordinary_text_passes_through_unchanged() {
        let mut pre = Preparser::new();
        let (text, consumed, warnings) = scrub(&mut pre, "echo hi\n", true);
        assert_eq!(text, "echo hi\n");
        assert_eq!(consumed, "echo hi\n".len());
        assert!(warnings.is_empty());
        assert_eq!(pre.line_number(), 2);
    }

    #[test]
    fn nul_bytes_are_dropped_with_a_warning() {
        let mut pre = Preparser::new();
        let (text, _, warnings) = scrub(&mut pre, "a\0b\n", true);
        assert_eq!(text, "ab\n");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].0, Warning::IgnoredNulByte { line: 1 }));
    }

    #[test]
    fn backslash_newline_is_collapsed_without_a_line_bump() {
        let mut pre = Preparser::new();
        let (text, _, _) = scrub(&mut pre, "echo \\\nhi\n", true);
        assert_eq!(text, "echo hi\n");
        assert_eq!(pre.take_line_continuations(), 1);
        assert_eq!(pre.line_number(), 2);
    }

    #[test]
    fn backslash_before_other_text_passes_through() {
        let mut pre = Preparser::new();
        let (text, _, _) = scrub(&mut pre, "a\\bc\n", true);
        assert_eq!(text, "a\\bc\n");
    }

    #[test]
    fn trailing_backslash_waits_for_more_input_unless_at_eof() {
        let mut pre = Preparser::new();
        let (text, consumed, _) = scrub(&mut pre, "echo \\", false);
        assert_eq!(text, "echo ");
        assert_eq!(consumed, "echo ".len());

        let (text, consumed, _) = scrub(&mut pre, "echo \\", true);
        assert_eq!(text, "echo \\");
        assert_eq!(consumed, "echo \\".len());
    }

    #[test]
    fn multibyte_characters_survive_scrubbing() {
        let mut pre = Preparser::new();
        let (text, consumed, _) = scrub(&mut pre, "echo caf\u{e9}\n", true);
        assert_eq!(text, "echo caf\u{e9}\n");
        assert_eq!(consumed, "echo caf\u{e9}\n".len());
    }
}
