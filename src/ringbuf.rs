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

//! Drives a [`ParserContext`] from an arbitrary [`Read`] source.
//!
//! Bytes land in a growable buffer between a consumed cursor (`head`) and a
//! filled cursor (`tail`). Before every read, if the unfilled tail is
//! running low the buffer is compacted (the unconsumed window moved down to
//! offset zero) and, if still short, grown. Each read's newly available
//! window — decoded as UTF-8 up to its longest valid prefix, since a read
//! can land mid-character — is handed to the context; whatever it can't yet
//! finish stays in the buffer for the next read.

use crate::ast::Statement;
use crate::context::ParserContext;
use crate::error::{Error, Result, SyntaxError, WarningSink};
use crate::parser::location_at_line;
use std::io::Read;

const MIN_SPARE_CAPACITY: usize = 256;
const GROW_INCREMENT: usize = 4096;

/// Reads from `reader` and drives `ctx` until end of file, growing and
/// compacting an internal buffer as needed.
pub struct RingBuffer<R: Read> {
    reader: R,
    buf: Vec<u8>,
    /// Start of the unconsumed window.
    head: usize,
    /// End of the filled window.
    tail: usize,
}

impl<R: Read> RingBuffer<R> {
    pub fn new(reader: R) -> Self {
        RingBuffer {
            reader,
            buf: vec![0; MIN_SPARE_CAPACITY],
            head: 0,
            tail: 0,
        }
    }

    fn ensure_spare_capacity(&mut self) {
        if self.buf.len() - self.tail >= MIN_SPARE_CAPACITY {
            return;
        }
        if self.head > 0 {
            self.buf.copy_within(self.head..self.tail, 0);
            self.tail -= self.head;
            self.head = 0;
        }
        if self.buf.len() - self.tail < MIN_SPARE_CAPACITY {
            let new_len = self.buf.len() + GROW_INCREMENT;
            self.buf.resize(new_len, 0);
        }
    }

    /// Reads until end of file, feeding every chunk through `ctx`, and
    /// returns the whole parsed program. Fails with `Io` on a read error and
    /// with `PrematureEndOfFile` if the input ends with any nested
    /// construct still open.
    pub fn drive(&mut self, ctx: &mut ParserContext, warnings: &mut dyn WarningSink) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            self.ensure_spare_capacity();
            let n = self
                .reader
                .read(&mut self.buf[self.tail..])
                .map_err(|e| Error::new(SyntaxError::Io { message: e.to_string() }, location_at_line(1)))?;
            self.tail += n;
            let at_eof = n == 0;

            let window = &self.buf[self.head..self.tail];
            let (text, valid_len) = match std::str::from_utf8(window) {
                Ok(s) => (s, window.len()),
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    (std::str::from_utf8(&window[..valid_up_to]).expect("validated prefix"), valid_up_to)
                }
            };
            if at_eof && valid_len < window.len() {
                return Err(Error::new(
                    SyntaxError::Io { message: "invalid UTF-8 at end of input".to_string() },
                    location_at_line(1),
                ));
            }

            let (new_statements, consumed) = ctx.feed(text, at_eof, warnings)?;
            statements.extend(new_statements);
            self.head += consumed;

            if at_eof {
                return if ctx.is_well_formed() {
                    Ok(statements)
                } else {
                    Err(ctx.premature_eof_error())
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseOptions;
    use crate::error::Warning;
    use crate::source::Location;

    /// A reader that only ever hands back one byte per call, to exercise
    /// the incremental "need more data" paths a single large read would
    /// never reach.
    struct OneByteAtATime<'a> {
        remaining: &'a [u8],
    }

    impl Read for OneByteAtATime<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining.is_empty() {
                return Ok(0);
            }
            buf[0] = self.remaining[0];
            self.remaining = &self.remaining[1..];
            Ok(1)
        }
    }

    fn drive(src: &str) -> Result<Vec<Statement>> {
        let mut ring = RingBuffer::new(OneByteAtATime { remaining: src.as_bytes() });
        let mut ctx = ParserContext::new(ParseOptions::default());
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        ring.drive(&mut ctx, &mut warnings)
    }

    #[test]
    fn byte_at_a_time_input_still_parses() {
        let stmts = drive("echo hello\n").unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Statement::Simple(cmd) => assert_eq!(cmd.arguments.len(), 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn multiple_commands_all_arrive() {
        let stmts = drive("a\nb\nc\n").unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn unterminated_subshell_is_a_premature_eof() {
        let err = drive("echo $(echo hi\n").unwrap_err();
        assert!(matches!(err.cause, SyntaxError::PrematureEndOfFile));
    }

    #[test]
    fn growth_handles_input_larger_than_initial_capacity() {
        let long_arg = "x".repeat(MIN_SPARE_CAPACITY * 3);
        let src = format!("echo {long_arg}\n");
        let stmts = drive(&src).unwrap();
        match &stmts[0] {
            Statement::Simple(cmd) => assert_eq!(cmd.arguments[1].to_string(), long_arg),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
