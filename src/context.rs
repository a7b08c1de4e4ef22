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

//! Ties the preparser, tokeniser, parser, and interpreter into one
//! incrementally-fed parsing session.
//!
//! A [`ParserContext`] owns every piece of state that must persist across
//! calls to [`ParserContext::feed`]: the mode stack, the here-document
//! queues, the in-progress parser tree, the NUL/continuation scrubber, and
//! the running line count. The ring-buffer driver only owns the raw byte
//! window; everything about what the bytes *mean* lives here.

use crate::ast::Statement;
use crate::error::{Error, Result, SyntaxError, WarningSink};
use crate::heredoc::HereDocStack;
use crate::interpreter;
use crate::lexer;
use crate::modes::ModeStack;
use crate::parser::{location_at_line, ParserBuilder};
use crate::preparser::Preparser;

/// Flags observed once at startup and read-only thereafter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// Disables non-portable operators and syntax extensions.
    pub posix_mode: bool,
    /// Advisory only; the core attaches no behaviour to it beyond carrying
    /// it through.
    pub login_shell: bool,
    /// Suppresses the "ignoring NUL byte" warning, since a human typing at
    /// a terminal cannot produce one deliberately.
    pub tty_input: bool,
    /// Set while re-parsing a backquote expression's captured text: root
    /// commands are collected but never handed to the interpreter a second
    /// time from here, since the tokeniser's `BQ_QUOTE` close already feeds
    /// them through a nested context of their own.
    pub do_not_run: bool,
}

/// One parsing session: every [`ParserContext::feed`] call advances the
/// mode stack, here-document queues, and parser tree in place and returns
/// the [`Statement`]s that became ready at the root nesting level.
pub struct ParserContext {
    options: ParseOptions,
    preparser: Preparser,
    modes: ModeStack,
    heredocs: HereDocStack,
    builder: ParserBuilder,
    tokeniser_line: u64,
    /// Scrubbed text the tokeniser has not yet fully consumed. A chunk
    /// handed to [`ParserContext::feed`] is scrubbed and appended here in
    /// full; what the tokeniser can't finish this round (a token running
    /// off the end of what's available) stays for the next call instead of
    /// being dropped.
    pending: String,
}

impl ParserContext {
    pub fn new(options: ParseOptions) -> Self {
        ParserContext {
            options,
            preparser: Preparser::new(),
            modes: ModeStack::new(),
            heredocs: HereDocStack::new(),
            builder: ParserBuilder::new(options.posix_mode),
            tokeniser_line: 1,
            pending: String::new(),
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Scrubs, tokenises, parses, and (at the root nesting level)
    /// interprets as much of `raw` as it can without more data. Returns the
    /// statements that completed and how many bytes of `raw` the preparser
    /// actually consumed; the ring-buffer driver keeps the remainder
    /// prefixed to the next read.
    pub fn feed(&mut self, raw: &str, at_eof: bool, warnings: &mut dyn WarningSink) -> Result<(Vec<Statement>, usize)> {
        let (scrubbed, consumed) = self.preparser.scrub(raw, at_eof, self.options.tty_input, warnings);
        // Applied at scrub time rather than deferred to the end of the
        // token that spans the join: close enough for every diagnostic
        // that doesn't itself land inside a continued token, and far
        // simpler than threading a per-token correction through the
        // tokeniser.
        self.tokeniser_line += self.preparser.take_line_continuations();
        self.pending.push_str(&scrubbed);

        let outcome = lexer::scan(
            &self.pending,
            self.tokeniser_line,
            at_eof,
            &mut self.modes,
            &mut self.heredocs,
            self.options.posix_mode,
            warnings,
        );
        self.tokeniser_line += self.pending[..outcome.consumed].bytes().filter(|&b| b == b'\n').count() as u64;
        self.pending.drain(..outcome.consumed);

        let mut statements = Vec::new();
        for event in outcome.events {
            let commands = self.builder.feed(event, &mut self.heredocs, warnings)?;
            if !commands.is_empty() && !self.options.do_not_run {
                statements.extend(interpreter::interpret_program(commands, warnings)?);
            }
        }

        Ok((statements, consumed))
    }

    /// True once the parser tree has collapsed back to an empty root and
    /// every here-document queue has drained — the condition required at
    /// end of file.
    pub fn is_well_formed(&self) -> bool {
        self.builder.is_well_formed_at_eof() && self.heredocs.current_is_empty()
    }

    /// The error to raise when the input stream ends and
    /// [`ParserContext::is_well_formed`] is false.
    pub fn premature_eof_error(&self) -> Error {
        Error::new(SyntaxError::PrematureEndOfFile, location_at_line(self.tokeniser_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use crate::source::Location;

    fn drive(src: &str, options: ParseOptions) -> Result<Vec<Statement>> {
        let mut ctx = ParserContext::new(options);
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        let mut remaining = src;
        let mut out = Vec::new();
        loop {
            let at_eof = remaining.is_empty();
            let (stmts, consumed) = ctx.feed(remaining, at_eof, &mut warnings)?;
            out.extend(stmts);
            remaining = &remaining[consumed..];
            if at_eof {
                break;
            }
        }
        if !ctx.is_well_formed() {
            return Err(ctx.premature_eof_error());
        }
        Ok(out)
    }

    #[test]
    fn feeds_a_whole_simple_command_in_one_chunk() {
        let stmts = drive("echo hello\n", ParseOptions::default()).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Statement::Simple(_)));
    }

    #[test]
    fn accumulates_across_several_feed_calls() {
        let options = ParseOptions::default();
        let mut ctx = ParserContext::new(options);
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        let (first, consumed1) = ctx.feed("echo hel", false, &mut warnings).unwrap();
        assert!(first.is_empty());
        let (second, _) = ctx.feed(&"echo hello\n"[consumed1..], true, &mut warnings).unwrap();
        assert_eq!(second.len(), 1);
        assert!(ctx.is_well_formed());
    }

    #[test]
    fn unterminated_quote_at_eof_is_not_well_formed() {
        let options = ParseOptions::default();
        let mut ctx = ParserContext::new(options);
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        ctx.feed("echo \"unterminated\n", true, &mut warnings).unwrap();
        assert!(!ctx.is_well_formed());
    }

    #[test]
    fn nul_bytes_are_scrubbed_before_tokenising() {
        let stmts = drive("echo\0 hi\n", ParseOptions::default()).unwrap();
        match &stmts[0] {
            Statement::Simple(cmd) => assert_eq!(cmd.arguments[0].to_string(), "echo"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
