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

//! The argument and command assembler.
//!
//! The parser turns [`Event`](crate::lexer::Event)s from the tokeniser into
//! [`Argument`]s, [`Redirection`]s, and [`Command`]s. It does not know
//! anything about shell grammar — `if`, `for`, function definitions and the
//! rest are the [`crate::interpreter`]'s job. What it does know is how text
//! fragments glue into one argument, how a redirection operator consumes
//! its left- and right-hand sides, and how a nested substitution opens a
//! fresh sub-parse.
//!
//! Ownership of the parse tree is a stack rather than parent pointers: each
//! [`push_enter`](ParserBuilder::push_enter) pushes a new, empty
//! [`ParserState`] onto the builder's stack; each
//! [`push_leave`](ParserBuilder::push_leave) pops it and attaches it, fully
//! owned, to the part that opened it.

use crate::ast::{Argument, Command, Nested, NestedKind, Part, RedirKind, Redirection, Terminator};
use crate::error::{Error, Result, SyntaxError, WarningSink};
use crate::heredoc::{HereDocStack, PendingHereDoc};
use crate::lexer::op::Operator;
use crate::lexer::Event;
use crate::source::{Code, Location, Source};
use std::cell::RefCell;
use std::num::NonZeroU64;
use std::rc::Rc;

/// What the fragment arriving next is appended to.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// The argument currently being built.
    Argument,
    /// The right-hand side of `current_command.redirections[index]`, not
    /// yet committed to `commands`.
    RedirectionRhs(usize),
    /// The body of a here-document, whose owning command has already been
    /// committed to `commands[command_index]`.
    HereDocBody { command_index: usize, redirection_index: usize },
}

impl Default for Target {
    fn default() -> Self {
        Target::Argument
    }
}

/// A node of the parser tree: one in-progress (or, once popped, completed)
/// nested parse.
#[derive(Debug, Default)]
pub struct ParserState {
    /// Commands completed so far at this nesting level.
    pub commands: Vec<Command>,
    current_command: Command,
    current_argument: Argument,
    target: Target,
    /// Set while a redirection operator's right-hand side is being
    /// collected, so the assembler knows which kind it is closing.
    pending_redir_kind: Option<RedirKind>,
}

impl ParserState {
    pub fn new() -> Self {
        ParserState::default()
    }

    /// True if there is no in-progress command or argument left to flush —
    /// the condition required at end-of-file for this state to count as
    /// cleanly finished.
    pub fn is_clean(&self) -> bool {
        self.current_command.is_empty() && self.current_argument.is_empty() && self.pending_redir_kind.is_none()
    }

    /// Flushes whatever is left into `commands`, used both by ordinary
    /// end-of-file handling and by `push_leave` sealing a child state.
    fn flush_to_end(&mut self) {
        if !self.current_argument.is_empty() {
            let arg = std::mem::take(&mut self.current_argument);
            self.current_command.arguments.push(arg);
        }
        if !self.current_command.is_empty() {
            let mut cmd = std::mem::take(&mut self.current_command);
            cmd.terminator = Terminator::EndOfFile;
            self.commands.push(cmd);
        }
    }
}

impl std::fmt::Display for ParserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in &self.commands {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A synthetic [`Location`] pointing at `line` with no real source text
/// behind it, for diagnostics raised from events that only carry a bare
/// line number.
pub(crate) fn location_at_line(line: u64) -> Location {
    let value = "\n".repeat(line.saturating_sub(1) as usize);
    let len = value.len();
    Location {
        code: Rc::new(Code {
            value: RefCell::new(value),
            start_line_number: NonZeroU64::new(1).unwrap(),
            source: Source::Unknown,
        }),
        range: len..len,
    }
}

/// Drives a stack of [`ParserState`]s from a flat sequence of lexer
/// [`Event`]s.
pub struct ParserBuilder {
    stack: Vec<ParserState>,
    /// `NestedKind` of every non-root frame, parallel to `stack[1..]`.
    kinds: Vec<NestedKind>,
    posix_mode: bool,
    current_line: u64,
}

impl ParserBuilder {
    pub fn new(posix_mode: bool) -> Self {
        ParserBuilder {
            stack: vec![ParserState::new()],
            kinds: Vec::new(),
            posix_mode,
            current_line: 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.stack.len() == 1
    }

    fn top_mut(&mut self) -> &mut ParserState {
        self.stack.last_mut().expect("parser stack is never empty")
    }

    /// Feeds one lexer event through. Returns newly completed top-level
    /// commands (only ever non-empty when the event closed a command at
    /// the root state), ready for the interpreter.
    pub fn feed(
        &mut self,
        event: Event,
        heredocs: &mut HereDocStack,
        warnings: &mut dyn WarningSink,
    ) -> Result<Vec<Command>> {
        let _ = warnings; // reserved: no parser-level warning is raised yet.
        match event {
            Event::Quoted { text, line } => {
                self.current_line = line;
                self.push_text(Part::Quoted { text, line });
                Ok(Vec::new())
            }
            Event::Escaped { text, line } => {
                self.current_line = line;
                self.push_text(Part::Quoted { text, line });
                Ok(Vec::new())
            }
            Event::Unquoted { text, line } => {
                self.current_line = line;
                self.push_text(Part::Unquoted { text, line });
                Ok(Vec::new())
            }
            Event::Whitespace => {
                self.close_current_operand(heredocs)?;
                Ok(Vec::new())
            }
            Event::Newline { line } => {
                self.current_line = line;
                self.push_terminator(Terminator::Newline, heredocs)
            }
            Event::Operator { op, line } => {
                self.current_line = line;
                self.push_operator(op, heredocs)
            }
            Event::Enter { kind, line } => {
                self.current_line = line;
                self.push_enter(kind);
                Ok(Vec::new())
            }
            Event::Leave { line } => {
                self.current_line = line;
                self.push_leave(line)
            }
            Event::HereDocClose { line } => {
                self.current_line = line;
                Ok(self.close_here_doc(heredocs))
            }
            Event::EndOfFile => self.push_end_of_file(),
        }
    }

    /// `push_quoted` / `push_unquoted`: appends to whatever the current
    /// target is, merging into the previous part when it is the same kind
    /// on the same line, per the "consecutive parts of the same kind on
    /// the same line are appended" assembly rule.
    fn push_text(&mut self, part: Part) {
        let state = self.top_mut();
        let parts = match state.target {
            Target::Argument => &mut state.current_argument.parts,
            Target::RedirectionRhs(i) => {
                let redir = &mut state.current_command.redirections[i];
                redir.rhs.get_or_insert_with(Argument::new);
                &mut redir.rhs.as_mut().unwrap().parts
            }
            Target::HereDocBody { command_index, redirection_index } => {
                let redir = &mut state.commands[command_index].redirections[redirection_index];
                redir.rhs.get_or_insert_with(Argument::new);
                &mut redir.rhs.as_mut().unwrap().parts
            }
        };
        if let Some(last) = parts.last_mut() {
            if same_line_mergeable(last, &part) {
                merge_into(last, part);
                return;
            }
        }
        parts.push(part);
    }

    /// Closes whatever operand is currently open: an argument flushes into
    /// the command's argument list; a redirection operand (including a
    /// pending here-document terminator) is bound to its `Redirection`.
    /// A here-document body is not closed this way — only
    /// [`Event::HereDocClose`] ends one.
    fn close_current_operand(&mut self, heredocs: &mut HereDocStack) -> Result<()> {
        let state = self.top_mut();
        match state.target {
            Target::Argument => {
                if !state.current_argument.is_empty() {
                    let arg = std::mem::take(&mut state.current_argument);
                    state.current_command.arguments.push(arg);
                }
                Ok(())
            }
            Target::RedirectionRhs(index) => {
                let pending_kind = state.pending_redir_kind;
                if pending_kind == Some(RedirKind::HereDocument) {
                    self.finish_here_doc_operand(index, heredocs)?;
                }
                let state = self.top_mut();
                state.target = Target::Argument;
                state.pending_redir_kind = None;
                Ok(())
            }
            Target::HereDocBody { .. } => Ok(()),
        }
    }

    /// `push_symbol`: dispatches an operator either to redirection
    /// handling or to command-terminator handling.
    fn push_operator(&mut self, op: Operator, heredocs: &mut HereDocStack) -> Result<Vec<Command>> {
        use Operator::*;
        match op {
            Semicolon => self.push_terminator(Terminator::Semicolon, heredocs),
            SemicolonSemicolon => self.push_terminator(Terminator::DoubleSemicolon, heredocs),
            And => self.push_terminator(Terminator::Ampersand, heredocs),
            AndAnd => self.push_terminator(Terminator::And, heredocs),
            Bar => self.push_terminator(Terminator::Pipe, heredocs),
            BarBar => self.push_terminator(Terminator::Or, heredocs),
            BarAnd => self.push_terminator(Terminator::PipeAmpersand, heredocs),
            AndBar => self.push_terminator(Terminator::AmpersandPipe, heredocs),
            LessGreaterBar => self.push_terminator(Terminator::SocketPipe, heredocs),
            OpenParen | OpenParenOpenParen | CloseParen | LessOpenParen | GreaterOpenParen
            | LessGreaterOpenParen => {
                // Structural parens are handled entirely through the
                // tokeniser's `Enter`/`Leave` events; the bare operator
                // token itself does not touch argument/command state.
                Ok(Vec::new())
            }
            OpenParenCloseParen => {
                // The literal, adjacent `()` token: a function definition
                // marker. No `Enter`/`Leave` pair is involved, since the
                // tokeniser consumes both bytes as one operator.
                self.push_text(Part::FunctionMark { line: self.current_line });
                Ok(Vec::new())
            }
            _ => {
                self.push_redirection_operator(op, heredocs)?;
                Ok(Vec::new())
            }
        }
    }

    fn push_redirection_operator(&mut self, op: Operator, heredocs: &mut HereDocStack) -> Result<()> {
        self.close_current_operand(heredocs)?;
        let kind = redir_kind_for(op);
        let posix_mode = self.posix_mode;
        let state = self.top_mut();

        // A numeric or (outside POSIX mode) `$name` argument immediately
        // before the operator becomes its left-hand side instead of an
        // ordinary command argument.
        let lhs = if state.current_argument.is_numeric()
            || (!posix_mode && state.current_argument.is_simple_variable_reference())
        {
            Some(std::mem::take(&mut state.current_argument))
        } else {
            None
        };
        if lhs.is_none() && !state.current_argument.is_empty() {
            let arg = std::mem::take(&mut state.current_argument);
            state.current_command.arguments.push(arg);
        }

        let mut redir = Redirection::new(kind);
        redir.lhs = lhs;
        redir.here_doc_indented = matches!(op, Operator::LessLessDash);
        state.current_command.redirections.push(redir);
        let index = state.current_command.redirections.len() - 1;
        state.target = Target::RedirectionRhs(index);
        state.pending_redir_kind = Some(kind);
        Ok(())
    }

    /// Moves the just-collected here-document operand out of the
    /// redirection's `rhs` slot and into the pending-here-document queue
    /// as its terminator, per the "the operand text is actually the
    /// terminator, not file content" rule for `<<`/`<<-`.
    fn finish_here_doc_operand(&mut self, index: usize, heredocs: &mut HereDocStack) -> Result<()> {
        let line = self.current_line;
        let state = self.top_mut();
        let operand = state.current_command.redirections[index].rhs.take();
        let indented = state.current_command.redirections[index].here_doc_indented;
        match here_doc_terminator_text(operand) {
            Ok((terminator, verbatim)) => {
                state.current_command.redirections[index].here_doc_verbatim = verbatim;
                heredocs.current_mut().push(PendingHereDoc {
                    redirection_index: index,
                    terminator,
                    verbatim,
                    indented,
                });
                Ok(())
            }
            Err(()) => Err(Error::new(
                SyntaxError::RuntimeExpressionAsHereDocTerminator,
                location_at_line(line),
            )),
        }
    }

    /// `push_semicolon` (generalised to every terminator): closes the
    /// current command and, if a `<<`/`<<-` redirection was attached,
    /// arranges for the next line(s) to be read as its body. At the root
    /// with no parent, the completed command is handed to the caller for
    /// interpretation — unless a here-document body is still pending, in
    /// which case [`close_here_doc`](Self::close_here_doc) releases it once
    /// the body is bound.
    fn push_terminator(&mut self, terminator: Terminator, heredocs: &mut HereDocStack) -> Result<Vec<Command>> {
        self.close_current_operand(heredocs)?;

        let state = self.top_mut();
        if state.current_command.is_empty() {
            // A bare terminator with nothing before it, e.g. a blank line
            // or a stray `;`, produces no command.
            return Ok(Vec::new());
        }
        state.current_command.terminator = terminator;
        let command_index = state.commands.len();
        let cmd = std::mem::take(&mut state.current_command);
        state.commands.push(cmd);

        if let Some(first) = heredocs.current().front() {
            state.target = Target::HereDocBody {
                command_index,
                redirection_index: first.redirection_index,
            };
            // The command stays in `state.commands` — its here-document
            // redirection isn't bound yet — so it can't be handed to the
            // caller until `close_here_doc` sees the queue drain.
            return Ok(Vec::new());
        }

        if self.is_at_root() {
            Ok(std::mem::take(&mut self.top_mut().commands))
        } else {
            Ok(Vec::new())
        }
    }

    /// A here-document's body is finished; advance to the next one queued
    /// on this line, if any, or fall back to ordinary argument collection.
    /// Once the queue fully drains at the root nesting level, the commands
    /// that were held back by [`push_terminator`] are released.
    fn close_here_doc(&mut self, heredocs: &mut HereDocStack) -> Vec<Command> {
        let state = self.top_mut();
        if let Target::HereDocBody { command_index, redirection_index } = state.target {
            state.commands[command_index].redirections[redirection_index].kind = RedirKind::HereString;
            state.target = match heredocs.current().front() {
                Some(next) => Target::HereDocBody {
                    command_index,
                    redirection_index: next.redirection_index,
                },
                None => Target::Argument,
            };
        }
        if self.is_at_root() && heredocs.current_is_empty() {
            std::mem::take(&mut self.top_mut().commands)
        } else {
            Vec::new()
        }
    }

    /// `push_enter`: opens a fresh, empty nested parser state.
    fn push_enter(&mut self, kind: NestedKind) {
        self.stack.push(ParserState::new());
        self.kinds.push(kind);
    }

    /// `push_leave`: closes the top-of-stack state, attaching it as a
    /// `Part::Nested` on the parent's current argument (or redirection
    /// right-hand side).
    fn push_leave(&mut self, line: u64) -> Result<Vec<Command>> {
        if self.stack.len() <= 1 {
            // A stray `)`/`}` the tokeniser let through without a matching
            // opener.
            return Err(Error::new(
                SyntaxError::StrayToken { token: ")".to_string() },
                location_at_line(line),
            ));
        }
        self.top_mut().flush_to_end();
        let child = self.stack.pop().unwrap();
        let kind = self.kinds.pop().expect("kinds tracks stack[1..]");

        // A literal, byte-adjacent `()` never reaches here: the tokeniser
        // recognises it as its own operator and `push_operator` emits
        // `Part::FunctionMark` directly. Anything that does pop a `Subshell`
        // frame here — even one with nothing inside, e.g. `f( )` — had at
        // least whitespace or a newline between the parens, so it is a
        // genuine (if pointless) empty subshell, not a function marker.
        let part = Part::Nested {
            kind,
            child: Nested::Pending(Box::new(child)),
            line,
        };
        self.push_text(part);
        Ok(Vec::new())
    }

    /// `push_end_of_file`: flushes whatever is left.
    fn push_end_of_file(&mut self) -> Result<Vec<Command>> {
        self.top_mut().flush_to_end();
        if self.is_at_root() {
            Ok(std::mem::take(&mut self.top_mut().commands))
        } else {
            Ok(Vec::new())
        }
    }

    /// True only once every nested state has been popped back to the root
    /// with no leftovers — the condition the ring-buffer driver checks to
    /// decide whether to report a premature end of file.
    pub fn is_well_formed_at_eof(&self) -> bool {
        self.stack.len() == 1 && self.stack.last().map(ParserState::is_clean).unwrap_or(true)
    }
}

fn same_line_mergeable(last: &Part, new: &Part) -> bool {
    match (last, new) {
        (Part::Quoted { line: l1, .. }, Part::Quoted { line: l2, .. }) => l1 == l2,
        (Part::Unquoted { line: l1, .. }, Part::Unquoted { line: l2, .. }) => l1 == l2,
        _ => false,
    }
}

fn merge_into(last: &mut Part, new: Part) {
    match (last, new) {
        (Part::Quoted { text, .. }, Part::Quoted { text: more, .. }) => text.push_str(&more),
        (Part::Unquoted { text, .. }, Part::Unquoted { text: more, .. }) => text.push_str(&more),
        _ => unreachable!("same_line_mergeable guarantees matching variants"),
    }
}

fn redir_kind_for(op: Operator) -> RedirKind {
    use Operator::*;
    match op {
        Less => RedirKind::Input,
        Greater => RedirKind::Output,
        GreaterGreater => RedirKind::Append,
        GreaterBar => RedirKind::Clobber,
        LessGreater => RedirKind::ReadWrite,
        LessAnd => RedirKind::InputDup,
        GreaterAnd => RedirKind::OutputDup,
        LessLess | LessLessDash => RedirKind::HereDocument,
        LessLessLess => RedirKind::HereStringLiteral,
        LessGreaterAnd => RedirKind::Extension("<>&"),
        AndGreater => RedirKind::Extension("&>"),
        AndGreaterGreater => RedirKind::Extension("&>>"),
        AndGreaterAnd => RedirKind::Extension("&>&"),
        AndGreaterBar => RedirKind::Extension("&>|"),
        other => unreachable!("{other:?} is not a redirection operator"),
    }
}

/// Flattens a here-document operand into its terminator text, and reports
/// whether the terminator was quoted (body copied verbatim, no expansion).
/// A terminator containing a genuine run-time substitution (command,
/// arithmetic, or parameter expansion) is rejected: only plain and quoted
/// text may name a here-document terminator.
fn here_doc_terminator_text(operand: Option<Argument>) -> std::result::Result<(String, bool), ()> {
    let Some(operand) = operand else {
        return Ok((String::new(), false));
    };
    let mut text = String::new();
    let mut verbatim = false;
    for part in operand.parts {
        match part {
            Part::Unquoted { text: t, .. } => text.push_str(&t),
            Part::Quoted { text: t, .. } => {
                verbatim = true;
                text.push_str(&t);
            }
            Part::Nested { kind: NestedKind::QuoteExpression, child, .. } => {
                verbatim = true;
                match child {
                    Nested::Pending(state) => text.push_str(&state.to_string()),
                    Nested::Resolved(commands) => {
                        for c in &commands {
                            text.push_str(&c.to_string());
                        }
                    }
                }
            }
            _ => return Err(()),
        }
    }
    Ok((text, verbatim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use crate::heredoc::HereDocStack;

    fn feed_all(events: Vec<Event>, posix: bool) -> Vec<Command> {
        let mut builder = ParserBuilder::new(posix);
        let mut heredocs = HereDocStack::new();
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        let mut out = Vec::new();
        for ev in events {
            out.extend(builder.feed(ev, &mut heredocs, &mut warnings).unwrap());
        }
        out
    }

    fn unq(text: &str, line: u64) -> Event {
        Event::Unquoted { text: text.to_string(), line }
    }

    #[test]
    fn simple_command_assembles_two_arguments() {
        let events = vec![
            unq("echo", 1),
            Event::Whitespace,
            unq("hello", 1),
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].arguments.len(), 2);
        assert_eq!(commands[0].arguments[0].to_string(), "echo");
        assert_eq!(commands[0].arguments[1].to_string(), "hello");
        assert_eq!(commands[0].terminator, Terminator::Newline);
    }

    #[test]
    fn numeric_argument_before_redirection_becomes_lhs() {
        let events = vec![
            unq("cmd", 1),
            Event::Whitespace,
            unq("2", 1),
            Event::Operator { op: Operator::GreaterAnd, line: 1 },
            unq("1", 1),
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands[0].redirections.len(), 1);
        let redir = &commands[0].redirections[0];
        assert_eq!(redir.lhs.as_ref().unwrap().to_string(), "2");
        assert_eq!(redir.rhs.as_ref().unwrap().to_string(), "1");
        assert_eq!(commands[0].arguments.len(), 1);
    }

    #[test]
    fn dollar_name_argument_before_redirection_becomes_lhs_outside_posix_mode() {
        let events = vec![
            unq("cmd", 1),
            Event::Whitespace,
            unq("$fd", 1),
            Event::Operator { op: Operator::GreaterAnd, line: 1 },
            unq("1", 1),
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands[0].redirections.len(), 1);
        let redir = &commands[0].redirections[0];
        assert_eq!(redir.lhs.as_ref().unwrap().to_string(), "$fd");
        assert_eq!(commands[0].arguments.len(), 1);
    }

    #[test]
    fn dollar_name_argument_before_redirection_stays_an_argument_in_posix_mode() {
        let events = vec![
            unq("cmd", 1),
            Event::Whitespace,
            unq("$fd", 1),
            Event::Operator { op: Operator::GreaterAnd, line: 1 },
            unq("1", 1),
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, true);
        assert_eq!(commands[0].redirections.len(), 1);
        assert!(commands[0].redirections[0].lhs.is_none());
        assert_eq!(commands[0].arguments.len(), 2);
        assert_eq!(commands[0].arguments[1].to_string(), "$fd");
    }

    #[test]
    fn adjacent_parens_operator_marks_a_function_definition() {
        let events = vec![
            unq("f", 1),
            Event::Operator { op: Operator::OpenParenCloseParen, line: 1 },
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands[0].arguments.len(), 1);
        assert!(matches!(
            commands[0].arguments[0].parts.as_slice(),
            [Part::Unquoted { .. }, Part::FunctionMark { .. }]
        ));
    }

    #[test]
    fn parens_with_whitespace_between_stay_an_empty_subshell() {
        let events = vec![
            unq("f", 1),
            Event::Enter { kind: NestedKind::Subshell, line: 1 },
            Event::Whitespace,
            Event::Leave { line: 1 },
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands[0].arguments.len(), 1);
        assert!(matches!(
            commands[0].arguments[0].parts.as_slice(),
            [Part::Unquoted { .. }, Part::Nested { kind: NestedKind::Subshell, .. }]
        ));
    }

    #[test]
    fn nested_subshell_produces_pending_child() {
        let events = vec![
            unq("echo", 1),
            Event::Whitespace,
            Event::Enter { kind: NestedKind::Subshell, line: 1 },
            unq("x", 1),
            Event::Leave { line: 1 },
            Event::Newline { line: 1 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands[0].arguments.len(), 2);
        assert!(matches!(
            commands[0].arguments[1].parts.as_slice(),
            [Part::Nested { kind: NestedKind::Subshell, .. }]
        ));
    }

    #[test]
    fn here_document_body_binds_to_its_redirection() {
        let events = vec![
            unq("cat", 1),
            Event::Whitespace,
            Event::Operator { op: Operator::LessLess, line: 1 },
            unq("EOF", 1),
            Event::Newline { line: 1 },
            unq("body line", 2),
            Event::HereDocClose { line: 3 },
            Event::EndOfFile,
        ];
        let commands = feed_all(events, false);
        assert_eq!(commands.len(), 1);
        let redir = &commands[0].redirections[0];
        assert_eq!(redir.kind, RedirKind::HereString);
        assert_eq!(redir.rhs.as_ref().unwrap().to_string(), "body line");
    }

    #[test]
    fn stray_close_without_opener_is_an_error() {
        let mut builder = ParserBuilder::new(false);
        let mut heredocs = HereDocStack::new();
        let mut warnings: Vec<(Warning, Location)> = Vec::new();
        let err = builder.feed(Event::Leave { line: 1 }, &mut heredocs, &mut warnings);
        assert!(err.is_err());
    }
}
