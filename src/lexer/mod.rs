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

//! The mode-driven tokeniser.
//!
//! [`scan`] is the single dispatch described by the specification: given
//! the unconsumed window of source text and the current [`ModeStack`], it
//! consumes as much as it safely can and returns the [`Event`]s that
//! correspond to the parser primitives a hand-written lexer would call
//! directly (`push_quoted`, `push_symbol`, `push_enter`, …). Keeping them as
//! data rather than direct calls lets the ring-buffer driver feed them to
//! the parser one at a time and stop cleanly at a `need more data`
//! boundary.
//!
//! The shared sub-behaviours the specification calls out — `dollar_mode`,
//! `bquote_mode`, `backslash_mode`, the quote-body scan common to
//! `DQ_QUOTE`/`RRB_QUOTE`/`RB_QUOTE`/`SB_QUOTE`/`CB_QUOTE`/here-documents —
//! are each a named function below rather than a shared goto target.

pub mod op;

use crate::ast::NestedKind;
use crate::error::{Warning, WarningSink};
use crate::escape::decode_ansi_c;
use crate::heredoc::HereDocStack;
use crate::modes::{Mode, ModeStack};
use op::{Operator, scan as scan_operator};

/// One lexical event, corresponding 1:1 to a parser primitive call.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// `push_quoted`
    Quoted { text: String, line: u64 },
    /// `push_unquoted`
    Unquoted { text: String, line: u64 },
    /// `push_escaped` — decoded `$'…'` content, always literal like
    /// `Quoted` but kept distinct so the parser can tell ANSI-C decoding
    /// happened (relevant for diagnostics only).
    Escaped { text: String, line: u64 },
    /// `push_symbol`
    Operator { op: Operator, line: u64 },
    /// A bare `\n` that is not acting as a command terminator inside a
    /// quoting mode that swallows it (unused at top level; newlines at top
    /// level are reported through `Operator` with a synthetic newline
    /// marker). Kept separate from `Operator` because `\n` is not part of
    /// the operator trie.
    Newline { line: u64 },
    /// `push_whitespace`
    Whitespace,
    /// `push_enter`
    Enter { kind: NestedKind, line: u64 },
    /// `push_leave`
    Leave { line: u64 },
    /// End of file reached with the mode stack possibly still nested.
    EndOfFile,
    /// The body of the here-document at the front of the current queue has
    /// just been fully read (its terminator line matched). Distinct from
    /// [`Event::Leave`], which brackets nested parser states: a
    /// here-document close does not pop any parser-state nesting, only the
    /// pending-here-document queue entry.
    HereDocClose { line: u64 },
}

/// Outcome of one call to [`scan`].
pub struct Outcome {
    /// Bytes of `input` that were fully interpreted. The caller must not
    /// advance its read cursor past this point; any remainder is kept so a
    /// future call can see it prefixed to newly read bytes.
    pub consumed: usize,
    pub events: Vec<Event>,
}

/// Converts a byte offset within `input` to an absolute source line number,
/// given the line the first byte of `input` starts on.
fn line_at(input: &str, offset: usize, base_line: u64) -> u64 {
    base_line + input.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() as u64
}

/// Scans as many tokens as possible starting at the beginning of `input`.
///
/// `input` is the ring buffer's unconsumed window, always valid UTF-8 (the
/// preparser only ever removes bytes, never rewrites them). `base_line` is
/// the source line the first byte of `input` is on. `at_eof` tells the
/// scanner whether more bytes might still arrive: when false, a token that
/// runs off the end of `input` is incomplete and `scan` stops without
/// consuming it; when true, running off the end is either an error the
/// caller raises (unterminated quote) or, for an unquoted run, its natural
/// end.
pub fn scan(
    input: &str,
    base_line: u64,
    at_eof: bool,
    modes: &mut ModeStack,
    heredocs: &mut HereDocStack,
    posix_mode: bool,
    warnings: &mut dyn WarningSink,
) -> Outcome {
    let mut pos = 0usize;
    let mut events = Vec::new();
    loop {
        if pos >= input.len() {
            break;
        }
        let rest = &input[pos..];
        let line = line_at(input, pos, base_line);
        let step = match modes.top() {
            Mode::Normal => normal_mode(rest, line, at_eof, modes, heredocs, posix_mode, warnings),
            Mode::Comment => comment_mode(rest, line, at_eof, modes),
            Mode::DqQuote => {
                common_quote_mode(rest, line, at_eof, modes, '"', NestedKind::QuoteExpression)
            }
            Mode::BqQuote => bquote_mode(rest, line, at_eof, modes),
            Mode::RrbQuote | Mode::RbQuote | Mode::SbQuote => arith_quote_mode(rest, line, at_eof, modes),
            Mode::CbQuote => cb_quote_mode(rest, line, at_eof, modes),
            Mode::HereDocumentInit => heredoc_init_mode(rest, line, at_eof, modes, heredocs, warnings),
            Mode::HereDocument => heredoc_mode(rest, line, at_eof, modes, heredocs),
        };
        match step {
            Step::Progress { consumed, mut new_events } => {
                if consumed == 0 && new_events.is_empty() {
                    // Nothing happened; avoid spinning forever.
                    break;
                }
                // `Enter`/`Leave` bracket every nested parser state 1:1, so
                // they double as the trigger for here-document queue
                // nesting (`push_enter`ing into `$(…)`, `` `…` ``, `${…}`,
                // `((…))`, or a process substitution must not let a
                // here-document declared inside drain against the
                // enclosing line stream).
                for ev in &new_events {
                    match ev {
                        Event::Enter { .. } => heredocs.push_level(),
                        Event::Leave { .. } => {
                            heredocs.pop_level();
                        }
                        _ => {}
                    }
                }
                pos += consumed;
                events.append(&mut new_events);
            }
            Step::NeedMore => break,
        }
    }
    if at_eof && pos >= input.len() {
        events.push(Event::EndOfFile);
    }
    Outcome { consumed: pos, events }
}

enum Step {
    Progress { consumed: usize, new_events: Vec<Event> },
    NeedMore,
}

fn progress(consumed: usize, events: Vec<Event>) -> Step {
    Step::Progress { consumed, new_events: events }
}

const OPERATOR_LEAD: &[char] = &['<', '>', '&', '|', '(', ')', ';'];

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || OPERATOR_LEAD.contains(&c) || matches!(c, '\'' | '"' | '`' | '$' | '#')
}

/// `NORMAL` mode: top-level command text.
#[allow(clippy::too_many_arguments)]
fn normal_mode(
    s: &str,
    line: u64,
    at_eof: bool,
    modes: &mut ModeStack,
    heredocs: &mut HereDocStack,
    posix_mode: bool,
    warnings: &mut dyn WarningSink,
) -> Step {
    let mut chars = s.char_indices();
    let Some((_, c)) = chars.next() else {
        return Step::NeedMore;
    };

    if c == '\n' {
        modes.set_she_is_comment(true);
        let mut events = vec![Event::Newline { line }];
        if !heredocs.current_is_empty() {
            modes.push(Mode::HereDocumentInit);
        }
        return progress(1, events_take(&mut events));
    }

    if c.is_whitespace() {
        let end = s.char_indices().find(|&(_, c)| !c.is_whitespace() || c == '\n').map_or(s.len(), |(i, _)| i);
        modes.set_she_is_comment(true);
        return progress(end, vec![Event::Whitespace]);
    }

    if c == '#' && modes.she_is_comment() {
        modes.push(Mode::Comment);
        return progress(1, vec![]);
    }

    if c == ')' && !modes.is_at_top_level() {
        modes.pop();
        modes.set_she_is_comment(false);
        return progress(1, vec![Event::Leave { line }]);
    }

    if OPERATOR_LEAD.contains(&c) {
        let bytes = s.as_bytes();
        match scan_operator(bytes) {
            Some((op, len, needs_more)) if needs_more && !at_eof => return Step::NeedMore,
            Some((op, len, _)) => {
                if !op.is_portable() && posix_mode {
                    warnings.warn(
                        Warning::NonPortableOperator { operator: op.text().to_string() },
                        crate::source::Location::dummy(op.text()),
                    );
                }
                modes.set_she_is_comment(true);
                let mut evs = vec![Event::Operator { op, line }];
                // Subshells and process substitutions parse full command
                // grammar inside, so lexically they stay `NORMAL`; a fresh
                // `NORMAL` frame is pushed purely to give `)` something to
                // match against (see the `)` handling above).
                if matches!(op, Operator::OpenParen) {
                    evs.push(Event::Enter { kind: NestedKind::Subshell, line });
                    modes.push(Mode::Normal);
                } else if matches!(op, Operator::OpenParenOpenParen) {
                    evs.push(Event::Enter { kind: NestedKind::ArithmeticSubshell, line });
                    modes.push(Mode::RrbQuote);
                } else if matches!(op, Operator::LessOpenParen) {
                    evs.push(Event::Enter { kind: NestedKind::ProcessSubstitutionInput, line });
                    modes.push(Mode::Normal);
                } else if matches!(op, Operator::GreaterOpenParen) {
                    evs.push(Event::Enter { kind: NestedKind::ProcessSubstitutionOutput, line });
                    modes.push(Mode::Normal);
                } else if matches!(op, Operator::LessGreaterOpenParen) {
                    evs.push(Event::Enter { kind: NestedKind::ProcessSubstitutionInputOutput, line });
                    modes.push(Mode::Normal);
                }
                return progress(len, evs);
            }
            None => unreachable!("OPERATOR_LEAD byte must start an operator"),
        }
    }

    if c == '\'' {
        return squote_mode(s, line, at_eof);
    }

    if c == '"' {
        modes.push(Mode::DqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::QuoteExpression, line }]);
    }

    if c == '`' {
        warnings.warn(Warning::BackquoteExpressionFound, crate::source::Location::dummy("`"));
        modes.push(Mode::BqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::BackquoteExpression, line }]);
    }

    if c == '$' {
        return dollar_mode(s, line, at_eof, modes, posix_mode, warnings);
    }

    if c == '\\' {
        return backslash_mode(s, line, at_eof);
    }

    // A maximal run of plain bytes.
    let end = s
        .char_indices()
        .find(|&(_, c)| is_word_boundary(c))
        .map_or(s.len(), |(i, _)| i);
    if end == 0 {
        // Shouldn't happen (c already excluded all boundary classes above)
        // but guard against infinite loops regardless.
        return progress(c.len_utf8(), vec![Event::Unquoted { text: c.to_string(), line }]);
    }
    if end == s.len() && !at_eof {
        return Step::NeedMore;
    }
    progress(end, vec![Event::Unquoted { text: s[..end].to_string(), line }])
}

fn events_take(v: &mut Vec<Event>) -> Vec<Event> {
    std::mem::take(v)
}

/// `\x`: a single escaped byte, emitted as one `QUOTED` part.
fn backslash_mode(s: &str, line: u64, at_eof: bool) -> Step {
    let mut chars = s.char_indices();
    chars.next(); // the backslash itself
    let Some((i, c)) = chars.next() else {
        if at_eof {
            // Trailing lone backslash: treated as a literal backslash.
            return progress(1, vec![Event::Quoted { text: "\\".to_string(), line }]);
        }
        return Step::NeedMore;
    };
    if c == '\n' {
        // A line continuation reaching here means the preparser did not
        // collapse it (e.g. it is itself escaped); pass both bytes through
        // literally is wrong per POSIX, but an escaped backslash-newline
        // inside NORMAL mode outside quotes is not meaningful, so we treat
        // the backslash as escaping the newline into nothing, matching the
        // preparser's own collapsing rule applied one level late.
        return progress(i + c.len_utf8(), vec![]);
    }
    progress(i + c.len_utf8(), vec![Event::Quoted { text: c.to_string(), line }])
}

/// `'…'`: contents pushed verbatim as one `QUOTED` part.
fn squote_mode(s: &str, line: u64, at_eof: bool) -> Step {
    debug_assert_eq!(s.chars().next(), Some('\''));
    match s[1..].find('\'') {
        Some(rel) => progress(1 + rel + 1, vec![Event::Quoted { text: s[1..1 + rel].to_string(), line }]),
        None if at_eof => {
            // Unterminated; pass through what we have as a best-effort
            // recovery so the interpreter can still report a clean
            // diagnostic at the call site instead of losing location info.
            progress(s.len(), vec![Event::Quoted { text: s[1..].to_string(), line }])
        }
        None => Step::NeedMore,
    }
}

/// `$…`: dispatches `$(`, `$((`, `$[`, `${`, `$'…'`, or a plain `$` that
/// begins a `VARIABLE` reference (left to the interpreter to recognise;
/// the tokeniser just emits it as ordinary unquoted text).
fn dollar_mode(
    s: &str,
    line: u64,
    at_eof: bool,
    modes: &mut ModeStack,
    posix_mode: bool,
    warnings: &mut dyn WarningSink,
) -> Step {
    debug_assert_eq!(s.chars().next(), Some('$'));
    let rest = &s[1..];
    match rest.chars().next() {
        Some('(') if rest[1..].starts_with('(') => {
            modes.push(Mode::RrbQuote);
            progress(3, vec![Event::Enter { kind: NestedKind::ArithmeticExpression, line }])
        }
        Some('(') => {
            // `$(…)` parses full command grammar inside, same as a bare
            // subshell, so it stays lexically `NORMAL`; a fresh frame is
            // pushed so its `)` is told apart from an enclosing one.
            modes.push(Mode::Normal);
            progress(2, vec![Event::Enter { kind: NestedKind::SubshellSubstitution, line }])
        }
        Some('{') => {
            modes.push(Mode::CbQuote);
            progress(2, vec![Event::Enter { kind: NestedKind::VariableSubstitution, line }])
        }
        Some('[') => {
            if posix_mode {
                warnings.warn(
                    Warning::NonPortableOperator { operator: "$[".to_string() },
                    crate::source::Location::dummy("$["),
                );
            }
            modes.push(Mode::RbQuote);
            progress(2, vec![Event::Enter { kind: NestedKind::ArithmeticExpression, line }])
        }
        Some('\'') => {
            if posix_mode {
                warnings.warn(
                    Warning::NonPortableOperator { operator: "$'".to_string() },
                    crate::source::Location::dummy("$'"),
                );
            }
            dollar_squote_mode(s, line, at_eof)
        }
        _ => {
            // A plain `$name`/`$1`/`$@` etc. reference: left as unquoted
            // text for the interpreter's text-splitting pass to recognise.
            if !at_eof && rest.is_empty() {
                return Step::NeedMore;
            }
            progress(1, vec![Event::Unquoted { text: "$".to_string(), line }])
        }
    }
}

/// `$'…'`: ANSI-C quoted string, decoded immediately and pushed as one
/// `QUOTED` part (the decoded result needs no further expansion).
fn dollar_squote_mode(s: &str, line: u64, at_eof: bool) -> Step {
    // s starts with "$'"
    let body_start = 2;
    let mut i = body_start;
    let bytes = s.as_bytes();
    loop {
        if i >= bytes.len() {
            return if at_eof {
                let (decoded, _warnings) = decode_ansi_c(&bytes[body_start..i]);
                progress(i, vec![Event::Escaped { text: String::from_utf8_lossy(&decoded).into_owned(), line }])
            } else {
                Step::NeedMore
            };
        }
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == b'\'' {
            let (decoded, _warnings) = decode_ansi_c(&bytes[body_start..i]);
            return progress(i + 1, vec![Event::Escaped { text: String::from_utf8_lossy(&decoded).into_owned(), line }]);
        }
        i += 1;
    }
}

/// `COMMENT`: consumed up to but not including the terminating `\n`.
fn comment_mode(s: &str, _line: u64, at_eof: bool, modes: &mut ModeStack) -> Step {
    match s.find('\n') {
        Some(i) => {
            modes.pop();
            progress(i, vec![])
        }
        None if at_eof => progress(s.len(), vec![]),
        None => Step::NeedMore,
    }
}

/// Shared body for `DQ_QUOTE`/`RRB_QUOTE`/`RB_QUOTE`/`SB_QUOTE`: scans
/// plain text up to the mode's terminator, `$`, `` ` ``, `\`, or newline,
/// whichever comes first.
fn common_quote_mode(s: &str, line: u64, at_eof: bool, modes: &mut ModeStack, terminator: char, close_kind: NestedKind) -> Step {
    let mut chars = s.char_indices();
    let Some((_, c)) = chars.next() else {
        return Step::NeedMore;
    };
    if c == terminator {
        modes.pop();
        let _ = close_kind;
        return progress(1, vec![Event::Leave { line }]);
    }
    if c == '\\' {
        return dq_backslash_mode(s, line, at_eof);
    }
    if c == '$' {
        return dollar_mode(s, line, at_eof, modes, false, &mut NoWarnings);
    }
    if c == '`' {
        modes.push(Mode::BqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::BackquoteExpression, line }]);
    }
    let end = s
        .char_indices()
        .find(|&(_, c)| c == terminator || matches!(c, '\\' | '$' | '`'))
        .map_or(s.len(), |(i, _)| i);
    if end == 0 {
        return progress(c.len_utf8(), vec![Event::Quoted { text: c.to_string(), line }]);
    }
    if end == s.len() && !at_eof {
        return Step::NeedMore;
    }
    progress(end, vec![Event::Unquoted { text: s[..end].to_string(), line }])
}

struct NoWarnings;
impl WarningSink for NoWarnings {
    fn warn(&mut self, _warning: Warning, _location: crate::source::Location) {}
}

/// `\` inside double-quote-family modes: only `$`, `` ` ``, `"`, `\`, and
/// newline are escapable; any other character keeps its backslash.
fn dq_backslash_mode(s: &str, line: u64, at_eof: bool) -> Step {
    let mut chars = s.char_indices();
    chars.next();
    let Some((i, c)) = chars.next() else {
        return if at_eof {
            progress(1, vec![Event::Quoted { text: "\\".to_string(), line }])
        } else {
            Step::NeedMore
        };
    };
    match c {
        '$' | '`' | '"' | '\\' => progress(i + 1, vec![Event::Quoted { text: c.to_string(), line }]),
        '\n' => progress(i + 1, vec![]),
        _ => progress(i + 1, vec![Event::Unquoted { text: format!("\\{c}"), line }]),
    }
}

/// `BQ_QUOTE`: collects raw bytes verbatim up to a matching unescaped
/// `` ` ``, stripping the backslash from `\\`, `` \` ``, `\$`. The
/// collected text is handed to the interpreter as a [`Event::Leave`] and is
/// re-parsed through a fresh nested parser context at that point.
fn bquote_mode(s: &str, line: u64, at_eof: bool, modes: &mut ModeStack) -> Step {
    let mut chars = s.char_indices();
    let Some((_, c)) = chars.next() else {
        return Step::NeedMore;
    };
    if c == '`' {
        modes.pop();
        return progress(1, vec![Event::Leave { line }]);
    }
    if c == '\\' {
        let Some((i, c2)) = chars.next() else {
            return if at_eof {
                progress(1, vec![Event::Quoted { text: "\\".to_string(), line }])
            } else {
                Step::NeedMore
            };
        };
        return match c2 {
            '\\' | '`' | '$' => progress(i + c2.len_utf8(), vec![Event::Quoted { text: c2.to_string(), line }]),
            _ => progress(i + c2.len_utf8(), vec![Event::Unquoted { text: format!("\\{c2}"), line }]),
        };
    }
    let end = s.char_indices().find(|&(_, c)| matches!(c, '`' | '\\')).map_or(s.len(), |(i, _)| i);
    if end == 0 {
        return progress(c.len_utf8(), vec![Event::Unquoted { text: c.to_string(), line }]);
    }
    if end == s.len() && !at_eof {
        return Step::NeedMore;
    }
    progress(end, vec![Event::Unquoted { text: s[..end].to_string(), line }])
}

/// `RRB_QUOTE`/`RB_QUOTE`/`SB_QUOTE`: behaves like [`common_quote_mode`]
/// but tracks nested `(` so an inner arithmetic group's `)` does not
/// prematurely close the outer one, and closes on `))` (or `]`, handled by
/// the caller's mode).
fn arith_quote_mode(s: &str, line: u64, at_eof: bool, modes: &mut ModeStack) -> Step {
    let mode = modes.top();
    let mut chars = s.char_indices();
    let Some((_, c)) = chars.next() else {
        return Step::NeedMore;
    };
    match mode {
        Mode::RbQuote if c == ']' => {
            modes.pop();
            return progress(1, vec![Event::Leave { line }]);
        }
        Mode::SbQuote if c == ']' => {
            modes.pop();
            return progress(1, vec![Event::Leave { line }]);
        }
        Mode::RrbQuote if c == ')' => {
            if modes.paren_depth() > 0 {
                modes.adjust_paren_depth(-1);
                return progress(1, vec![Event::Unquoted { text: ")".to_string(), line }]);
            }
            if s[1..].starts_with(')') {
                modes.pop();
                return progress(2, vec![Event::Leave { line }]);
            }
            if at_eof || !s[1..].is_empty() {
                // Lone `)` inside arithmetic text (unbalanced from this
                // frame's perspective): pass through literally.
                return progress(1, vec![Event::Unquoted { text: ")".to_string(), line }]);
            }
            return Step::NeedMore;
        }
        Mode::RrbQuote if c == '(' => {
            modes.adjust_paren_depth(1);
            return progress(1, vec![Event::Unquoted { text: "(".to_string(), line }]);
        }
        _ => {}
    }
    if c == '\\' {
        return dq_backslash_mode(s, line, at_eof);
    }
    if c == '$' {
        return dollar_mode(s, line, at_eof, modes, false, &mut NoWarnings);
    }
    if c == '`' {
        modes.push(Mode::BqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::BackquoteExpression, line }]);
    }
    let stop = |c: char| matches!(c, '\\' | '$' | '`' | '(' | ')' | ']');
    let end = s.char_indices().find(|&(_, c)| stop(c)).map_or(s.len(), |(i, _)| i);
    if end == 0 {
        return progress(c.len_utf8(), vec![Event::Unquoted { text: c.to_string(), line }]);
    }
    if end == s.len() && !at_eof {
        return Step::NeedMore;
    }
    progress(end, vec![Event::Unquoted { text: s[..end].to_string(), line }])
}

/// `CB_QUOTE` (`${…}`): delegates the actual `${…}` grammar to the
/// interpreter (see [`crate::interpreter::braced_param`]); the tokeniser's
/// job here is only to find the matching `}` while still recognising `$`,
/// `` ` ``, and `\` inside, and to track nested `{…}` so a parameter
/// expansion's own braces (e.g. an arithmetic sub-expression) don't close
/// it early.
fn cb_quote_mode(s: &str, line: u64, at_eof: bool, modes: &mut ModeStack) -> Step {
    let mut chars = s.char_indices();
    let Some((_, c)) = chars.next() else {
        return Step::NeedMore;
    };
    if c == '}' {
        modes.pop();
        return progress(1, vec![Event::Leave { line }]);
    }
    if c == '\\' {
        return dq_backslash_mode(s, line, at_eof);
    }
    if c == '$' {
        return dollar_mode(s, line, at_eof, modes, false, &mut NoWarnings);
    }
    if c == '`' {
        modes.push(Mode::BqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::BackquoteExpression, line }]);
    }
    if c == '\'' {
        return squote_mode(s, line, at_eof);
    }
    if c == '"' {
        modes.push(Mode::DqQuote);
        return progress(1, vec![Event::Enter { kind: NestedKind::QuoteExpression, line }]);
    }
    let end = s
        .char_indices()
        .find(|&(_, c)| matches!(c, '}' | '\\' | '$' | '`' | '\'' | '"'))
        .map_or(s.len(), |(i, _)| i);
    if end == 0 {
        return progress(c.len_utf8(), vec![Event::Unquoted { text: c.to_string(), line }]);
    }
    if end == s.len() && !at_eof {
        return Step::NeedMore;
    }
    progress(end, vec![Event::Unquoted { text: s[..end].to_string(), line }])
}

/// `HERE_DOCUMENT_INIT`: the first byte of a line that must be consumed as
/// here-document setup. Nothing is actually scanned here beyond switching
/// mode — the terminator text was already collected while the redirection
/// operand was parsed — the parser resolves it and the tokeniser
/// transitions straight into [`Mode::HereDocument`].
fn heredoc_init_mode(
    s: &str,
    line: u64,
    _at_eof: bool,
    modes: &mut ModeStack,
    heredocs: &mut HereDocStack,
    _warnings: &mut dyn WarningSink,
) -> Step {
    if heredocs.current_is_empty() {
        modes.pop();
        return progress(0, vec![]);
    }
    modes.pop();
    modes.push(Mode::HereDocument);
    let _ = s;
    let _ = line;
    progress(0, vec![])
}

/// `HERE_DOCUMENT`: reads one full line at a time, comparing it (after
/// stripping leading tabs when indented) against the terminator, and
/// recognising `$`/`` ` ``/`\` escapes unless the here-document is
/// verbatim.
fn heredoc_mode(s: &str, line: u64, at_eof: bool, modes: &mut ModeStack, heredocs: &mut HereDocStack) -> Step {
    let Some(doc) = heredocs.current().front() else {
        modes.pop();
        return progress(0, vec![]);
    };
    let newline_pos = s.find('\n');
    if newline_pos.is_none() && !at_eof {
        return Step::NeedMore;
    }
    let line_end = newline_pos.unwrap_or(s.len());
    let raw_line = &s[..line_end];
    let stripped = if doc.indented {
        raw_line.trim_start_matches('\t')
    } else {
        raw_line
    };
    if stripped == doc.terminator {
        let consumed = line_end + usize::from(newline_pos.is_some());
        heredocs.current_mut().pop_front();
        let mut events = vec![Event::HereDocClose { line }];
        if heredocs.current_is_empty() {
            modes.pop();
        } else {
            modes.pop();
            modes.push(Mode::HereDocumentInit);
        }
        return progress(consumed, events_take(&mut events));
    }
    // Body line: emit it plus its trailing newline as one quoted/unquoted
    // chunk per the verbatim flag, recognising escapes only when not
    // verbatim. For simplicity (and because no single body line can ever
    // contain a structural mode change), it is emitted whole; `\$`, `` \` ``
    // and unescaped `$…`/`` `…` `` are left for the interpreter's text pass
    // to recognise when not verbatim, exactly as a double-quoted string is.
    let mut text = stripped.to_string();
    let consumed_body = line_end;
    let mut consumed = consumed_body;
    if newline_pos.is_some() {
        text.push('\n');
        consumed += 1;
    } else if at_eof {
        // Missing trailing newline at EOF inside a here-document is an
        // unterminated here-document; the caller (interpreter) reports it
        // once it notices the queue never drained.
    } else {
        return Step::NeedMore;
    }
    if doc.verbatim {
        progress(consumed, vec![Event::Quoted { text, line }])
    } else {
        progress(consumed, vec![Event::Unquoted { text, line }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heredoc::HereDocStack;
    use crate::modes::ModeStack;

    fn run(input: &str, posix: bool) -> (Vec<Event>, ModeStack) {
        let mut modes = ModeStack::new();
        let mut heredocs = HereDocStack::new();
        let mut warnings: Vec<(Warning, crate::source::Location)> = Vec::new();
        let outcome = scan(input, 1, true, &mut modes, &mut heredocs, posix, &mut warnings);
        assert_eq!(outcome.consumed, input.len(), "should fully consume at EOF");
        (outcome.events, modes)
    }

    #[test]
    fn tokenises_simple_command() {
        let (events, _) = run("echo hello\n", false);
        assert_eq!(
            events,
            vec![
                Event::Unquoted { text: "echo".to_string(), line: 1 },
                Event::Whitespace,
                Event::Unquoted { text: "hello".to_string(), line: 1 },
                Event::Newline { line: 1 },
                Event::EndOfFile,
            ]
        );
    }

    #[test]
    fn longest_match_operator_before_redirection() {
        let (events, _) = run("a<<<b\n", false);
        assert!(events.iter().any(|e| matches!(e, Event::Operator { op: Operator::LessLessLess, .. })));
    }

    #[test]
    fn single_quote_emits_literal_text() {
        let (events, _) = run("'a b'\n", false);
        assert_eq!(events[0], Event::Quoted { text: "a b".to_string(), line: 1 });
    }

    #[test]
    fn double_quote_opens_and_closes() {
        let (events, _) = run("\"a\"\n", false);
        assert!(matches!(events[0], Event::Enter { kind: NestedKind::QuoteExpression, .. }));
        assert!(events.iter().any(|e| matches!(e, Event::Leave { .. })));
    }

    #[test]
    fn comment_consumes_to_newline_only() {
        let (events, _) = run("echo# not a comment\n", false);
        // '#' immediately after a word is not a comment start.
        assert!(events.iter().any(|e| matches!(e, Event::Unquoted { text, .. } if text.contains('#'))));

        let (events2, _) = run("echo # a comment\n", false);
        assert!(!events2.iter().any(|e| matches!(e, Event::Unquoted{text, ..} if text.contains("comment"))));
    }

    #[test]
    fn dollar_paren_paren_opens_arithmetic() {
        let (events, modes) = run("$((1+1))\n", false);
        assert!(matches!(events[0], Event::Enter { kind: NestedKind::ArithmeticExpression, .. }));
        assert_eq!(modes.depth(), 1);
    }

    #[test]
    fn dollar_single_quote_decodes_escapes() {
        let (events, _) = run("$'a\\tb'\n", false);
        assert_eq!(events[0], Event::Escaped { text: "a\tb".to_string(), line: 1 });
    }

    #[test]
    fn adjacent_parens_are_a_single_operator_not_a_nested_state() {
        let (events, modes) = run("f()\n", false);
        assert_eq!(
            events,
            vec![
                Event::Unquoted { text: "f".to_string(), line: 1 },
                Event::Operator { op: Operator::OpenParenCloseParen, line: 1 },
                Event::Newline { line: 1 },
                Event::EndOfFile,
            ]
        );
        assert_eq!(modes.depth(), 0);
    }

    #[test]
    fn parens_with_whitespace_between_open_a_real_subshell() {
        let (events, modes) = run("f( )\n", false);
        assert!(matches!(events[1], Event::Enter { kind: NestedKind::Subshell, .. }));
        assert!(events.iter().any(|e| matches!(e, Event::Leave { .. })));
        assert_eq!(modes.depth(), 0);
    }

    #[test]
    fn posix_mode_warns_on_extension_operator() {
        let mut modes = ModeStack::new();
        let mut heredocs = HereDocStack::new();
        let mut warnings: Vec<(Warning, crate::source::Location)> = Vec::new();
        scan("a<<<b\n", 1, true, &mut modes, &mut heredocs, true, &mut warnings);
        assert!(warnings.iter().any(|(w, _)| matches!(w, Warning::NonPortableOperator { .. })));
    }
}
