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

//! The grammar stage.
//!
//! The parser hands over a flat [`Vec<Command>`](Command) per nesting level,
//! plus a tree of still-[`Nested::Pending`] sub-parses hanging off individual
//! [`Part`]s. The interpreter's job is twofold: split unquoted text into
//! [`Part::Variable`] references, recursing into every pending sub-parse with
//! the right grammar for its kind; and, for the flat command stream at
//! `MAIN_BODY` scope (a command list, a subshell body, a backquote
//! expression, …), recognise the reserved-word grammar — `if`, `while`,
//! `until`, `for`, `{ … }`, and `name()` function definitions — turning the
//! flat stream into [`Statement`] trees.
//!
//! The source this core is modelled on drives that recognition with an
//! explicit requirement/state stack pushed and popped one reserved word at a
//! time. Here it is ordinary recursive descent over a
//! [`VecDeque<Command>`](std::collections::VecDeque): each grammar production
//! is a function that consumes the commands it needs and returns the
//! [`Statement`] it built. The two are equivalent in parsing power for the
//! constructs this core supports; the recursive form needs no separate state
//! enum to stay in sync with the grammar functions it drives.

pub mod braced_param;

use crate::ast::{Argument, Command, Nested, NestedKind, Part, Statement, Variable};
use crate::error::{Error, Result, SyntaxError, WarningSink};
use crate::parser::{location_at_line, ParserState};
use std::collections::VecDeque;

/// What grammar the flat command stream inside a nested sub-parse should be
/// read with. Kept small on purpose: every [`NestedKind`] maps onto one of
/// these three, never needing a requirement of its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DealingWith {
    /// Full reserved-word grammar: subshells, command/backquote
    /// substitutions, process substitutions, and the outermost program.
    MainBody,
    /// No grammar at all, just text: `"…"` and arithmetic expressions are a
    /// single flat run of text and nested substitutions, never multiple
    /// commands.
    TextRoot,
}

/// `${…}` is handled separately by [`resolve_braced_param`] rather than
/// through this dispatch, since its content collapses into a single
/// decomposed [`Part`] rather than another [`Nested`] wrapper.
fn dealing_with_for_kind(kind: NestedKind) -> DealingWith {
    use NestedKind::*;
    match kind {
        QuoteExpression | ArithmeticExpression | ArithmeticSubshell => DealingWith::TextRoot,
        BackquoteExpression | SubshellSubstitution | Subshell | ProcessSubstitutionInput
        | ProcessSubstitutionOutput | ProcessSubstitutionInputOutput => DealingWith::MainBody,
        VariableSubstitution => unreachable!("VariableSubstitution is resolved by resolve_braced_param"),
    }
}

const RESERVED_WORDS: &[&str] = &["if", "then", "elif", "else", "fi", "while", "until", "do", "done", "for", "in", "{", "}"];

/// Interprets the commands the parser built at one nesting level, per
/// `dealing_with`, recursing into any [`Nested::Pending`] sub-parse it finds
/// along the way.
pub fn interpret(commands: Vec<Command>, dealing_with: DealingWith, warnings: &mut dyn WarningSink) -> Result<Vec<Statement>> {
    let mut translated = Vec::with_capacity(commands.len());
    for cmd in commands {
        translated.push(translate_command(cmd, warnings)?);
    }
    match dealing_with {
        DealingWith::TextRoot => Ok(translated.into_iter().map(Statement::Simple).collect()),
        DealingWith::MainBody => interpret_grammar(translated),
    }
}

/// Entry point for a whole program: the root [`ParserState`]'s commands,
/// read with full grammar.
pub fn interpret_program(commands: Vec<Command>, warnings: &mut dyn WarningSink) -> Result<Vec<Statement>> {
    interpret(commands, DealingWith::MainBody, warnings)
}

/// Replaces every [`Part::Unquoted`] in `cmd` with `$name`-split parts and
/// recursively resolves every [`Nested::Pending`] it carries.
fn translate_command(mut cmd: Command, warnings: &mut dyn WarningSink) -> Result<Command> {
    let mut arguments = Vec::with_capacity(cmd.arguments.len());
    for arg in std::mem::take(&mut cmd.arguments) {
        arguments.push(Argument { parts: translate_parts(arg.parts, warnings)? });
    }
    cmd.arguments = arguments;
    for redir in &mut cmd.redirections {
        if let Some(lhs) = redir.lhs.take() {
            redir.lhs = Some(Argument { parts: translate_parts(lhs.parts, warnings)? });
        }
        if let Some(rhs) = redir.rhs.take() {
            redir.rhs = Some(Argument { parts: translate_parts(rhs.parts, warnings)? });
        }
    }
    Ok(cmd)
}

fn translate_parts(parts: Vec<Part>, warnings: &mut dyn WarningSink) -> Result<Vec<Part>> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Part::Unquoted { text, line } => out.extend(split_unquoted_variables(&text, line)),
            Part::Nested { kind: NestedKind::VariableSubstitution, child, line } => {
                out.push(resolve_braced_param(child, line, warnings)?);
            }
            Part::Nested { kind, child, line } => {
                let child = resolve_nested(kind, child, line, warnings)?;
                out.push(Part::Nested { kind, child, line });
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn resolve_nested(kind: NestedKind, child: Nested, line: u64, warnings: &mut dyn WarningSink) -> Result<Nested> {
    let Nested::Pending(mut state) = child else {
        return Ok(child);
    };
    if !state.is_clean() {
        return Err(Error::new(SyntaxError::Unclosed { opening: kind.open_close().0 }, location_at_line(line)));
    }
    let commands = std::mem::take(&mut state.commands);
    let resolved = interpret(commands, dealing_with_for_kind(kind), warnings)?;
    Ok(Nested::Resolved(resolved))
}

/// Resolves a `${…}` body straight into a decomposed [`Part`] — either a
/// plain [`Part::Variable`] or a [`Part::BracedParameter`] — rather than
/// wrapping it back up as a [`Part::Nested`].
fn resolve_braced_param(child: Nested, line: u64, warnings: &mut dyn WarningSink) -> Result<Part> {
    let Nested::Pending(mut state) = child else {
        return Err(Error::new(SyntaxError::InvalidVariableSubstitution, location_at_line(line)));
    };
    if !state.is_clean() {
        return Err(Error::new(SyntaxError::Unclosed { opening: "${" }, location_at_line(line)));
    }
    let commands = std::mem::take(&mut state.commands);
    let mut translated = Vec::with_capacity(commands.len());
    for cmd in commands {
        translated.push(translate_command(cmd, warnings)?);
    }
    let parts = translated
        .into_iter()
        .next()
        .and_then(|cmd| cmd.arguments.into_iter().next())
        .map(|a| a.parts)
        .unwrap_or_default();
    braced_param::decompose(parts, line)
}

/// Splits a run of unquoted text into literal runs and `$name`-style
/// [`Part::Variable`] references.
fn split_unquoted_variables(text: &str, line: u64) -> Vec<Part> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }
        let Some(&next) = chars.peek() else {
            literal.push('$');
            continue;
        };
        let var = match next {
            '@' => {
                chars.next();
                Some(Variable::AllPositionalSplit)
            }
            '*' => {
                chars.next();
                Some(Variable::AllPositionalJoined)
            }
            '?' => {
                chars.next();
                Some(Variable::LastExitStatus)
            }
            '#' => {
                chars.next();
                Some(Variable::PositionalCount)
            }
            '-' => {
                chars.next();
                Some(Variable::ShellOptions)
            }
            '$' => {
                chars.next();
                Some(Variable::ProcessId)
            }
            '!' => {
                chars.next();
                Some(Variable::LastBackgroundPid)
            }
            '~' => {
                chars.next();
                let mut user = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        user.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Some(Variable::TildeUser(user))
            }
            d if d.is_ascii_digit() => {
                chars.next();
                Some(Variable::Positional(d.to_digit(10).unwrap()))
            }
            a if a.is_alphabetic() || a == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Some(Variable::Name(name))
            }
            _ => None,
        };
        match var {
            Some(v) => {
                if !literal.is_empty() {
                    out.push(Part::Unquoted { text: std::mem::take(&mut literal), line });
                }
                out.push(Part::Variable { var: v, line });
            }
            None => literal.push('$'),
        }
    }
    if !literal.is_empty() || out.is_empty() {
        out.push(Part::Unquoted { text: literal, line });
    }
    out
}

// --- Reserved-word grammar -------------------------------------------------

fn is_bare_reserved(arg: &Argument) -> Option<&str> {
    match arg.parts.as_slice() {
        [Part::Unquoted { text, .. }] if RESERVED_WORDS.contains(&text.as_str()) => Some(text.as_str()),
        _ => None,
    }
}

/// A command whose first argument is one of the reserved words, and
/// nothing else, is a keyword acting alone (`then`, `fi`, `done`, …) — the
/// condition under which [`flatten_reserved_words`] splits it off.
fn reserved_word(cmd: &Command) -> Option<String> {
    match cmd.arguments.as_slice() {
        [a] => is_bare_reserved(a).map(str::to_string),
        _ => None,
    }
}

fn line_of(cmd: &Command) -> u64 {
    cmd.arguments.first().map(Argument::line).unwrap_or(0)
}

/// Splits a command whose first argument is a reserved word into the
/// keyword alone, plus whatever arguments followed it on the same line as a
/// fresh command carrying the original terminator/redirections — e.g.
/// `then echo hi` tokenises as one parser-level command, but grammatically
/// `then` ends the condition and `echo hi` starts the body.
fn split_reserved_prefix(mut cmd: Command) -> Vec<Command> {
    let word = match cmd.arguments.first() {
        Some(a) => match is_bare_reserved(a) {
            Some(w) => w.to_string(),
            None => return vec![cmd],
        },
        None => return vec![cmd],
    };
    let line = line_of(&cmd);
    cmd.arguments.remove(0);
    let mut head = Command::new();
    head.arguments.push(Argument { parts: vec![Part::Unquoted { text: word, line }] });
    if cmd.arguments.is_empty() && cmd.redirections.is_empty() && !cmd.have_bang {
        head.terminator = cmd.terminator;
        vec![head]
    } else {
        use crate::ast::Terminator;
        head.terminator = Terminator::Semicolon;
        vec![head, cmd]
    }
}

fn flatten_reserved_words(commands: Vec<Command>) -> VecDeque<Command> {
    commands.into_iter().flat_map(split_reserved_prefix).collect()
}

fn peek_word(queue: &VecDeque<Command>) -> Option<String> {
    queue.front().and_then(reserved_word)
}

fn expect_word(queue: &mut VecDeque<Command>, word: &str) -> Result<()> {
    match queue.pop_front() {
        Some(cmd) if reserved_word(&cmd).as_deref() == Some(word) => Ok(()),
        Some(cmd) => {
            let token = cmd.arguments.first().map(|a| a.to_string()).unwrap_or_default();
            Err(Error::new(SyntaxError::StrayToken { token }, location_at_line(line_of(&cmd))))
        }
        None => Err(Error::new(SyntaxError::PrematureEndOfCommand, location_at_line(0))),
    }
}

fn interpret_grammar(commands: Vec<Command>) -> Result<Vec<Statement>> {
    let mut queue = flatten_reserved_words(commands);
    parse_statement_list(&mut queue, &[])
}

fn parse_statement_list(queue: &mut VecDeque<Command>, terminators: &[&str]) -> Result<Vec<Statement>> {
    let mut out = Vec::new();
    while let Some(cmd) = queue.front() {
        if let Some(word) = reserved_word(cmd) {
            if terminators.contains(&word.as_str()) {
                break;
            }
        }
        out.push(parse_statement(queue)?);
    }
    Ok(out)
}

fn parse_statement(queue: &mut VecDeque<Command>) -> Result<Statement> {
    match peek_word(queue).as_deref() {
        Some("if") => parse_if(queue),
        Some("while") => parse_while(queue),
        Some("until") => parse_until(queue),
        Some("for") => parse_for(queue),
        Some("{") => parse_group(queue),
        _ => parse_simple_or_function(queue),
    }
}

fn parse_if(queue: &mut VecDeque<Command>) -> Result<Statement> {
    expect_word(queue, "if")?;
    let mut branches = Vec::new();
    loop {
        let condition = parse_statement_list(queue, &["then"])?;
        expect_word(queue, "then")?;
        let body = parse_statement_list(queue, &["elif", "else", "fi"])?;
        branches.push((condition, body));
        if peek_word(queue).as_deref() == Some("elif") {
            queue.pop_front();
            continue;
        }
        break;
    }
    let else_body = if peek_word(queue).as_deref() == Some("else") {
        queue.pop_front();
        Some(parse_statement_list(queue, &["fi"])?)
    } else {
        None
    };
    expect_word(queue, "fi")?;
    Ok(Statement::If { branches, else_body })
}

fn parse_while(queue: &mut VecDeque<Command>) -> Result<Statement> {
    expect_word(queue, "while")?;
    let condition = parse_statement_list(queue, &["do"])?;
    expect_word(queue, "do")?;
    let body = parse_statement_list(queue, &["done"])?;
    expect_word(queue, "done")?;
    Ok(Statement::While { condition, body })
}

fn parse_until(queue: &mut VecDeque<Command>) -> Result<Statement> {
    expect_word(queue, "until")?;
    let condition = parse_statement_list(queue, &["do"])?;
    expect_word(queue, "do")?;
    let body = parse_statement_list(queue, &["done"])?;
    expect_word(queue, "done")?;
    Ok(Statement::Until { condition, body })
}

fn parse_for(queue: &mut VecDeque<Command>) -> Result<Statement> {
    expect_word(queue, "for")?;
    let header = queue.pop_front().ok_or_else(|| Error::new(SyntaxError::PrematureEndOfCommand, location_at_line(0)))?;
    let mut args = header.arguments.into_iter();
    let variable = args.next().map(|a| a.to_string()).unwrap_or_default();
    let rest: Vec<Argument> = args.collect();
    let values = if rest.first().map_or(false, |a| a.is_bare_word("in")) {
        rest.into_iter().skip(1).collect()
    } else {
        rest
    };
    expect_word(queue, "do")?;
    let body = parse_statement_list(queue, &["done"])?;
    expect_word(queue, "done")?;
    Ok(Statement::For { variable, values, body })
}

fn parse_group(queue: &mut VecDeque<Command>) -> Result<Statement> {
    expect_word(queue, "{")?;
    let body = parse_statement_list(queue, &["}"])?;
    expect_word(queue, "}")?;
    Ok(Statement::Group(body))
}

fn is_function_mark(cmd: &Command) -> bool {
    cmd.arguments.first().map_or(false, |a| {
        a.parts.len() >= 2 && matches!(a.parts.last(), Some(Part::FunctionMark { .. }))
    })
}

fn parse_simple_or_function(queue: &mut VecDeque<Command>) -> Result<Statement> {
    let mut cmd = queue.pop_front().expect("checked non-empty by parse_statement_list");
    // `;;` only has meaning inside `case`, which this grammar doesn't
    // implement; outside one it's always a stray terminator.
    if cmd.terminator == crate::ast::Terminator::DoubleSemicolon {
        return Err(Error::new(SyntaxError::StrayToken { token: ";;".to_string() }, location_at_line(line_of(&cmd))));
    }
    if is_function_mark(&cmd) {
        let mut name = cmd.arguments.remove(0);
        name.parts.pop();
        let rest_args = std::mem::take(&mut cmd.arguments);
        if rest_args.first().map_or(false, |a| a.is_bare_word("{")) {
            let body_stmts = parse_statement_list(queue, &["}"])?;
            expect_word(queue, "}")?;
            return Ok(Statement::FunctionDefinition { name, body: Box::new(Statement::Group(body_stmts)) });
        }
        if rest_args.is_empty() {
            let body = parse_statement(queue)?;
            return Ok(Statement::FunctionDefinition { name, body: Box::new(body) });
        }
        cmd.arguments = rest_args;
        return Ok(Statement::FunctionDefinition { name, body: Box::new(Statement::Simple(cmd)) });
    }
    if cmd.arguments.first().map_or(false, |a| a.is_bare_word("!")) {
        cmd.arguments.remove(0);
        cmd.have_bang = true;
    }
    Ok(Statement::Simple(cmd))
}

/// Resolves the root [`ParserState`]'s leftover content at end of file —
/// used by the ring-buffer driver when the input ends mid-nesting to report
/// a clean diagnostic instead of an internal panic.
pub fn premature_eof_in(state: &ParserState) -> bool {
    !state.is_clean()
}
