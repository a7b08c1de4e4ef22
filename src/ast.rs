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

//! The elaborated command tree the core hands downstream.
//!
//! [`Command`] is the unit of execution the interpreter produces. Everything
//! it carries is built out of [`Argument`]s, which are themselves ordered
//! chains of [`Part`]s — the union-typed building block described by the
//! specification. A [`Part`] is either inert text or the root of a nested
//! sub-parse (a substitution, a subshell, a braced parameter expansion).

use crate::parser::ParserState;
use itertools::Itertools;
use std::fmt;

/// What kind of nested construct a [`Part::Nested`] or [`Part::Command`]
/// represents. Kept on the part itself (rather than inferred from context)
/// so error messages and `Display` can name the construct precisely.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NestedKind {
    /// `"…"`
    QuoteExpression,
    /// `` `…` ``
    BackquoteExpression,
    /// `$((…))`
    ArithmeticExpression,
    /// `${…}`
    VariableSubstitution,
    /// `$(…)`
    SubshellSubstitution,
    /// `<(…)`
    ProcessSubstitutionInput,
    /// `>(…)`
    ProcessSubstitutionOutput,
    /// `<>(…)`
    ProcessSubstitutionInputOutput,
    /// `(…)`
    Subshell,
    /// `((…))`
    ArithmeticSubshell,
}

impl NestedKind {
    pub fn open_close(self) -> (&'static str, &'static str) {
        use NestedKind::*;
        match self {
            QuoteExpression => ("\"", "\""),
            BackquoteExpression => ("`", "`"),
            ArithmeticExpression => ("$((", "))"),
            VariableSubstitution => ("${", "}"),
            SubshellSubstitution => ("$(", ")"),
            ProcessSubstitutionInput => ("<(", ")"),
            ProcessSubstitutionOutput => (">(", ")"),
            ProcessSubstitutionInputOutput => ("<>(", ")"),
            Subshell => ("(", ")"),
            ArithmeticSubshell => ("((", "))"),
        }
    }
}

/// Either a still-under-construction parser state or, once the interpreter
/// has run over it, the structured command tree it elaborated into.
///
/// This is the Rust rendering of the source's "the interpreter replaces a
/// child parser-state with an owned interpreter-state, freeing the old
/// parser state": instead of mutating a pointer in place we swap the enum
/// variant, and the old `ParserState` is dropped for free by the borrow
/// checker rather than by an explicit `free`.
#[derive(Debug)]
pub enum Nested {
    Pending(Box<ParserState>),
    Resolved(Vec<Statement>),
}

/// A grammar-level unit once the interpreter has recognised reserved-word
/// structure: either an ordinary [`Command`] or one of the compound forms
/// built out of the reserved-word grammar (`if`, `while`, `until`, `for`,
/// `{ … }`, function definitions).
#[derive(Debug)]
pub enum Statement {
    Simple(Command),
    If {
        /// `if`/`elif` branches in order: each pairs a condition command
        /// list with the body to run when it succeeds.
        branches: Vec<(Vec<Statement>, Vec<Statement>)>,
        else_body: Option<Vec<Statement>>,
    },
    While {
        condition: Vec<Statement>,
        body: Vec<Statement>,
    },
    Until {
        condition: Vec<Statement>,
        body: Vec<Statement>,
    },
    For {
        variable: String,
        values: Vec<Argument>,
        body: Vec<Statement>,
    },
    Group(Vec<Statement>),
    FunctionDefinition {
        name: Argument,
        body: Box<Statement>,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Simple(cmd) => write!(f, "{cmd}"),
            Statement::If { branches, else_body } => {
                for (i, (cond, body)) in branches.iter().enumerate() {
                    write!(f, "{} {}; then {}", if i == 0 { "if" } else { "elif" }, cond.iter().format(" "), body.iter().format(" "))?;
                }
                if let Some(body) = else_body {
                    write!(f, "else {}", body.iter().format(" "))?;
                }
                write!(f, "fi")
            }
            Statement::While { condition, body } => {
                write!(f, "while {}; do {}; done", condition.iter().format(" "), body.iter().format(" "))
            }
            Statement::Until { condition, body } => {
                write!(f, "until {}; do {}; done", condition.iter().format(" "), body.iter().format(" "))
            }
            Statement::For { variable, values, body } => {
                write!(f, "for {variable} in {}; do {}; done", values.iter().format(" "), body.iter().format(" "))
            }
            Statement::Group(body) => write!(f, "{{ {} }}", body.iter().format(" ")),
            Statement::FunctionDefinition { name, body } => write!(f, "{name} () {body}"),
        }
    }
}

/// One piece of a [`$name`] reference produced by the interpreter when it
/// splits unquoted text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Variable {
    /// `$name`
    Name(String),
    /// `$1`, `$2`, …
    Positional(u32),
    /// `$@`
    AllPositionalSplit,
    /// `$*`
    AllPositionalJoined,
    /// `$?`
    LastExitStatus,
    /// `$#`
    PositionalCount,
    /// `$-`
    ShellOptions,
    /// `$$`
    ProcessId,
    /// `$!`
    LastBackgroundPid,
    /// `$~user` home directory extension, empty `user` meaning the caller.
    TildeUser(String),
}

/// One of the nine POSIX `${name<op>word}` operators, plus the `${#name}`
/// length form. Produced only by [`crate::interpreter::braced_param`] when a
/// braced parameter expansion carries more than a bare name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BracedOperator {
    /// `${#name}`
    Length,
    /// `${name:-word}`
    DefaultIfUnset,
    /// `${name:=word}`
    AssignIfUnset,
    /// `${name:?word}`
    ErrorIfUnset,
    /// `${name:+word}`
    AlternateIfSet,
    /// `${name#word}`
    RemoveSmallestPrefix,
    /// `${name##word}`
    RemoveLargestPrefix,
    /// `${name%word}`
    RemoveSmallestSuffix,
    /// `${name%%word}`
    RemoveLargestSuffix,
}

impl fmt::Display for BracedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BracedOperator::*;
        let text = match self {
            Length => "#",
            DefaultIfUnset => ":-",
            AssignIfUnset => ":=",
            ErrorIfUnset => ":?",
            AlternateIfSet => ":+",
            RemoveSmallestPrefix => "#",
            RemoveLargestPrefix => "##",
            RemoveSmallestSuffix => "%",
            RemoveLargestSuffix => "%%",
        };
        f.write_str(text)
    }
}

/// A single part of an [`Argument`] chain.
#[derive(Debug)]
pub enum Part {
    /// Literal bytes with no further expansion: from `\x`, `'…'`, `$'…'`,
    /// here-document contents, or certain escapes inside double quotes.
    Quoted { text: String, line: u64 },
    /// Text subject to variable expansion, globbing, and tilde expansion at
    /// run time. Only ever produced by the tokeniser; the interpreter later
    /// splits it into [`Part::Variable`] and [`Part::Operator`] parts.
    Unquoted { text: String, line: u64 },
    /// A nested construct: `"…"`, `` `…` ``, `$((…))`, `${…}`, `$(…)`,
    /// process substitutions, `(…)`, `((…))`.
    Nested {
        kind: NestedKind,
        child: Nested,
        line: u64,
    },
    /// A literal `()` following a command name, marking a function
    /// definition.
    FunctionMark { line: u64 },
    /// A `$name`-style reference, produced only by the interpreter.
    Variable { var: Variable, line: u64 },
    /// Punctuation split out of unquoted text by the interpreter (currently
    /// unused by `$name` splitting but reserved for `${…}` operators
    /// re-surfaced as argument parts).
    Operator { text: String, line: u64 },
    /// A structured sub-command tree, produced by the interpreter when it
    /// replaces a resolved [`Part::Nested`] with its elaborated statements.
    Command { commands: Vec<Statement>, line: u64 },
    /// A decomposed `${name<op>word}` braced parameter expansion, produced
    /// by the interpreter in place of the raw [`NestedKind::VariableSubstitution`]
    /// it replaces. A bare `${name}` with no operator is represented as a
    /// plain [`Part::Variable`] instead; this variant only appears when an
    /// operator was present.
    BracedParameter {
        name: String,
        operator: Option<BracedOperator>,
        word: Option<Argument>,
        line: u64,
    },
}

impl Part {
    pub fn line(&self) -> u64 {
        match self {
            Part::Quoted { line, .. }
            | Part::Unquoted { line, .. }
            | Part::Nested { line, .. }
            | Part::FunctionMark { line }
            | Part::Variable { line, .. }
            | Part::Operator { line, .. }
            | Part::Command { line, .. }
            | Part::BracedParameter { line, .. } => *line,
        }
    }

    /// True for the "text-ish" parts admissible in a redirection's
    /// right-hand side and in ordinary argument concatenation.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Part::Quoted { .. }
                | Part::Unquoted { .. }
                | Part::Nested {
                    kind: NestedKind::QuoteExpression
                        | NestedKind::BackquoteExpression
                        | NestedKind::ArithmeticExpression
                        | NestedKind::VariableSubstitution
                        | NestedKind::SubshellSubstitution,
                    ..
                }
                | Part::Variable { .. }
                | Part::BracedParameter { .. }
        )
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Quoted { text, .. } => write!(f, "{text}"),
            Part::Unquoted { text, .. } => write!(f, "{text}"),
            Part::Nested { kind, child, .. } => {
                let (open, close) = kind.open_close();
                write!(f, "{open}")?;
                match child {
                    Nested::Pending(state) => write!(f, "{state}")?,
                    Nested::Resolved(commands) => {
                        write!(f, "{}", commands.iter().format(" "))?;
                    }
                }
                write!(f, "{close}")
            }
            Part::FunctionMark { .. } => write!(f, "()"),
            Part::Variable { var, .. } => write!(f, "{var}"),
            Part::Operator { text, .. } => write!(f, "{text}"),
            Part::Command { commands, .. } => write!(f, "{}", commands.iter().format(" ")),
            Part::BracedParameter { name, operator, word, .. } => {
                write!(f, "${{")?;
                if matches!(operator, Some(BracedOperator::Length)) {
                    write!(f, "#{name}")?;
                } else {
                    write!(f, "{name}")?;
                    if let Some(op) = operator {
                        write!(f, "{op}")?;
                    }
                    if let Some(word) = word {
                        write!(f, "{word}")?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Name(name) => write!(f, "${name}"),
            Variable::Positional(n) => write!(f, "${n}"),
            Variable::AllPositionalSplit => write!(f, "$@"),
            Variable::AllPositionalJoined => write!(f, "$*"),
            Variable::LastExitStatus => write!(f, "$?"),
            Variable::PositionalCount => write!(f, "$#"),
            Variable::ShellOptions => write!(f, "$-"),
            Variable::ProcessId => write!(f, "$$"),
            Variable::LastBackgroundPid => write!(f, "$!"),
            Variable::TildeUser(user) => write!(f, "$~{user}"),
        }
    }
}

/// A chain of [`Part`]s forming one shell word.
#[derive(Debug, Default)]
pub struct Argument {
    pub parts: Vec<Part>,
}

impl Argument {
    pub fn new() -> Self {
        Argument { parts: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The line the argument starts on, or 0 for an empty argument.
    pub fn line(&self) -> u64 {
        self.parts.first().map_or(0, Part::line)
    }

    /// True if this argument is a single unquoted word equal to `word`,
    /// which is the condition under which the interpreter treats a word as
    /// a candidate reserved word.
    pub fn is_bare_word(&self, word: &str) -> bool {
        matches!(
            self.parts.as_slice(),
            [Part::Unquoted { text, .. }] if text == word
        )
    }

    /// True if every part is `UNQUOTED` and consists only of ASCII digits;
    /// the condition under which a redirection operator's preceding
    /// argument becomes its left-hand-side file descriptor.
    pub fn is_numeric(&self) -> bool {
        !self.parts.is_empty()
            && self.parts.iter().all(|p| {
                matches!(p, Part::Unquoted { text, .. } if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
            })
    }

    /// True if this argument is exactly `$NAME` (a simple variable
    /// reference), the other form accepted as a redirection left-hand side
    /// outside POSIX mode. Checked against the raw `UNQUOTED` text the
    /// tokeniser produces — this runs during parsing, before the
    /// interpreter's `UNQUOTED`-to-`VARIABLE` splitting pass ever sees the
    /// argument, so `Part::Variable` can never appear here yet.
    pub fn is_simple_variable_reference(&self) -> bool {
        let [Part::Unquoted { text, .. }] = self.parts.as_slice() else {
            return false;
        };
        let Some(name) = text.strip_prefix('$') else {
            return false;
        };
        name.as_bytes().first().is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
            && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Tag distinguishing the ten redirection forms the tokeniser and
/// interpreter recognise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirKind {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
    /// `>|`
    Clobber,
    /// `<>`
    ReadWrite,
    /// `<&`
    InputDup,
    /// `>&`
    OutputDup,
    /// `<<` / `<<-`, rewritten to a `HereString` once its body is consumed.
    HereDocument,
    /// The resolved form of a here-document after its body has been read.
    HereString,
    /// `<<<`
    HereStringLiteral,
    /// `<>|`, `<>&` (extension socket/duplex forms), `&>`, `&>>`, `&>&`,
    /// `&>|` (combined stdout+stderr forms).
    Extension(&'static str),
}

impl fmt::Display for RedirKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirKind::Input => write!(f, "<"),
            RedirKind::Output => write!(f, ">"),
            RedirKind::Append => write!(f, ">>"),
            RedirKind::Clobber => write!(f, ">|"),
            RedirKind::ReadWrite => write!(f, "<>"),
            RedirKind::InputDup => write!(f, "<&"),
            RedirKind::OutputDup => write!(f, ">&"),
            RedirKind::HereDocument => write!(f, "<<"),
            RedirKind::HereString => write!(f, "<<(resolved)"),
            RedirKind::HereStringLiteral => write!(f, "<<<"),
            RedirKind::Extension(op) => write!(f, "{op}"),
        }
    }
}

/// A redirection attached to a [`Command`].
#[derive(Debug)]
pub struct Redirection {
    pub kind: RedirKind,
    /// File descriptor number or `$name` variable naming the left-hand
    /// side, if any.
    pub lhs: Option<Argument>,
    /// The target: a filename, a duplicated descriptor, or — once a
    /// here-document's body has been read — its decoded content.
    pub rhs: Option<Argument>,
    /// Whether a `<<-` here-document strips leading tabs from its body.
    pub here_doc_indented: bool,
    /// Whether the here-document terminator was quoted (body is literal,
    /// no expansion).
    pub here_doc_verbatim: bool,
}

impl Redirection {
    pub fn new(kind: RedirKind) -> Self {
        Redirection {
            kind,
            lhs: None,
            rhs: None,
            here_doc_indented: false,
            here_doc_verbatim: false,
        }
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lhs) = &self.lhs {
            write!(f, "{lhs}")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(rhs) = &self.rhs {
            write!(f, "{rhs}")?;
        }
        Ok(())
    }
}

/// What ended a [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    DoubleSemicolon,
    Semicolon,
    Newline,
    Ampersand,
    SocketPipe,
    Pipe,
    PipeAmpersand,
    AmpersandPipe,
    And,
    Or,
    /// The command was the last one before end-of-file, with no explicit
    /// terminator token.
    EndOfFile,
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::DoubleSemicolon => write!(f, ";;"),
            Terminator::Semicolon => write!(f, ";"),
            Terminator::Newline => writeln!(f),
            Terminator::Ampersand => write!(f, "&"),
            Terminator::SocketPipe => write!(f, "<>|"),
            Terminator::Pipe => write!(f, "|"),
            Terminator::PipeAmpersand => write!(f, "|&"),
            Terminator::AmpersandPipe => write!(f, "&|"),
            Terminator::And => write!(f, "&&"),
            Terminator::Or => write!(f, "||"),
            Terminator::EndOfFile => Ok(()),
        }
    }
}

/// An ordered list of arguments and redirections, terminated by one of the
/// command-separator tokens.
#[derive(Debug, Default)]
pub struct Command {
    pub arguments: Vec<Argument>,
    pub redirections: Vec<Redirection>,
    pub terminator: Terminator,
    pub have_bang: bool,
}

impl Default for Terminator {
    fn default() -> Self {
        Terminator::Newline
    }
}

impl Command {
    pub fn new() -> Self {
        Command::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty() && self.redirections.is_empty() && !self.have_bang
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.have_bang {
            write!(f, "! ")?;
        }
        write!(f, "{}", self.arguments.iter().format(" "))?;
        if !self.redirections.is_empty() {
            if !self.arguments.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "{}", self.redirections.iter().format(" "))?;
        }
        write!(f, "{}", self.terminator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_detects_bare_reserved_word_candidates() {
        let mut arg = Argument::new();
        arg.parts.push(Part::Unquoted {
            text: "if".to_string(),
            line: 1,
        });
        assert!(arg.is_bare_word("if"));

        let mut quoted = Argument::new();
        quoted.parts.push(Part::Quoted {
            text: "if".to_string(),
            line: 1,
        });
        assert!(!quoted.is_bare_word("if"));
    }

    #[test]
    fn argument_numeric_detection() {
        let mut arg = Argument::new();
        arg.parts.push(Part::Unquoted {
            text: "2".to_string(),
            line: 1,
        });
        assert!(arg.is_numeric());

        let mut mixed = Argument::new();
        mixed.parts.push(Part::Unquoted {
            text: "2a".to_string(),
            line: 1,
        });
        assert!(!mixed.is_numeric());
    }

    #[test]
    fn display_joins_arguments_with_spaces() {
        let mut cmd = Command::new();
        cmd.arguments.push({
            let mut a = Argument::new();
            a.parts.push(Part::Unquoted {
                text: "echo".to_string(),
                line: 1,
            });
            a
        });
        cmd.arguments.push({
            let mut a = Argument::new();
            a.parts.push(Part::Unquoted {
                text: "hi".to_string(),
                line: 1,
            });
            a
        });
        cmd.terminator = Terminator::Newline;
        assert_eq!(format!("{cmd}"), "echo hi\n");
    }
}
