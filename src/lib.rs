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

//! Parsing core of a POSIX-compatible shell.
//!
//! This crate turns raw shell script text into an abstract syntax tree. It
//! stops there: it has no notion of running anything, looking up `PATH`,
//! managing jobs, editing an input line, or evaluating arithmetic — see the
//! crate-level documentation in the specification this crate implements for
//! the full boundary.
//!
//! The pipeline, front to back:
//!
//! - [`preparser`] scrubs NUL bytes and collapses backslash-newline
//!   continuations out of raw text.
//! - [`lexer`] turns scrubbed text into a flat stream of [`lexer::Event`]s,
//!   tracking quoting and substitution nesting on a [`modes::ModeStack`].
//! - [`parser`] assembles those events into [`ast::Command`]s with no
//!   grammar knowledge of its own — only arguments, redirections, and
//!   terminators.
//! - [`interpreter`] imposes the shell grammar (`if`/`while`/`for`/function
//!   definitions, and so on) on top of the flat command stream, producing
//!   [`ast::Statement`] trees.
//! - [`context`] ties the four stages into one incrementally-fed session,
//!   and [`ringbuf`] drives a [`context::ParserContext`] from any
//!   [`std::io::Read`] source.
//!
//! [`error`] defines the diagnostics every stage reports through, and
//! [`source`] defines the location type those diagnostics are tagged with.

pub mod ast;
pub mod context;
pub mod error;
pub mod escape;
pub mod heredoc;
pub mod interpreter;
pub mod lexer;
pub mod modes;
pub mod parser;
pub mod preparser;
pub mod ringbuf;
pub mod source;
