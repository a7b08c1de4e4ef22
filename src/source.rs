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

//! Source code location tracking.
//!
//! Every byte the tokeniser and interpreter look at can be traced back to a
//! [`Location`], which names the [`Code`] it came from and a byte offset
//! within it. Diagnostics are built entirely out of these handles so that an
//! error raised deep inside a nested substitution can still be reported
//! against the line of the outermost file.

use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;

/// Origin of a chunk of source code.
///
/// The core only ever reads from standard input or from a nested
/// re-parse of previously collected text (backquotes, here-document
/// terminator resolution), so the variant set is deliberately small.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// Source of unknown or unrecorded origin. Useful for ad-hoc parsing
    /// in tests.
    Unknown,
    /// Top-level standard input.
    Stdin,
    /// Text collected from a backquote expression and re-fed through a
    /// nested parser context.
    Backquote { opening_location: Location },
    /// Text collected as the right-hand side of a here-document redirection.
    HereDocument { redirection_location: Location },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Unknown => write!(f, "<unknown>"),
            Source::Stdin => write!(f, "<stdin>"),
            Source::Backquote { .. } => write!(f, "<backquote>"),
            Source::HereDocument { .. } => write!(f, "<here-document>"),
        }
    }
}

/// A growing buffer of source text plus the line number its first byte
/// starts at.
///
/// `value` is wrapped in a `RefCell` because the ring-buffer driver appends
/// to it as more bytes arrive from the input stream while earlier
/// [`Location`]s into it must remain valid.
#[derive(Debug)]
pub struct Code {
    /// The text read so far.
    pub value: RefCell<String>,
    /// Line number of the first character in `value`.
    pub start_line_number: NonZeroU64,
    /// Where this code came from.
    pub source: Source,
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        (*self.value.borrow()).eq(&*other.value.borrow())
            && self.start_line_number == other.start_line_number
            && self.source == other.source
    }
}
impl Eq for Code {}

/// A span of bytes in a [`Code`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    /// The code this location refers into.
    pub code: Rc<Code>,
    /// Byte range within `code.value`.
    pub range: std::ops::Range<usize>,
}

impl Location {
    /// Creates a location that does not point into any real source, for use
    /// in tests and synthetic diagnostics.
    pub fn dummy(value: impl Into<String>) -> Self {
        let value = value.into();
        let len = value.len();
        Location {
            code: Rc::new(Code {
                value: RefCell::new(value),
                start_line_number: NonZeroU64::new(1).unwrap(),
                source: Source::Unknown,
            }),
            range: 0..len,
        }
    }

    /// Computes the 1-based line number the start of this location falls on.
    ///
    /// Counts newlines in `code.value` up to `range.start`, starting from
    /// `code.start_line_number`.
    pub fn line_number(&self) -> NonZeroU64 {
        let value = self.code.value.borrow();
        let start = self.range.start.min(value.len());
        let newlines = value[..start].bytes().filter(|&b| b == b'\n').count() as u64;
        NonZeroU64::new(self.code.start_line_number.get() + newlines).unwrap()
    }
}

/// A single character annotated with the location it was read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceChar {
    /// The character itself.
    pub value: char,
    /// Where it came from.
    pub location: Location,
}

/// Builds an iterator of [`SourceChar`]s out of a string slice, all sharing
/// `code` and starting at byte offset `index_offset` within it.
pub fn source_chars<'a>(
    s: &'a str,
    code: &'a Rc<Code>,
    index_offset: usize,
) -> impl Iterator<Item = SourceChar> + 'a {
    let mut offset = index_offset;
    s.chars().map(move |value| {
        let start = offset;
        offset += value.len_utf8();
        SourceChar {
            value,
            location: Location {
                code: Rc::clone(code),
                range: start..offset,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_number_counts_preceding_newlines() {
        let code = Rc::new(Code {
            value: RefCell::new("a\nb\nc".to_string()),
            start_line_number: NonZeroU64::new(1).unwrap(),
            source: Source::Unknown,
        });
        let loc = |range: std::ops::Range<usize>| Location {
            code: Rc::clone(&code),
            range,
        };
        assert_eq!(loc(0..1).line_number().get(), 1);
        assert_eq!(loc(2..3).line_number().get(), 2);
        assert_eq!(loc(4..5).line_number().get(), 3);
    }

    #[test]
    fn dummy_location_is_self_contained() {
        let loc = Location::dummy("xyz");
        assert_eq!(&*loc.code.value.borrow(), "xyz");
        assert_eq!(loc.line_number().get(), 1);
    }
}
