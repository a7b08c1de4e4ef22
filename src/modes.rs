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

//! The tokeniser's lexical mode stack.
//!
//! The tokeniser is a single dispatch on the top-of-stack [`Mode`]. Modes
//! nest: an unescaped `"` inside [`Mode::Normal`] pushes [`Mode::DqQuote`],
//! `` ` `` pushes [`Mode::BqQuote`], and so on. [`ModeStack::pop`] always
//! leaves at least [`Mode::Normal`] on the stack.

/// One lexical mode the tokeniser can be in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Top-level command text.
    Normal,
    /// Inside a `#`-introduced comment, until the next newline.
    Comment,
    /// Inside `` `…` ``.
    BqQuote,
    /// Inside `"…"`.
    DqQuote,
    /// Inside `$((…))` or `((…))`.
    RrbQuote,
    /// Inside `$[…]` (deprecated arithmetic substitution spelling).
    RbQuote,
    /// Same lexical class as [`Mode::RbQuote`], used for a second
    /// independently-nesting arithmetic bracket family so the two don't
    /// have to share mismatched-bracket bookkeeping.
    SbQuote,
    /// Inside `${…}`.
    CbQuote,
    /// Positioned at the first byte of a line that must be consumed as
    /// here-document terminator/body setup before normal tokenising
    /// resumes.
    HereDocumentInit,
    /// Inside the body of a here-document.
    HereDocument,
}

/// Per-frame tokeniser scratch state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModeFrame {
    pub mode: Mode,
    /// Whether a `#` encountered right now starts a comment: true
    /// immediately after whitespace, a newline, or an operator; false in
    /// the middle of a word.
    pub she_is_comment: bool,
    /// Count of unmatched `(` opened inside an arithmetic-family mode
    /// ([`Mode::RrbQuote`], [`Mode::RbQuote`], [`Mode::SbQuote`]), used to
    /// find the frame's true closing delimiter rather than stopping at the
    /// first candidate.
    pub paren_depth: i32,
}

impl ModeFrame {
    pub fn new(mode: Mode) -> Self {
        ModeFrame {
            mode,
            she_is_comment: true,
            paren_depth: 0,
        }
    }
}

/// LIFO of [`ModeFrame`]s. Always non-empty: the bottom frame is
/// [`Mode::Normal`].
#[derive(Debug)]
pub struct ModeStack {
    frames: Vec<ModeFrame>,
}

impl ModeStack {
    pub fn new() -> Self {
        ModeStack {
            frames: vec![ModeFrame::new(Mode::Normal)],
        }
    }

    pub fn top(&self) -> Mode {
        self.frames.last().expect("mode stack is never empty").mode
    }

    pub fn she_is_comment(&self) -> bool {
        self.frames.last().expect("mode stack is never empty").she_is_comment
    }

    pub fn set_she_is_comment(&mut self, value: bool) {
        self.frames.last_mut().expect("mode stack is never empty").she_is_comment = value;
    }

    pub fn paren_depth(&self) -> i32 {
        self.frames.last().expect("mode stack is never empty").paren_depth
    }

    pub fn adjust_paren_depth(&mut self, delta: i32) {
        self.frames.last_mut().expect("mode stack is never empty").paren_depth += delta;
    }

    pub fn push(&mut self, mode: Mode) {
        self.frames.push(ModeFrame::new(mode));
    }

    /// Pops the top frame. Never pops the last remaining frame: at end of
    /// file the stack must settle back to exactly one [`Mode::Normal`]
    /// frame, per the core's EOF invariant.
    pub fn pop(&mut self) -> Option<ModeFrame> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_at_top_level(&self) -> bool {
        self.frames.len() == 1
    }
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stack_starts_normal_and_depth_one() {
        let stack = ModeStack::new();
        assert_eq!(stack.top(), Mode::Normal);
        assert_eq!(stack.depth(), 1);
        assert!(stack.is_at_top_level());
    }

    #[test]
    fn push_pop_round_trips() {
        let mut stack = ModeStack::new();
        stack.push(Mode::DqQuote);
        assert_eq!(stack.top(), Mode::DqQuote);
        assert_eq!(stack.depth(), 2);
        assert!(stack.pop().is_some());
        assert_eq!(stack.top(), Mode::Normal);
    }

    #[test]
    fn pop_refuses_to_empty_the_stack() {
        let mut stack = ModeStack::new();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }
}
