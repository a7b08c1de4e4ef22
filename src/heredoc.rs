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

//! Pending here-documents.
//!
//! `<<` and `<<-` only reserve a spot for their body; the body itself
//! starts on the line after the operator's command finishes. The tokeniser
//! tracks reservations in a FIFO per "shell level" so that nesting into a
//! substitution with its own here-documents doesn't let them leak into, or
//! steal content from, the enclosing one.

use std::collections::VecDeque;

/// A `<<`/`<<-` redirection waiting for its body to be read.
#[derive(Debug)]
pub struct PendingHereDoc {
    /// Index into the owning command's redirection list, so the tokeniser
    /// can patch `rhs` in place once the body is known.
    pub redirection_index: usize,
    /// Terminator text, resolved once the operand argument is complete.
    pub terminator: String,
    /// Whether the terminator was quoted: if so the body is copied
    /// verbatim with no `$`, `` ` ``, or backslash processing.
    pub verbatim: bool,
    /// Whether the operator was `<<-`: leading tabs are stripped from every
    /// body line, including the terminator line, before comparison.
    pub indented: bool,
}

/// A FIFO queue of [`PendingHereDoc`]s belonging to one nesting level.
#[derive(Debug, Default)]
pub struct HereDocQueue {
    pending: VecDeque<PendingHereDoc>,
}

impl HereDocQueue {
    pub fn new() -> Self {
        HereDocQueue::default()
    }

    pub fn push(&mut self, doc: PendingHereDoc) {
        self.pending.push_back(doc);
    }

    pub fn pop_front(&mut self) -> Option<PendingHereDoc> {
        self.pending.pop_front()
    }

    pub fn front(&self) -> Option<&PendingHereDoc> {
        self.pending.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut PendingHereDoc> {
        self.pending.front_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    fn drain_into(&mut self, other: &mut HereDocQueue) {
        other.pending.extend(self.pending.drain(..));
    }
}

/// LIFO of [`HereDocQueue`]s, one per "shell level" currently being
/// tokenised. A new level is pushed whenever the tokeniser enters a nested
/// quoting mode, so a here-document declared inside `$(…)` stays pending
/// until that subshell closes rather than draining against the outer
/// line stream.
#[derive(Debug)]
pub struct HereDocStack {
    levels: Vec<HereDocQueue>,
}

impl HereDocStack {
    pub fn new() -> Self {
        HereDocStack {
            levels: vec![HereDocQueue::new()],
        }
    }

    pub fn push_level(&mut self) {
        self.levels.push(HereDocQueue::new());
    }

    /// Pops the current level, merging any here-documents it still owes
    /// into the enclosing level. Returns `false` (and does not pop) if
    /// there is no enclosing level to merge into — the caller should treat
    /// that as a structural bug rather than a user-facing error, since it
    /// means a quoting mode was popped one time too many.
    pub fn pop_level(&mut self) -> bool {
        if self.levels.len() <= 1 {
            return false;
        }
        let mut closing = self.levels.pop().unwrap();
        let outer = self.levels.last_mut().unwrap();
        closing.drain_into(outer);
        true
    }

    pub fn current(&self) -> &HereDocQueue {
        self.levels.last().expect("here-doc stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut HereDocQueue {
        self.levels.last_mut().expect("here-doc stack is never empty")
    }

    /// True if the current level has no pending here-documents. Does not
    /// consider enclosing levels: merging only happens on `pop_level`, in
    /// line with the "it is an error to close a subshell while its
    /// here-document queue is non-empty" POSIX-mode rule, which is checked
    /// at the current level only.
    pub fn current_is_empty(&self) -> bool {
        self.current().is_empty()
    }
}

impl Default for HereDocStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(term: &str) -> PendingHereDoc {
        PendingHereDoc {
            redirection_index: 0,
            terminator: term.to_string(),
            verbatim: false,
            indented: false,
        }
    }

    #[test]
    fn drains_fifo_order() {
        let mut q = HereDocQueue::new();
        q.push(doc("A"));
        q.push(doc("B"));
        assert_eq!(q.pop_front().unwrap().terminator, "A");
        assert_eq!(q.pop_front().unwrap().terminator, "B");
        assert!(q.pop_front().is_none());
    }

    #[test]
    fn nested_level_merges_back_into_outer_on_pop() {
        let mut stack = HereDocStack::new();
        stack.current_mut().push(doc("OUTER"));
        stack.push_level();
        stack.current_mut().push(doc("INNER"));
        assert!(stack.pop_level());
        assert_eq!(stack.current().len(), 2);
        assert_eq!(stack.current_mut().pop_front().unwrap().terminator, "OUTER");
        assert_eq!(stack.current_mut().pop_front().unwrap().terminator, "INNER");
    }

    #[test]
    fn cannot_pop_the_last_level() {
        let mut stack = HereDocStack::new();
        assert!(!stack.pop_level());
    }
}
