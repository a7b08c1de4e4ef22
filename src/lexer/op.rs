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

//! The operator symbol table.
//!
//! Operators are recognised longest-match-first: `<<<` beats `<<` beats
//! `<`. A hand-written trie over the fixed operator character set (`<>&|();`)
//! makes that property structural rather than something every caller has
//! to get right by trying alternatives in the right order.

use std::fmt;

/// One recognised operator token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Less,
    LessLess,
    LessLessDash,
    LessLessLess,
    LessGreater,
    LessAnd,
    LessOpenParen,
    LessGreaterOpenParen,
    LessGreaterBar,
    LessGreaterAnd,
    Greater,
    GreaterGreater,
    GreaterAnd,
    GreaterBar,
    GreaterOpenParen,
    AndGreaterGreater,
    AndGreaterAnd,
    AndGreaterBar,
    AndGreater,
    OpenParen,
    OpenParenOpenParen,
    OpenParenCloseParen,
    CloseParen,
    Semicolon,
    SemicolonSemicolon,
    And,
    AndAnd,
    AndBar,
    Bar,
    BarBar,
    BarAnd,
}

impl Operator {
    pub const fn text(self) -> &'static str {
        use Operator::*;
        match self {
            Less => "<",
            LessLess => "<<",
            LessLessDash => "<<-",
            LessLessLess => "<<<",
            LessGreater => "<>",
            LessAnd => "<&",
            LessOpenParen => "<(",
            LessGreaterOpenParen => "<>(",
            LessGreaterBar => "<>|",
            LessGreaterAnd => "<>&",
            Greater => ">",
            GreaterGreater => ">>",
            GreaterAnd => ">&",
            GreaterBar => ">|",
            GreaterOpenParen => ">(",
            AndGreaterGreater => "&>>",
            AndGreaterAnd => "&>&",
            AndGreaterBar => "&>|",
            AndGreater => "&>",
            OpenParen => "(",
            OpenParenOpenParen => "((",
            OpenParenCloseParen => "()",
            CloseParen => ")",
            Semicolon => ";",
            SemicolonSemicolon => ";;",
            And => "&",
            AndAnd => "&&",
            AndBar => "&|",
            Bar => "|",
            BarBar => "||",
            BarAnd => "|&",
        }
    }

    /// True if this operator belongs to the POSIX shell grammar. The rest
    /// are accepted only when `check_extension` allows them (i.e. outside
    /// POSIX mode).
    pub const fn is_portable(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Less | LessLess
                | LessLessDash
                | LessGreater
                | LessAnd
                | Greater
                | GreaterGreater
                | GreaterAnd
                | GreaterBar
                | OpenParen
                | OpenParenOpenParen
                | OpenParenCloseParen
                | CloseParen
                | Semicolon
                | SemicolonSemicolon
                | And
                | AndAnd
                | Bar
                | BarBar
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// An edge in the operator trie: one character plus the operator that is
/// complete if the match stops there, plus the sub-trie for longer matches.
#[derive(Copy, Clone)]
pub struct Edge {
    pub key: u8,
    pub value: Option<Operator>,
    pub next: Trie,
}

/// A node of the operator trie: a sorted array of [`Edge`]s.
#[derive(Copy, Clone)]
pub struct Trie(pub &'static [Edge]);

impl Trie {
    pub fn edge(&self, key: u8) -> Option<&Edge> {
        self.0.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const NONE: Trie = Trie(&[]);

const LESS_LESS: Trie = Trie(&[
    Edge { key: b'-', value: Some(Operator::LessLessDash), next: NONE },
    Edge { key: b'<', value: Some(Operator::LessLessLess), next: NONE },
]);

const LESS_GREATER: Trie = Trie(&[
    Edge { key: b'(', value: Some(Operator::LessGreaterOpenParen), next: NONE },
    Edge { key: b'|', value: Some(Operator::LessGreaterBar), next: NONE },
    Edge { key: b'&', value: Some(Operator::LessGreaterAnd), next: NONE },
]);

const LESS: Trie = Trie(&[
    Edge { key: b'<', value: Some(Operator::LessLess), next: LESS_LESS },
    Edge { key: b'>', value: Some(Operator::LessGreater), next: LESS_GREATER },
    Edge { key: b'&', value: Some(Operator::LessAnd), next: NONE },
    Edge { key: b'(', value: Some(Operator::LessOpenParen), next: NONE },
]);

const GREATER: Trie = Trie(&[
    Edge { key: b'>', value: Some(Operator::GreaterGreater), next: NONE },
    Edge { key: b'&', value: Some(Operator::GreaterAnd), next: NONE },
    Edge { key: b'|', value: Some(Operator::GreaterBar), next: NONE },
    Edge { key: b'(', value: Some(Operator::GreaterOpenParen), next: NONE },
]);

const AND_GREATER: Trie = Trie(&[
    Edge { key: b'>', value: Some(Operator::AndGreaterGreater), next: NONE },
    Edge { key: b'&', value: Some(Operator::AndGreaterAnd), next: NONE },
    Edge { key: b'|', value: Some(Operator::AndGreaterBar), next: NONE },
]);

const AND: Trie = Trie(&[
    Edge { key: b'&', value: Some(Operator::AndAnd), next: NONE },
    Edge { key: b'|', value: Some(Operator::AndBar), next: NONE },
    Edge { key: b'>', value: Some(Operator::AndGreater), next: AND_GREATER },
]);

const OPEN_PAREN: Trie = Trie(&[
    Edge { key: b'(', value: Some(Operator::OpenParenOpenParen), next: NONE },
    Edge { key: b')', value: Some(Operator::OpenParenCloseParen), next: NONE },
]);

const SEMICOLON: Trie = Trie(&[Edge { key: b';', value: Some(Operator::SemicolonSemicolon), next: NONE }]);

const BAR: Trie = Trie(&[
    Edge { key: b'|', value: Some(Operator::BarBar), next: NONE },
    Edge { key: b'&', value: Some(Operator::BarAnd), next: NONE },
]);

/// The root of the operator trie, covering every character that can start
/// an operator: `< > & | ( ) ;`.
pub const OPERATORS: Trie = Trie(&[
    Edge { key: b'<', value: Some(Operator::Less), next: LESS },
    Edge { key: b'>', value: Some(Operator::Greater), next: GREATER },
    Edge { key: b'&', value: Some(Operator::And), next: AND },
    Edge { key: b'|', value: Some(Operator::Bar), next: BAR },
    Edge { key: b'(', value: Some(Operator::OpenParen), next: OPEN_PAREN },
    Edge { key: b')', value: Some(Operator::CloseParen), next: NONE },
    Edge { key: b';', value: Some(Operator::Semicolon), next: SEMICOLON },
]);

/// Scans the longest operator starting at `bytes[0]`.
///
/// Returns `None` if `bytes[0]` does not start any operator. Returns
/// `Some((op, len, needs_more))` otherwise: `needs_more` is true when the
/// match might still extend given more bytes (i.e. `bytes` was exhausted
/// while still inside the trie) and the caller, unless at EOF, should wait
/// for more input rather than committing to `op`.
pub fn scan(bytes: &[u8]) -> Option<(Operator, usize, bool)> {
    let Some(&first) = bytes.first() else {
        return None;
    };
    let mut edge = OPERATORS.edge(first)?;
    let mut len = 1;
    let mut best = edge.value.map(|op| (op, len));
    loop {
        if edge.next.is_empty() {
            break;
        }
        let Some(&next_byte) = bytes.get(len) else {
            // Ran out of bytes but the trie could still extend.
            return best.map(|(op, l)| (op, l, true));
        };
        let Some(next_edge) = edge.next.edge(next_byte) else {
            break;
        };
        edge = next_edge;
        len += 1;
        if let Some(op) = edge.value {
            best = Some((op, len));
        }
    }
    best.map(|(op, l)| (op, l, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_match_wins() {
        assert_eq!(scan(b"<<<x").unwrap().0, Operator::LessLessLess);
        assert_eq!(scan(b"<<x").unwrap().0, Operator::LessLess);
        assert_eq!(scan(b"<x").unwrap().0, Operator::Less);
        assert_eq!(scan(b"&>>x").unwrap().0, Operator::AndGreaterGreater);
        assert_eq!(scan(b"&>x").unwrap().0, Operator::AndGreater);
        assert_eq!(scan(b"&x").unwrap().0, Operator::And);
    }

    #[test]
    fn reports_needs_more_at_buffer_boundary() {
        let (op, len, needs_more) = scan(b"<").unwrap();
        assert_eq!(op, Operator::Less);
        assert_eq!(len, 1);
        assert!(needs_more);
    }

    #[test]
    fn adjacent_parens_are_one_operator_distinct_from_double_open() {
        assert_eq!(scan(b"()x").unwrap().0, Operator::OpenParenCloseParen);
        assert_eq!(scan(b"((x").unwrap().0, Operator::OpenParenOpenParen);
        assert_eq!(scan(b"( x").unwrap().0, Operator::OpenParen);
    }

    #[test]
    fn non_operator_byte_yields_none() {
        assert!(scan(b"x").is_none());
    }

    #[test]
    fn portability_gate_matches_posix_operator_set() {
        assert!(Operator::Less.is_portable());
        assert!(!Operator::LessLessLess.is_portable());
        assert!(!Operator::AndGreater.is_portable());
    }
}
