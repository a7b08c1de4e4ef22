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

//! Decomposes the already text-translated content of a `${…}` expansion
//! into a name, an optional operator, and an optional word.
//!
//! By the time [`decompose`] runs, the tokeniser's `CB_QUOTE` mode has
//! already found the matching `}` and the interpreter's text pass has
//! already split any `$name` references and resolved any nested
//! substitutions inside the word, so this only has to find the boundary
//! between the parameter name and the operator.

use crate::ast::{Argument, BracedOperator, Part, Variable};
use crate::error::{Error, Result, SyntaxError};
use crate::parser::location_at_line;

const OPERATORS: &[(&str, BracedOperator)] = &[
    (":-", BracedOperator::DefaultIfUnset),
    (":=", BracedOperator::AssignIfUnset),
    (":?", BracedOperator::ErrorIfUnset),
    (":+", BracedOperator::AlternateIfSet),
    ("##", BracedOperator::RemoveLargestPrefix),
    ("%%", BracedOperator::RemoveLargestSuffix),
    ("#", BracedOperator::RemoveSmallestPrefix),
    ("%", BracedOperator::RemoveSmallestSuffix),
];

fn is_parameter_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Turns the flattened parts of a `${…}` body into one [`Part`]: either a
/// plain [`Part::Variable`] (no operator present) or a
/// [`Part::BracedParameter`].
pub fn decompose(parts: Vec<Part>, line: u64) -> Result<Part> {
    let Some(Part::Unquoted { text: first_text, .. }) = parts.first() else {
        return Err(Error::new(SyntaxError::InvalidVariableSubstitution, location_at_line(line)));
    };

    if let Some(rest) = first_text.strip_prefix('#') {
        if parts.len() == 1 && is_parameter_name(rest) {
            return Ok(Part::BracedParameter {
                name: rest.to_string(),
                operator: Some(BracedOperator::Length),
                word: None,
                line,
            });
        }
    }

    let name_len = first_text
        .char_indices()
        .take_while(|&(_, c)| c.is_alphanumeric() || c == '_')
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    if name_len == 0 {
        return Err(Error::new(SyntaxError::IllegalVariableName, location_at_line(line)));
    }
    let name = first_text[..name_len].to_string();
    let suffix = &first_text[name_len..];

    if suffix.is_empty() && parts.len() == 1 {
        return Ok(Part::Variable { var: Variable::Name(name), line });
    }

    let Some((sym, op)) = OPERATORS.iter().find(|(sym, _)| suffix.starts_with(sym)) else {
        return Err(Error::new(SyntaxError::InvalidVariableSubstitution, location_at_line(line)));
    };

    let remainder_text = &suffix[sym.len()..];
    let mut word_parts = Vec::new();
    if !remainder_text.is_empty() {
        word_parts.push(Part::Unquoted { text: remainder_text.to_string(), line });
    }
    word_parts.extend(parts.into_iter().skip(1));
    let word = if word_parts.is_empty() { None } else { Some(Argument { parts: word_parts }) };

    Ok(Part::BracedParameter { name, operator: Some(*op), word, line })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unq(text: &str) -> Part {
        Part::Unquoted { text: text.to_string(), line: 1 }
    }

    #[test]
    fn bare_name_becomes_a_plain_variable() {
        let result = decompose(vec![unq("b")], 1).unwrap();
        assert!(matches!(result, Part::Variable { var: Variable::Name(n), .. } if n == "b"));
    }

    #[test]
    fn default_if_unset_splits_name_and_word() {
        let result = decompose(vec![unq("b:-c")], 1).unwrap();
        match result {
            Part::BracedParameter { name, operator, word, .. } => {
                assert_eq!(name, "b");
                assert_eq!(operator, Some(BracedOperator::DefaultIfUnset));
                assert_eq!(word.unwrap().to_string(), "c");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn length_form_has_no_word() {
        let result = decompose(vec![unq("#b")], 1).unwrap();
        match result {
            Part::BracedParameter { name, operator, word, .. } => {
                assert_eq!(name, "b");
                assert_eq!(operator, Some(BracedOperator::Length));
                assert!(word.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn word_spanning_a_nested_part_is_preserved() {
        let parts = vec![unq("b:-"), Part::Quoted { text: "c".to_string(), line: 1 }];
        let result = decompose(parts, 1).unwrap();
        match result {
            Part::BracedParameter { word: Some(word), .. } => {
                assert_eq!(word.parts.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
