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

//! End-to-end scenarios driven only through the public API, the way a
//! downstream consumer would use the crate: feed a whole script in, read
//! back the statement tree.

use oxsh_syntax::ast::{BracedOperator, Nested, NestedKind, Part, RedirKind, Statement, Terminator, Variable};
use oxsh_syntax::context::{ParseOptions, ParserContext};
use oxsh_syntax::error::{Error, Warning};
use oxsh_syntax::source::Location;

fn parse(src: &str, options: ParseOptions) -> Result<Vec<Statement>, Error> {
    let mut ctx = ParserContext::new(options);
    let mut warnings: Vec<(Warning, Location)> = Vec::new();
    let mut remaining = src;
    let mut out = Vec::new();
    loop {
        let at_eof = remaining.is_empty();
        let (stmts, consumed) = ctx.feed(remaining, at_eof, &mut warnings)?;
        out.extend(stmts);
        remaining = &remaining[consumed..];
        if at_eof {
            break;
        }
    }
    if !ctx.is_well_formed() {
        return Err(ctx.premature_eof_error());
    }
    Ok(out)
}

fn parse_ok(src: &str) -> Vec<Statement> {
    parse(src, ParseOptions::default()).unwrap_or_else(|e| panic!("unexpected error parsing {src:?}: {e}"))
}

fn words(cmd: &oxsh_syntax::ast::Command) -> Vec<String> {
    cmd.arguments.iter().map(ToString::to_string).collect()
}

#[test]
fn echo_hello_is_one_simple_command() {
    let stmts = parse_ok("echo hello\n");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::Simple(cmd) => {
            assert_eq!(words(cmd), vec!["echo", "hello"]);
            assert!(cmd.redirections.is_empty());
            assert_eq!(cmd.terminator, Terminator::Newline);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn assignments_and_redirections_attach_to_one_command() {
    let stmts = parse_ok("a=1 b=2 cmd >out 2>&1 <in\n");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::Simple(cmd) => {
            assert_eq!(words(cmd), vec!["a=1", "b=2", "cmd"]);
            assert_eq!(cmd.redirections.len(), 3);

            assert_eq!(cmd.redirections[0].kind, RedirKind::Output);
            assert!(cmd.redirections[0].lhs.is_none());
            assert_eq!(cmd.redirections[0].rhs.as_ref().unwrap().to_string(), "out");

            assert_eq!(cmd.redirections[1].kind, RedirKind::OutputDup);
            assert_eq!(cmd.redirections[1].lhs.as_ref().unwrap().to_string(), "2");
            assert_eq!(cmd.redirections[1].rhs.as_ref().unwrap().to_string(), "1");

            assert_eq!(cmd.redirections[2].kind, RedirKind::Input);
            assert_eq!(cmd.redirections[2].rhs.as_ref().unwrap().to_string(), "in");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn here_document_body_becomes_a_here_string_redirection() {
    let stmts = parse_ok("cat <<EOF\nhello $name\nEOF\n");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::Simple(cmd) => {
            assert_eq!(cmd.arguments[0].to_string(), "cat");
            assert_eq!(cmd.redirections.len(), 1);
            assert_eq!(cmd.redirections[0].kind, RedirKind::HereString);

            let rhs = cmd.redirections[0].rhs.as_ref().unwrap();
            assert!(rhs.parts.iter().any(|p| matches!(p, Part::Unquoted { text, .. } if text.contains("hello"))));
            assert!(rhs.parts.iter().any(|p| matches!(p, Part::Variable { var: Variable::Name(n), .. } if n == "name")));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn if_then_fi_becomes_an_if_statement() {
    let stmts = parse_ok("if [ -f x ]; then echo y; fi\n");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::If { branches, else_body } => {
            assert_eq!(branches.len(), 1);
            let (condition, body) = &branches[0];
            assert_eq!(condition.len(), 1);
            match &condition[0] {
                Statement::Simple(cmd) => assert_eq!(cmd.arguments[0].to_string(), "["),
                other => panic!("unexpected condition: {other:?}"),
            }
            assert_eq!(body.len(), 1);
            match &body[0] {
                Statement::Simple(cmd) => assert_eq!(words(cmd), vec!["echo", "y"]),
                other => panic!("unexpected body: {other:?}"),
            }
            assert!(else_body.is_none());
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn for_loop_collects_variable_values_and_body() {
    let stmts = parse_ok("for i in 1 2 3; do echo $i; done\n");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::For { variable, values, body } => {
            assert_eq!(variable, "i");
            let values: Vec<String> = values.iter().map(ToString::to_string).collect();
            assert_eq!(values, vec!["1", "2", "3"]);
            assert_eq!(body.len(), 1);
            match &body[0] {
                Statement::Simple(cmd) => assert_eq!(cmd.arguments[1].to_string(), "$i"),
                other => panic!("unexpected body: {other:?}"),
            }
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn nested_subshell_and_backquote_substitution_resolve() {
    let options = ParseOptions { posix_mode: false, ..ParseOptions::default() };
    let stmts = parse("echo $(echo `echo x`)\n", options).unwrap();
    assert_eq!(stmts.len(), 1);

    let Statement::Simple(cmd) = &stmts[0] else { panic!("expected a simple command") };
    assert_eq!(cmd.arguments[0].to_string(), "echo");

    let subshell = cmd.arguments[1].parts.iter().find_map(|p| match p {
        Part::Nested { kind: NestedKind::SubshellSubstitution, child: Nested::Resolved(stmts), .. } => Some(stmts),
        _ => None,
    });
    let subshell = subshell.expect("expected a resolved subshell substitution");
    assert_eq!(subshell.len(), 1);

    let Statement::Simple(inner) = &subshell[0] else { panic!("expected a simple command inside $(...)") };
    assert_eq!(inner.arguments[0].to_string(), "echo");

    let backquote = inner.arguments[1].parts.iter().find_map(|p| match p {
        Part::Nested { kind: NestedKind::BackquoteExpression, child: Nested::Resolved(stmts), .. } => Some(stmts),
        _ => None,
    });
    let backquote = backquote.expect("expected a resolved backquote expression");
    assert_eq!(backquote.len(), 1);

    let Statement::Simple(bq_cmd) = &backquote[0] else { panic!("expected a simple command inside `...`") };
    assert_eq!(words(bq_cmd), vec!["echo", "x"]);
}

#[test]
fn quoted_braced_parameter_expansion_splits_into_parts() {
    let stmts = parse_ok("echo \"a${b:-c}d\"\n");
    assert_eq!(stmts.len(), 1);

    let Statement::Simple(cmd) = &stmts[0] else { panic!("expected a simple command") };
    let quote_expr = cmd.arguments[1].parts.iter().find_map(|p| match p {
        Part::Nested { kind: NestedKind::QuoteExpression, child: Nested::Resolved(stmts), .. } => Some(stmts),
        _ => None,
    });
    let quote_expr = quote_expr.expect("expected a resolved quote expression");
    assert_eq!(quote_expr.len(), 1);

    let Statement::Simple(inner) = &quote_expr[0] else { panic!("expected a simple command inside \"...\"") };
    let parts = &inner.arguments[0].parts;
    assert!(parts.iter().any(|p| matches!(p, Part::Unquoted { text, .. } if text == "a")));
    assert!(parts.iter().any(|p| matches!(
        p,
        Part::BracedParameter { name, operator: Some(BracedOperator::DefaultIfUnset), word: Some(w), .. }
            if name == "b" && w.to_string() == "c"
    )));
    assert!(parts.iter().any(|p| matches!(p, Part::Unquoted { text, .. } if text == "d")));
}

#[test]
fn command_following_a_here_document_is_not_interpreted_early() {
    let stmts = parse_ok("cat <<EOF\nbody\nEOF\necho after\n");
    assert_eq!(stmts.len(), 2);

    let Statement::Simple(first) = &stmts[0] else { panic!("expected a simple command") };
    assert_eq!(first.arguments[0].to_string(), "cat");
    assert_eq!(first.redirections[0].kind, RedirKind::HereString);
    assert_eq!(first.redirections[0].rhs.as_ref().unwrap().to_string(), "body\n");

    let Statement::Simple(second) = &stmts[1] else { panic!("expected a simple command") };
    assert_eq!(words(second), vec!["echo", "after"]);
}

#[test]
fn stray_double_semicolon_at_top_level_is_a_fatal_error() {
    let err = parse("echo hi ;;\n", ParseOptions::default()).unwrap_err();
    assert!(err.to_string().contains("stray ';;'"), "message was: {err}");
}
