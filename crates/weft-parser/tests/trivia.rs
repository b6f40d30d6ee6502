//! Trivia retention tests.
//!
//! With `keep_trivia` on, hidden tokens attach to statements as "before" or
//! "after" trivia, statement separators become trivia, and `{% %}{% %}`
//! adjacency synthesizes an empty raw placeholder so nothing is lost.

use weft_ast::{ScriptPage, StatementKind, TriviaKind};
use weft_lexer::{Dialect, Lexer, LexerOptions, ScriptMode};
use weft_parser::Parser;

fn options(keep_trivia: bool) -> LexerOptions {
    LexerOptions {
        keep_trivia,
        ..LexerOptions::default()
    }
}

fn parse_ok(source: &str, lexer_options: LexerOptions) -> ScriptPage {
    let lexer = Lexer::new(source, lexer_options);
    let mut parser = Parser::new(lexer);
    let page = parser.parse();
    assert!(
        parser.messages().is_empty(),
        "unexpected diagnostics: {:?}",
        parser.messages()
    );
    page.expect("parse should succeed")
}

#[test]
fn expression_statement_carries_surrounding_whitespace() {
    let page = parse_ok("{{ x }}", options(true));
    let statement = &page.body.statements[0];
    assert!(matches!(statement.kind, StatementKind::Expression(_)));

    assert_eq!(statement.trivia.before.len(), 1);
    assert_eq!(statement.trivia.before[0].kind, TriviaKind::Whitespace);
    assert_eq!(statement.trivia.before[0].span.start, 2);
    assert_eq!(statement.trivia.before[0].span.end, 3);

    assert_eq!(statement.trivia.after.len(), 1);
    assert_eq!(statement.trivia.after[0].kind, TriviaKind::Whitespace);
    assert_eq!(statement.trivia.after[0].span.start, 4);
    assert_eq!(statement.trivia.after[0].span.end, 5);
}

#[test]
fn trivia_is_dropped_when_retention_is_off() {
    let page = parse_ok("{{ x }}", options(false));
    let statement = &page.body.statements[0];
    assert!(statement.trivia.is_empty());
}

#[test]
fn tag_adjacency_synthesizes_an_empty_raw() {
    let lexer_options = LexerOptions {
        dialect: Dialect::Liquid,
        keep_trivia: true,
        ..LexerOptions::default()
    };
    let page = parse_ok("{% %}{% %}", lexer_options);
    assert_eq!(page.body.statements.len(), 3);

    assert!(matches!(page.body.statements[0].kind, StatementKind::Nop));
    assert!(matches!(page.body.statements[2].kind, StatementKind::Nop));

    let placeholder = &page.body.statements[1];
    let StatementKind::Raw(raw) = &placeholder.kind else {
        panic!("expected synthesized raw placeholder");
    };
    assert!(raw.text.is_empty());
    assert_eq!(placeholder.trivia.after.len(), 1);
    assert_eq!(placeholder.trivia.after[0].kind, TriviaKind::Empty);
    assert!(placeholder.span.is_empty());
}

#[test]
fn adjacency_without_retention_produces_only_nops() {
    let lexer_options = LexerOptions {
        dialect: Dialect::Liquid,
        ..LexerOptions::default()
    };
    let page = parse_ok("{% %}{% %}", lexer_options);
    assert_eq!(page.body.statements.len(), 2);
    assert!(page
        .body
        .statements
        .iter()
        .all(|s| matches!(s.kind, StatementKind::Nop)));
}

#[test]
fn end_keyword_becomes_terminator_trivia() {
    let page = parse_ok("{{ if a }}X{{ end }}", options(true));
    let statement = &page.body.statements[0];
    let StatementKind::If(if_stmt) = &statement.kind else {
        panic!("expected if statement");
    };
    assert!(matches!(
        if_stmt.then_body.statements[0].kind,
        StatementKind::Raw(_)
    ));
    assert!(statement
        .trivia
        .after
        .iter()
        .any(|t| t.kind == TriviaKind::End));
}

#[test]
fn newline_separator_becomes_trivia() {
    let lexer_options = LexerOptions {
        mode: ScriptMode::ScriptOnly,
        keep_trivia: true,
        ..LexerOptions::default()
    };
    let page = parse_ok("x = 1\ny = 2", lexer_options);
    assert_eq!(page.body.statements.len(), 2);
    assert!(page.body.statements[0]
        .trivia
        .after
        .iter()
        .any(|t| t.kind == TriviaKind::NewLine));
}

#[test]
fn semicolon_separator_becomes_trivia() {
    let lexer_options = LexerOptions {
        mode: ScriptMode::ScriptOnly,
        keep_trivia: true,
        ..LexerOptions::default()
    };
    let page = parse_ok("x = 1; y = 2", lexer_options);
    assert_eq!(page.body.statements.len(), 2);
    assert!(page.body.statements[0]
        .trivia
        .after
        .iter()
        .any(|t| t.kind == TriviaKind::SemiColon));
}

#[test]
fn comments_attach_to_the_following_statement() {
    let lexer_options = LexerOptions {
        mode: ScriptMode::ScriptOnly,
        keep_trivia: true,
        ..LexerOptions::default()
    };
    let page = parse_ok("# a comment\nx = 1", lexer_options);
    assert_eq!(page.body.statements.len(), 1);
    let trivia = &page.body.statements[0].trivia.before;
    assert!(trivia.iter().any(|t| t.kind == TriviaKind::Comment));
}

#[test]
fn blocks_never_carry_trivia_directly() {
    let page = parse_ok("{{ if a }} X {{ end }}", options(true));
    let StatementKind::If(if_stmt) = &page.body.statements[0].kind else {
        panic!("expected if statement");
    };
    // The body block itself has no trivia slots; leading trivia live on the
    // first child.
    assert!(!if_stmt.then_body.statements.is_empty());
}

#[test]
fn raw_statements_reproduce_the_source_slices() {
    let page = parse_ok("A{{ x }}B", options(true));
    let texts: Vec<String> = page
        .body
        .statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::Raw(raw) => Some(raw.text.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["A".to_string(), "B".to_string()]);
}
