//! Front-matter mode tests.

use weft_ast::{ExprKind, ScriptPage, StatementKind};
use weft_lexer::{Lexer, LexerOptions, ScriptMode};
use weft_parser::Parser;

fn parse_ok(source: &str, mode: ScriptMode) -> ScriptPage {
    let options = LexerOptions {
        mode,
        ..LexerOptions::default()
    };
    let lexer = Lexer::new(source, options);
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
fn front_matter_and_content() {
    let page = parse_ok("+++\nx = 1\n+++\nHello", ScriptMode::FrontMatterAndContent);

    let front = page.front_matter.as_ref().expect("front matter block");
    assert_eq!(front.statements.len(), 1);
    let StatementKind::Expression(stmt) = &front.statements[0].kind else {
        panic!("expected expression statement in front matter");
    };
    let ExprKind::Assign { target, value } = &stmt.expr.kind else {
        panic!("expected assignment in front matter");
    };
    assert!(matches!(
        &target.kind,
        ExprKind::Variable { name, .. } if &**name == "x"
    ));
    assert!(matches!(value.kind, ExprKind::Literal(_)));

    // The newline after the closing marker is eaten by the first raw
    // statement: its span starts at the `H` of "Hello".
    assert_eq!(page.body.statements.len(), 1);
    let first = &page.body.statements[0];
    assert_eq!(first.span.start as usize, "+++\nx = 1\n+++\n".len());
    let StatementKind::Raw(raw) = &first.kind else {
        panic!("expected raw statement");
    };
    assert_eq!(&*raw.text, "Hello");
}

#[test]
fn front_matter_with_crlf() {
    let page = parse_ok(
        "+++\r\nx = 1\r\n+++\r\nHi",
        ScriptMode::FrontMatterAndContent,
    );
    let StatementKind::Raw(raw) = &page.body.statements[0].kind else {
        panic!("expected raw statement");
    };
    assert_eq!(&*raw.text, "Hi");
}

#[test]
fn front_matter_only_ignores_content() {
    let page = parse_ok(
        "+++\ntitle = 'home'\n+++\nignored {{ body }}",
        ScriptMode::FrontMatterOnly,
    );
    let front = page.front_matter.as_ref().expect("front matter block");
    assert_eq!(front.statements.len(), 1);
    assert!(page.body.statements.is_empty());
}

#[test]
fn custom_marker() {
    let options = LexerOptions {
        mode: ScriptMode::FrontMatterAndContent,
        front_matter_marker: "---".to_string(),
        ..LexerOptions::default()
    };
    let lexer = Lexer::new("---\na = 1\n---\nBody", options);
    let mut parser = Parser::new(lexer);
    let page = parser.parse().expect("parse should succeed");
    assert!(page.front_matter.is_some());
    let StatementKind::Raw(raw) = &page.body.statements[0].kind else {
        panic!("expected raw statement");
    };
    assert_eq!(&*raw.text, "Body");
}

#[test]
fn missing_marker_is_an_error() {
    let options = LexerOptions {
        mode: ScriptMode::FrontMatterAndContent,
        ..LexerOptions::default()
    };
    let lexer = Lexer::new("Hello", options);
    let mut parser = Parser::new(lexer);
    assert!(parser.parse().is_none());
    assert!(parser
        .messages()
        .iter()
        .any(|m| m.text.contains("front matter marker")));
}

#[test]
fn unterminated_front_matter_is_an_error() {
    let options = LexerOptions {
        mode: ScriptMode::FrontMatterAndContent,
        ..LexerOptions::default()
    };
    let lexer = Lexer::new("+++\nx = 1\n", options);
    let mut parser = Parser::new(lexer);
    assert!(parser.parse().is_none());
    assert!(parser
        .messages()
        .iter()
        .any(|m| m.text.contains("before the end of the front matter")));
}

#[test]
fn code_after_front_matter() {
    let page = parse_ok("+++\na = 1\n+++\n{{ a }}", ScriptMode::FrontMatterAndContent);
    assert!(page
        .body
        .statements
        .iter()
        .any(|s| matches!(s.kind, StatementKind::Expression(_))));
}
