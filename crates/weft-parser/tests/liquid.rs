//! Liquid-dialect parsing tests.

use weft_ast::{BinaryOp, Block, ExprKind, LiteralValue, ScriptPage, StatementKind};
use weft_lexer::{Dialect, Lexer, LexerOptions};
use weft_parser::{Parser, ParserOptions};

fn liquid_options() -> LexerOptions {
    LexerOptions {
        dialect: Dialect::Liquid,
        ..LexerOptions::default()
    }
}

fn parse_ok(source: &str) -> ScriptPage {
    parse_ok_with(source, ParserOptions::default())
}

fn parse_ok_with(source: &str, options: ParserOptions) -> ScriptPage {
    let lexer = Lexer::new(source, liquid_options());
    let mut parser = Parser::with_options(lexer, options);
    let page = parser.parse();
    assert!(
        parser.messages().is_empty(),
        "unexpected diagnostics: {:?}",
        parser.messages()
    );
    page.expect("parse should succeed")
}

fn expect_error(source: &str) -> Vec<String> {
    let lexer = Lexer::new(source, liquid_options());
    let mut parser = Parser::new(lexer);
    assert!(parser.parse().is_none(), "expected a parse error");
    assert!(parser.has_errors());
    parser.messages().iter().map(|m| m.text.clone()).collect()
}

fn raw_text(block: &Block, index: usize) -> &str {
    match &block.statements[index].kind {
        StatementKind::Raw(raw) => &raw.text,
        other => panic!("expected raw statement, got {other:?}"),
    }
}

#[test]
fn if_else_endif() {
    let page = parse_ok("{% if a %}X{% else %}Y{% endif %}");
    assert_eq!(page.body.statements.len(), 1);
    let StatementKind::If(if_stmt) = &page.body.statements[0].kind else {
        panic!("expected if statement");
    };
    assert!(matches!(
        &if_stmt.condition.kind,
        ExprKind::Variable { name, .. } if &**name == "a"
    ));
    assert_eq!(raw_text(&if_stmt.then_body, 0), "X");
    let chained = if_stmt.else_branch.as_ref().expect("else branch");
    let StatementKind::Else(else_stmt) = &chained.kind else {
        panic!("expected else");
    };
    assert_eq!(raw_text(&else_stmt.body, 0), "Y");
}

#[test]
fn elsif_chain() {
    let page = parse_ok("{% if a %}A{% elsif b %}B{% else %}C{% endif %}");
    let StatementKind::If(outer) = &page.body.statements[0].kind else {
        panic!("expected if statement");
    };
    let chained = outer.else_branch.as_ref().expect("elsif branch");
    let StatementKind::If(elsif) = &chained.kind else {
        panic!("expected chained elsif");
    };
    assert!(elsif.is_else_if);
    assert!(elsif.else_branch.is_some());
}

#[test]
fn unless_inverts_the_condition() {
    let page = parse_ok("{% unless a %}X{% endunless %}");
    let StatementKind::If(if_stmt) = &page.body.statements[0].kind else {
        panic!("expected if statement");
    };
    assert!(if_stmt.invert_condition);
    assert!(!if_stmt.is_else_if);
}

#[test]
fn case_when_chain() {
    let page = parse_ok("{% case a %}{% when 1,2 %}A{% when 3 %}B{% else %}C{% endcase %}");
    let StatementKind::Case(case_stmt) = &page.body.statements[0].kind else {
        panic!("expected case statement");
    };
    assert!(matches!(
        &case_stmt.value.kind,
        ExprKind::Variable { name, .. } if &**name == "a"
    ));
    assert_eq!(case_stmt.body.statements.len(), 1);

    let StatementKind::When(first) = &case_stmt.body.statements[0].kind else {
        panic!("expected when branch");
    };
    assert_eq!(first.values.len(), 2);
    assert_eq!(raw_text(&first.body, 0), "A");

    let StatementKind::When(second) = &first.next.as_ref().expect("second when").kind else {
        panic!("expected chained when");
    };
    assert_eq!(second.values.len(), 1);
    assert_eq!(raw_text(&second.body, 0), "B");

    let StatementKind::Else(last) = &second.next.as_ref().expect("final else").kind else {
        panic!("expected chained else");
    };
    assert_eq!(raw_text(&last.body, 0), "C");
}

#[test]
fn assign_produces_an_assignment() {
    let page = parse_ok("{% assign x = 1 %}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(stmt.expr.kind, ExprKind::Assign { .. }));
}

#[test]
fn assign_requires_an_assignment() {
    let messages = expect_error("{% assign x %}");
    assert!(messages
        .iter()
        .any(|m| m.contains("expecting an assignment expression")));
}

#[test]
fn increment_decrement_desugar() {
    let page = parse_ok("{% increment c %}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { target, value } = &stmt.expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        &target.kind,
        ExprKind::Variable { name, .. } if &**name == "c"
    ));
    let ExprKind::Binary { op, right, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Literal(LiteralValue::Integer(1))
    ));

    let page = parse_ok("{% decrement c %}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { value, .. } = &stmt.expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        &value.kind,
        ExprKind::Binary { op: BinaryOp::Sub, .. }
    ));
}

#[test]
fn ifchanged_desugars_to_loop_changed() {
    let page = parse_ok("{% ifchanged %}X{% endifchanged %}");
    let StatementKind::If(if_stmt) = &page.body.statements[0].kind else {
        panic!("expected if statement");
    };
    let ExprKind::Member { target, name } = &if_stmt.condition.kind else {
        panic!("expected member access condition");
    };
    assert_eq!(&**name, "changed");
    assert!(matches!(
        &target.kind,
        ExprKind::Variable { name, .. } if &**name == "loop"
    ));
    assert_eq!(raw_text(&if_stmt.then_body, 0), "X");
}

#[test]
fn cycle_builds_an_array_call() {
    let page = parse_ok("{% cycle \"a\", \"b\" %}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { target, arguments } = &stmt.expr.kind else {
        panic!("expected call");
    };
    assert!(matches!(
        &target.kind,
        ExprKind::Variable { name, .. } if &**name == "cycle"
    ));
    assert_eq!(arguments.len(), 1);
    let ExprKind::ArrayInit { values } = &arguments[0].kind else {
        panic!("expected array argument");
    };
    assert_eq!(values.len(), 2);
}

#[test]
fn cycle_with_group_label() {
    let page = parse_ok("{% cycle g: \"a\", \"b\" %}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { arguments, .. } = &stmt.expr.kind else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), 2);
    assert!(matches!(
        &arguments[0].kind,
        ExprKind::Variable { name, .. } if &**name == "g"
    ));
    assert!(matches!(&arguments[1].kind, ExprKind::ArrayInit { .. }));
}

#[test]
fn cycle_retargets_when_mapping_is_enabled() {
    let options = ParserOptions {
        liquid_functions_to_weft: true,
        ..ParserOptions::default()
    };
    let page = parse_ok_with("{% cycle \"a\" %}", options);
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { target, .. } = &stmt.expr.kind else {
        panic!("expected call");
    };
    let ExprKind::Member { target, name } = &target.kind else {
        panic!("expected member target");
    };
    assert_eq!(&**name, "cycle");
    assert!(matches!(
        &target.kind,
        ExprKind::Variable { name, .. } if &**name == "array"
    ));
}

#[test]
fn object_section_accepts_paths_and_pipes() {
    let page = parse_ok("{{ user.name }}");
    assert!(matches!(
        page.body.statements[0].kind,
        StatementKind::Expression(_)
    ));

    let page = parse_ok("{{ a | capitalize }}");
    let StatementKind::Expression(stmt) = &page.body.statements[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(stmt.expr.kind, ExprKind::Pipe { .. }));
}

#[test]
fn object_section_rejects_other_expressions() {
    let messages = expect_error("{{ x = 1 }}");
    assert!(messages
        .iter()
        .any(|m| m.contains("variable path or a pipe call")));
}

#[test]
fn for_loop_with_break() {
    let page = parse_ok("{% for x in items %}{% break %}{% endfor %}");
    let StatementKind::For(for_stmt) = &page.body.statements[0].kind else {
        panic!("expected for statement");
    };
    assert_eq!(for_stmt.body.statements.len(), 1);
    assert!(matches!(
        for_stmt.body.statements[0].kind,
        StatementKind::Break
    ));
}

#[test]
fn capture_block() {
    let page = parse_ok("{% capture greeting %}Hello{% endcapture %}");
    let StatementKind::Capture(capture) = &page.body.statements[0].kind else {
        panic!("expected capture");
    };
    assert_eq!(raw_text(&capture.body, 0), "Hello");
}

#[test]
fn end_tag_mismatch_is_reported() {
    let messages = expect_error("{% if a %}X{% endfor %}");
    assert!(messages.iter().any(|m| m.contains("does not match")));
}

#[test]
fn end_tag_without_opener_is_reported() {
    let messages = expect_error("{% endif %}");
    assert!(messages
        .iter()
        .any(|m| m.contains("unable to find a pending statement")));
}

#[test]
fn case_body_rejects_other_tags() {
    let messages = expect_error("{% case a %}{% assign x = 1 %}{% when 1 %}A{% endcase %}");
    assert!(messages
        .iter()
        .any(|m| m.contains("inside a `case`")));
}
