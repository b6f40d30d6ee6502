//! Liquid-dialect routing and tag parsers.
//!
//! Object sections (`{{ ... }}`) hold a single variable path or pipe call.
//! Tag sections (`{% ... %}`) are keyword-dispatched; block tags close with
//! an `end<tag>` terminator that resolves against the block stack like the
//! default dialect's `end`.
//!
//! Desugarings follow the reference behavior: `unless` is an inverted `if`,
//! `ifchanged` becomes `if loop.changed`, `increment x`/`decrement x`
//! become `x = x + 1`/`x = x - 1`, and `cycle` turns into a call on the
//! `cycle` builtin (retargeted onto `array.cycle` when
//! `liquid_functions_to_weft` is set).

use super::expr;
use super::stack::BlockKind;
use super::statements::token_text;
use super::{BlockExit, Parser};
use std::rc::Rc;
use weft_ast::{
    Expr, ExprKind, ExpressionStatement, LiteralValue, Span, Statement, StatementKind,
};
use weft_lexer::TokenKind;

/// Parse an object-section statement: `{{ expr }}`.
pub(crate) fn parse_object_section(p: &mut Parser) -> Option<Statement> {
    let open = p.open_statement();
    let expr = expr::parse_statement_expression(p)?;
    if !(expr.is_variable_path() || matches!(expr.kind, ExprKind::Pipe { .. })) {
        p.log_error(
            expr.span,
            "an object section must contain a variable path or a pipe call",
        );
    }
    p.expect_end_of_statement();
    Some(p.close_statement(open, StatementKind::Expression(ExpressionStatement { expr })))
}

/// Dispatch a tag-section keyword.
pub(crate) fn parse_tag_keyword(p: &mut Parser, name: Rc<str>) -> Option<Statement> {
    let parent = p.blocks.last();
    if parent == BlockKind::Case
        && !(&*name == "when" || &*name == "else" || &*name == "case" || name.starts_with("end"))
    {
        let span = p.stream.current_span();
        p.log_error(
            span,
            "only `when`, `else` and `endcase` are allowed inside a `case`",
        );
    }
    match &*name {
        "if" => {
            let open = p.open_statement();
            p.parse_if_statement(open, false, false, "if")
        }
        "unless" => {
            let open = p.open_statement();
            p.parse_if_statement(open, false, true, "unless")
        }
        "ifchanged" => parse_ifchanged(p),
        "elsif" => handle_elsif(p),
        "else" => p.handle_else(),
        "case" => {
            let open = p.open_statement();
            p.parse_case_statement(open)
        }
        "when" => p.handle_when(),
        "for" => {
            let open = p.open_statement();
            p.parse_for_statement(open)
        }
        "capture" => {
            let open = p.open_statement();
            p.parse_target_block_statement(open, name)
        }
        "cycle" => parse_cycle(p),
        "assign" => parse_assign(p),
        "increment" => parse_crement(p, false),
        "decrement" => parse_crement(p, true),
        "break" => {
            let open = p.open_statement();
            p.parse_simple_statement(open, StatementKind::Break)
        }
        "continue" => {
            let open = p.open_statement();
            p.parse_simple_statement(open, StatementKind::Continue)
        }
        _ if name.starts_with("end") => {
            handle_end_tag(p, &name);
            None
        }
        _ => p.parse_expression_statement(),
    }
}

/// `{% elsif cond %}`: chained inverted-free `if`, valid only under an `if`.
fn handle_elsif(p: &mut Parser) -> Option<Statement> {
    let parent = p.blocks.last();
    let kw_span = p.stream.current_span();
    let open = p.open_statement();
    let valid = matches!(parent, BlockKind::If { .. });
    if !valid {
        p.log_error(kw_span, "`elsif` without a matching `if`");
    }
    let statement = p.parse_if_statement(open, true, false, "if")?;
    if valid {
        p.chained = Some(statement);
        None
    } else {
        Some(statement)
    }
}

/// `{% ifchanged %} ... {% endifchanged %}` desugars to `if loop.changed`.
fn parse_ifchanged(p: &mut Parser) -> Option<Statement> {
    let open = p.open_statement();
    let kw_span = p.stream.current_span();
    p.stream.advance(); // ifchanged
    p.expect_end_of_statement();
    let then_body = p.parse_block(BlockKind::If { else_if: false });
    let else_branch = p.take_chained();
    let end_trivia = p.expect_block_end("ifchanged");
    let loop_var = Expr::new(
        ExprKind::Variable {
            name: Rc::from("loop"),
            special: false,
        },
        kw_span,
    );
    let condition = Expr::new(
        ExprKind::Member {
            target: Box::new(loop_var),
            name: Rc::from("changed"),
        },
        kw_span,
    );
    let mut statement = p.close_statement(
        open,
        StatementKind::If(weft_ast::IfStatement {
            condition,
            is_else_if: false,
            invert_condition: false,
            then_body,
            else_branch: else_branch.map(Box::new),
        }),
    );
    statement.trivia.after.extend(end_trivia);
    Some(statement)
}

/// `{% endif %}`, `{% endfor %}`, ... resolve against the block stack.
fn handle_end_tag(p: &mut Parser, name: &str) {
    let span = p.stream.current_span();
    p.stream.advance();
    let expected = match &name[3..] {
        "if" | "unless" | "ifchanged" => Some(BlockKind::If { else_if: false }),
        "for" => Some(BlockKind::For),
        "case" => Some(BlockKind::Case),
        "capture" => Some(BlockKind::Capture),
        _ => None,
    };
    let Some(expected) = expected else {
        p.log_error(span, format!("unknown end tag `{name}`"));
        return;
    };
    match p.blocks.find_first_expecting_end() {
        Some(found) if std::mem::discriminant(&found) == std::mem::discriminant(&expected) => {
            p.record_end_trivia(span);
            p.exit = Some(BlockExit::End);
        }
        Some(found) => {
            p.log_error(
                span,
                format!(
                    "`{name}` does not match the pending `{}` statement",
                    found.keyword()
                ),
            );
            p.record_end_trivia(span);
            p.exit = Some(BlockExit::End);
        }
        None => {
            p.log_error(span, format!("unable to find a pending statement for `{name}`"));
        }
    }
}

/// `{% assign x = expr %}`.
fn parse_assign(p: &mut Parser) -> Option<Statement> {
    p.stream.clear_pending_trivia();
    let open = p.open_statement();
    p.stream.advance(); // assign
    let expr = expr::parse_statement_expression(p)?;
    if !matches!(expr.kind, ExprKind::Assign { .. }) {
        p.log_error(expr.span, "expecting an assignment expression after `assign`");
    }
    p.expect_end_of_statement();
    Some(p.close_statement(open, StatementKind::Expression(ExpressionStatement { expr })))
}

/// `{% increment x %}` / `{% decrement x %}` desugar to `x = x ± 1`.
fn parse_crement(p: &mut Parser, decrement: bool) -> Option<Statement> {
    let open = p.open_statement();
    p.stream.advance(); // increment / decrement
    let keyword = if decrement { "decrement" } else { "increment" };
    let variable = p.parse_variable(&format!("after `{keyword}`"))?;
    let one = Expr::new(
        ExprKind::Literal(LiteralValue::Integer(1)),
        Span::point(p.file_id, variable.span.end),
    );
    let op = if decrement {
        weft_ast::BinaryOp::Sub
    } else {
        weft_ast::BinaryOp::Add
    };
    let value = Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(variable.clone()),
            right: Box::new(one),
        },
        variable.span,
    );
    let assign = Expr::new(
        ExprKind::Assign {
            target: Box::new(variable.clone()),
            value: Box::new(value),
        },
        variable.span,
    );
    p.expect_end_of_statement();
    Some(p.close_statement(
        open,
        StatementKind::Expression(ExpressionStatement { expr: assign }),
    ))
}

/// `{% cycle "a", "b" %}` or `{% cycle group: "a", "b" %}`.
///
/// Builds a call on the `cycle` builtin whose last argument is the array of
/// cycled values; a group label, when present, becomes the first argument.
fn parse_cycle(p: &mut Parser) -> Option<Statement> {
    let open = p.open_statement();
    let kw_span = p.stream.current_span();
    p.stream.advance(); // cycle

    let first = expr::parse_value(p)?;
    let mut group = None;
    let mut values = Vec::new();
    if p.stream.current().kind == TokenKind::Colon {
        p.stream.advance();
        group = Some(first);
    } else {
        values.push(first);
        if p.stream.current().kind == TokenKind::Comma {
            p.stream.advance();
        }
    }
    while expr::is_start_of_expression(&p.stream.current().kind) {
        match expr::parse_value(p) {
            Some(value) => values.push(value),
            None => break,
        }
        if p.stream.current().kind == TokenKind::Comma {
            p.stream.advance();
        } else {
            break;
        }
    }
    if values.is_empty() {
        let span = p.stream.current_span();
        p.log_error(
            span,
            format!(
                "expecting at least one value after `cycle`, found {}",
                token_text(&p.stream.current().kind)
            ),
        );
    }

    let value_span = values
        .first()
        .zip(values.last())
        .map(|(first, last)| first.span.union(&last.span))
        .unwrap_or(kw_span);
    let array = Expr::new(ExprKind::ArrayInit { values }, value_span);

    let cycle_var = Expr::new(
        ExprKind::Variable {
            name: Rc::from(if p.options.liquid_functions_to_weft {
                "array"
            } else {
                "cycle"
            }),
            special: false,
        },
        kw_span,
    );
    let target = if p.options.liquid_functions_to_weft {
        Expr::new(
            ExprKind::Member {
                target: Box::new(cycle_var),
                name: Rc::from("cycle"),
            },
            kw_span,
        )
    } else {
        cycle_var
    };

    let mut arguments = Vec::new();
    if let Some(group) = group {
        arguments.push(group);
    }
    arguments.push(array);
    let span = Span::new(p.file_id, kw_span.start, p.stream.previous_end());
    let call = Expr::new(
        ExprKind::Call {
            target: Box::new(target),
            arguments,
        },
        span,
    );

    p.expect_end_of_statement();
    Some(p.close_statement(
        open,
        StatementKind::Expression(ExpressionStatement { expr: call }),
    ))
}
