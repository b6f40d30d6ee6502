//! Expression parsing: pratt-style precedence climbing.
//!
//! The entry points are [`parse`] (plain expression, pipes included) and
//! [`parse_statement_expression`] (additionally accepts `=` assignment).
//! Precedence and associativity live in one table, `binary_op_info`.
//!
//! Two contract points matter to the statement dispatcher:
//! - a `do ... end` anonymous-function tail consumes its own terminator and
//!   raises `Parser::has_anonymous_function`, so the dispatcher skips the
//!   end-of-statement check;
//! - keywords such as `for`/`while` followed by `.` are promoted to
//!   expressions by the dispatcher before this module ever sees them.

use super::stack::BlockKind;
use super::statements::token_text;
use super::Parser;
use std::rc::Rc;
use weft_ast::{BinaryOp, Expr, ExprKind, LiteralValue, Span, Trivia, UnaryOp};
use weft_lexer::TokenKind;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binary operator metadata: precedence (higher binds tighter),
/// associativity and the AST operator.
fn binary_op_info(kind: &TokenKind) -> Option<(u8, Assoc, BinaryOp)> {
    match kind {
        TokenKind::PipePipe => Some((10, Assoc::Left, BinaryOp::Or)),
        TokenKind::AmpAmp => Some((20, Assoc::Left, BinaryOp::And)),
        TokenKind::Ident(name) if &**name == "or" => Some((10, Assoc::Left, BinaryOp::Or)),
        TokenKind::Ident(name) if &**name == "and" => Some((20, Assoc::Left, BinaryOp::And)),
        TokenKind::QuestionQuestion => Some((25, Assoc::Right, BinaryOp::NullCoalesce)),
        TokenKind::EqEq => Some((30, Assoc::Left, BinaryOp::Eq)),
        TokenKind::BangEq => Some((30, Assoc::Left, BinaryOp::Ne)),
        TokenKind::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        TokenKind::LtEq => Some((30, Assoc::Left, BinaryOp::Le)),
        TokenKind::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        TokenKind::GtEq => Some((30, Assoc::Left, BinaryOp::Ge)),
        TokenKind::DotDot => Some((35, Assoc::Left, BinaryOp::Range)),
        TokenKind::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        TokenKind::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        TokenKind::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        TokenKind::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        TokenKind::SlashSlash => Some((50, Assoc::Left, BinaryOp::DivInt)),
        TokenKind::Percent => Some((50, Assoc::Left, BinaryOp::Mod)),
        _ => None,
    }
}

/// Can this token begin an expression?
pub(crate) fn is_start_of_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::IdentSpecial(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Minus
            | TokenKind::Bang
    )
}

/// Parse a statement-position expression: pipes plus `=` assignment.
pub(crate) fn parse_statement_expression(p: &mut Parser) -> Option<Expr> {
    let left = parse(p)?;
    if p.stream.current().kind != TokenKind::Eq {
        return Some(left);
    }
    if !left.is_variable_path() {
        p.log_error(
            left.span,
            "the left side of an assignment must be a variable path",
        );
    }
    p.stream.advance();
    let value = parse_statement_expression(p)?;
    let span = Span::new(left.span.file_id, left.span.start, value.span.end);
    Some(Expr::new(
        ExprKind::Assign {
            target: Box::new(left),
            value: Box::new(value),
        },
        span,
    ))
}

/// Parse an expression, including pipe chains.
pub(crate) fn parse(p: &mut Parser) -> Option<Expr> {
    let mut left = parse_pratt(p, 0)?;
    while p.stream.current().kind == TokenKind::Pipe {
        p.stream.advance();
        let right = parse_pratt(p, 0)?;
        let span = Span::new(left.span.file_id, left.span.start, right.span.end);
        left = Expr::new(
            ExprKind::Pipe {
                from: Box::new(left),
                to: Box::new(right),
            },
            span,
        );
    }
    Some(left)
}

/// Parse a single `when` value: a variable path or literal, no binary
/// operators (`,`, `||` and `or` act as separators there).
pub(crate) fn parse_value(p: &mut Parser) -> Option<Expr> {
    parse_prefix(p)
}

fn parse_pratt(p: &mut Parser, min_prec: u8) -> Option<Expr> {
    p.enter_expression();
    let result = parse_pratt_inner(p, min_prec);
    p.leave_expression();
    result
}

fn parse_pratt_inner(p: &mut Parser, min_prec: u8) -> Option<Expr> {
    if p.has_fatal_error {
        return None;
    }
    let mut left = parse_prefix(p)?;
    loop {
        let Some((prec, assoc, op)) = binary_op_info(&p.stream.current().kind) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        p.stream.advance();
        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(p, next_prec)?;
        let span = Span::new(left.span.file_id, left.span.start, right.span.end);
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
    }
    Some(left)
}

fn parse_prefix(p: &mut Parser) -> Option<Expr> {
    let op = match p.stream.current().kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Bang => Some(UnaryOp::Not),
        _ => None,
    };
    let Some(op) = op else {
        return parse_postfix(p);
    };
    let start = p.stream.current_start();
    p.stream.advance();
    let operand = parse_prefix(p)?;
    let span = Span::new(p.file_id, start, operand.span.end);
    Some(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

fn parse_postfix(p: &mut Parser) -> Option<Expr> {
    let mut expr = parse_atom(p)?;
    loop {
        match p.stream.current().kind {
            TokenKind::Dot => {
                p.stream.advance();
                let name: Rc<str> = match p.stream.current().kind.clone() {
                    TokenKind::Ident(name) => {
                        p.stream.advance();
                        name
                    }
                    // Liquid-style list indexing: `users.0.name`
                    TokenKind::Integer(index) => {
                        p.stream.advance();
                        Rc::from(index.to_string())
                    }
                    other => {
                        let span = p.stream.current_span();
                        p.log_error(
                            span,
                            format!("expecting a member name after `.`, found {}", token_text(&other)),
                        );
                        break;
                    }
                };
                let span = Span::new(p.file_id, expr.span.start, p.stream.previous_end());
                expr = Expr::new(
                    ExprKind::Member {
                        target: Box::new(expr),
                        name,
                    },
                    span,
                );
            }
            TokenKind::LBracket => {
                p.stream.advance();
                p.stream.push_allow_newline();
                let index = parse(p);
                if p.stream.current().kind == TokenKind::RBracket {
                    p.stream.advance();
                } else if !p.has_fatal_error {
                    let span = p.stream.current_span();
                    p.log_error(span, "expecting `]` to close the indexer");
                }
                p.stream.pop_allow_newline();
                let index = index?;
                let span = Span::new(p.file_id, expr.span.start, p.stream.previous_end());
                expr = Expr::new(
                    ExprKind::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            }
            TokenKind::LParen => {
                let arguments = parse_call_args(p)?;
                let span = Span::new(p.file_id, expr.span.start, p.stream.previous_end());
                expr = Expr::new(
                    ExprKind::Call {
                        target: Box::new(expr),
                        arguments,
                    },
                    span,
                );
            }
            _ => break,
        }
    }
    Some(expr)
}

fn parse_call_args(p: &mut Parser) -> Option<Vec<Expr>> {
    p.stream.advance(); // (
    p.stream.push_allow_newline();
    let mut arguments = Vec::new();
    loop {
        if p.stream.current().kind == TokenKind::RParen {
            break;
        }
        match parse(p) {
            Some(argument) => arguments.push(argument),
            None => break,
        }
        if p.stream.current().kind == TokenKind::Comma {
            p.stream.advance();
            continue;
        }
        break;
    }
    if p.stream.current().kind == TokenKind::RParen {
        p.stream.advance();
    } else if !p.has_fatal_error {
        let span = p.stream.current_span();
        p.log_error(span, "expecting `)` to close the argument list");
    }
    p.stream.pop_allow_newline();
    Some(arguments)
}

fn parse_atom(p: &mut Parser) -> Option<Expr> {
    let before = if p.keep_trivia {
        p.stream.take_pending_trivia()
    } else {
        Vec::new()
    };
    let start = p.stream.current_start();
    let kind = p.stream.current().kind.clone();

    let mut expr = match kind {
        TokenKind::Integer(value) => {
            p.stream.advance();
            literal(p, start, LiteralValue::Integer(value))
        }
        TokenKind::Float(value) => {
            p.stream.advance();
            literal(p, start, LiteralValue::Float(value))
        }
        TokenKind::String(value) => {
            p.stream.advance();
            literal(p, start, LiteralValue::String(value))
        }
        TokenKind::Ident(name) => match &*name {
            "true" => {
                p.stream.advance();
                literal(p, start, LiteralValue::Bool(true))
            }
            "false" => {
                p.stream.advance();
                literal(p, start, LiteralValue::Bool(false))
            }
            "null" => {
                p.stream.advance();
                literal(p, start, LiteralValue::Null)
            }
            "do" => parse_anonymous_function(p, start)?,
            _ => {
                p.stream.advance();
                let span = Span::new(p.file_id, start, p.stream.previous_end());
                Expr::new(
                    ExprKind::Variable {
                        name,
                        special: false,
                    },
                    span,
                )
            }
        },
        TokenKind::IdentSpecial(name) => {
            p.stream.advance();
            let span = Span::new(p.file_id, start, p.stream.previous_end());
            Expr::new(
                ExprKind::Variable {
                    name,
                    special: true,
                },
                span,
            )
        }
        TokenKind::LParen => {
            p.stream.advance();
            p.stream.push_allow_newline();
            let inner = parse(p);
            if p.stream.current().kind == TokenKind::RParen {
                p.stream.advance();
            } else if !p.has_fatal_error {
                let span = p.stream.current_span();
                p.log_error(span, "expecting `)` to close the expression");
            }
            p.stream.pop_allow_newline();
            inner?
        }
        TokenKind::LBracket => parse_array_initializer(p, start)?,
        other => {
            let span = p.stream.current_span();
            p.log_error(
                span,
                format!("unexpected token {} in an expression", token_text(&other)),
            );
            p.stream.advance();
            return None;
        }
    };

    if !before.is_empty() {
        let mut merged = before;
        merged.extend(expr.trivia.before.drain(..));
        expr.trivia.before = merged;
    }
    Some(expr)
}

fn literal(p: &Parser, start: u32, value: LiteralValue) -> Expr {
    let span = Span::new(p.file_id, start, p.stream.previous_end());
    Expr::new(ExprKind::Literal(value), span)
}

/// `[a, b, c]`
fn parse_array_initializer(p: &mut Parser, start: u32) -> Option<Expr> {
    p.stream.advance(); // [
    p.stream.push_allow_newline();
    let mut values = Vec::new();
    loop {
        if p.stream.current().kind == TokenKind::RBracket {
            break;
        }
        match parse(p) {
            Some(value) => values.push(value),
            None => break,
        }
        if p.stream.current().kind == TokenKind::Comma {
            p.stream.advance();
            continue;
        }
        break;
    }
    if p.stream.current().kind == TokenKind::RBracket {
        p.stream.advance();
    } else if !p.has_fatal_error {
        let span = p.stream.current_span();
        p.log_error(span, "expecting `]` to close the array initializer");
    }
    p.stream.pop_allow_newline();
    let span = Span::new(p.file_id, start, p.stream.previous_end());
    Some(Expr::new(ExprKind::ArrayInit { values }, span))
}

/// `do ... end` anonymous-function tail.
///
/// The function body is a full statement block; the `end` that closes it
/// doubles as the statement terminator, which the dispatcher learns through
/// `has_anonymous_function`.
fn parse_anonymous_function(p: &mut Parser, start: u32) -> Option<Expr> {
    p.stream.advance(); // do
    p.expect_end_of_statement();
    let body = p.parse_block(BlockKind::Func);
    let end_trivia: Vec<Trivia> = p.expect_block_end("do");
    p.has_anonymous_function = true;
    let span = Span::new(p.file_id, start, p.stream.previous_end());
    let mut expr = Expr::new(ExprKind::AnonymousFunction { body }, span);
    expr.trivia.after = end_trivia;
    Some(expr)
}
