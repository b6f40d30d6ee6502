//! AST node families.
//!
//! Statements and expressions are disjoint tagged-variant families. Every
//! node is a flat `{ kind, span, trivia }` record; per-kind payloads live in
//! the kind enums. Condition chains (`if`/`else if`/`else`, `when`/`else`)
//! are singly linked through `Option<Box<Statement>>` fields whose kinds are
//! invariant-checked with [`Statement::is_condition_statement`]; there are
//! no parent back-pointers.

pub mod expr;
pub mod statement;

pub use expr::{BinaryOp, Expr, ExprKind, LiteralValue, UnaryOp};
pub use statement::*;

use crate::foundation::Span;

/// Anything that knows its source span.
pub trait HasSpan {
    fn span(&self) -> Span;
}

impl HasSpan for Expr {
    fn span(&self) -> Span {
        self.span
    }
}

impl HasSpan for Statement {
    fn span(&self) -> Span {
        self.span
    }
}

impl HasSpan for Block {
    fn span(&self) -> Span {
        self.span
    }
}
