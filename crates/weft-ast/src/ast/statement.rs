//! Statement nodes.

use crate::ast::expr::Expr;
use crate::foundation::Span;
use crate::trivia::TriviaSet;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A fully parsed template.
///
/// `front_matter` is populated only when the lexer ran in a front-matter
/// mode; it holds the statements between the opening and closing markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPage {
    pub front_matter: Option<Block>,
    pub body: Block,
    pub span: Span,
}

/// An ordered list of statements.
///
/// Blocks never carry trivia; pending trivia migrate to the first child on
/// open and stay with the last child on close. A block's span covers the
/// spans of its statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    /// Create an empty block anchored at a position.
    pub fn new(span: Span) -> Self {
        Self {
            statements: Vec::new(),
            span,
        }
    }

    /// True when the block holds no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A statement node: kind payload, source span and attached trivia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
    #[serde(default, skip_serializing_if = "TriviaSet::is_empty")]
    pub trivia: TriviaSet,
}

impl Statement {
    /// Create a statement with no trivia.
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self {
            kind,
            span,
            trivia: TriviaSet::default(),
        }
    }

    /// True for the members of the condition-chain capability set:
    /// `if` (as an `else if` link), `else` and `when`.
    pub fn is_condition_statement(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::If(_) | StatementKind::Else(_) | StatementKind::When(_)
        )
    }
}

/// The closed set of statement kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Literal output copied to the result verbatim.
    Raw(RawStatement),
    /// Empty code section (`{{ }}`); evaluates to nothing.
    Nop,
    /// An expression evaluated for its value or effect.
    Expression(ExpressionStatement),
    If(IfStatement),
    Else(ElseStatement),
    For(ForStatement),
    While(WhileStatement),
    Case(CaseStatement),
    When(WhenStatement),
    Capture(CaptureStatement),
    With(WithStatement),
    Wrap(WrapStatement),
    Func(FuncStatement),
    Import(ImportStatement),
    Ret(RetStatement),
    Break,
    Continue,
    ReadOnly(ReadOnlyStatement),
}

/// A slice of source text emitted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub text: Rc<str>,
    /// Nesting depth of the `{%{ ... }%}` escape block this text came from;
    /// zero for plain raw text.
    pub escape_count: u8,
}

/// Expression in statement position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expr: Expr,
}

/// `if`/`unless` with an optional chained continuation.
///
/// `else_branch`, when present, is an `Else` statement or an `If` with
/// `is_else_if` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expr,
    /// This `if` entered through an `else if` / `elsif` chain and is closed
    /// by the chain head's `end`.
    pub is_else_if: bool,
    /// Negate the condition (`unless` in the Liquid dialect).
    pub invert_condition: bool,
    pub then_body: Block,
    pub else_branch: Option<Box<Statement>>,
}

/// Final `else` branch of an `if` or `when` chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseStatement {
    pub body: Block,
}

/// `for <variable> in <iterator>` loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    pub variable: Expr,
    pub iterator: Expr,
    pub body: Block,
}

/// `while <condition>` loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: Expr,
    pub body: Block,
}

/// `case <value>` dispatch.
///
/// The body holds only `when` chains and trivia; raw text between branches
/// is dropped during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStatement {
    pub value: Expr,
    pub body: Block,
}

/// One `when` branch; `next` links the following `when` or `else`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenStatement {
    pub values: Vec<Expr>,
    pub body: Block,
    pub next: Option<Box<Statement>>,
}

/// `capture <target>`: redirect body output into a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureStatement {
    pub target: Expr,
    pub body: Block,
}

/// `with <name>`: object scoping block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithStatement {
    pub name: Expr,
    pub body: Block,
}

/// `wrap <target>`: pass the body to a wrapping function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapStatement {
    pub target: Expr,
    pub body: Block,
}

/// `func [name]`: function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncStatement {
    pub name: Option<Rc<str>>,
    pub body: Block,
}

/// `import <expr>`: splice an object's members into the current scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub expr: Expr,
}

/// `ret [expr]`: return from the enclosing function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetStatement {
    pub expr: Option<Expr>,
}

/// `readonly <variable>`: freeze a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadOnlyStatement {
    pub variable: Expr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{ExprKind, LiteralValue};

    fn span() -> Span {
        Span::new(0, 0, 1)
    }

    #[test]
    fn condition_statement_set() {
        let else_stmt = Statement::new(
            StatementKind::Else(ElseStatement {
                body: Block::new(span()),
            }),
            span(),
        );
        assert!(else_stmt.is_condition_statement());

        let brk = Statement::new(StatementKind::Break, span());
        assert!(!brk.is_condition_statement());
    }

    #[test]
    fn statements_serialize() {
        let stmt = Statement::new(
            StatementKind::Expression(ExpressionStatement {
                expr: Expr::new(ExprKind::Literal(LiteralValue::Integer(1)), span()),
            }),
            span(),
        );
        let json = serde_json::to_string(&stmt).unwrap();
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(stmt, back);
    }
}
