//! Expression nodes.

use crate::ast::statement::Block;
use crate::foundation::Span;
use crate::trivia::TriviaSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// An expression node: kind payload, source span and attached trivia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    #[serde(default, skip_serializing_if = "TriviaSet::is_empty")]
    pub trivia: TriviaSet,
}

impl Expr {
    /// Create an expression with no trivia.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            trivia: TriviaSet::default(),
        }
    }

    /// True for expressions that name a storage location: a variable or a
    /// member/index path rooted in one.
    pub fn is_variable_path(&self) -> bool {
        match &self.kind {
            ExprKind::Variable { .. } => true,
            ExprKind::Member { target, .. } | ExprKind::Index { target, .. } => {
                target.is_variable_path()
            }
            _ => false,
        }
    }
}

/// The closed set of expression kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Named variable; `special` marks `$`-prefixed names.
    Variable { name: Rc<str>, special: bool },
    Literal(LiteralValue),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `target = value`; the target is a variable path.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `target(arguments...)`.
    Call {
        target: Box<Expr>,
        arguments: Vec<Expr>,
    },
    /// `[a, b, c]`.
    ArrayInit { values: Vec<Expr> },
    /// `from | to`: feed `from` into the pipeline stage `to`.
    Pipe {
        from: Box<Expr>,
        to: Box<Expr>,
    },
    /// `target.name`.
    Member {
        target: Box<Expr>,
        name: Rc<str>,
    },
    /// `target[index]`.
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `do ... end` function value.
    AnonymousFunction { body: Block },
}

/// Literal values carried directly in the AST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Rc<str>),
}

/// Binary operators, ordered roughly by precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    NullCoalesce,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Range,
    Add,
    Sub,
    Mul,
    Div,
    DivInt,
    Mod,
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::NullCoalesce => "??",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Range => "..",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::DivInt => "//",
            BinaryOp::Mod => "%",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::new(
            ExprKind::Variable {
                name: Rc::from(name),
                special: false,
            },
            Span::new(0, 0, name.len() as u32),
        )
    }

    #[test]
    fn variable_paths() {
        assert!(var("a").is_variable_path());

        let member = Expr::new(
            ExprKind::Member {
                target: Box::new(var("a")),
                name: Rc::from("b"),
            },
            Span::new(0, 0, 3),
        );
        assert!(member.is_variable_path());

        let call = Expr::new(
            ExprKind::Call {
                target: Box::new(var("f")),
                arguments: vec![],
            },
            Span::new(0, 0, 3),
        );
        assert!(!call.is_variable_path());
    }

    #[test]
    fn operator_display() {
        assert_eq!(BinaryOp::DivInt.to_string(), "//");
        assert_eq!(BinaryOp::Range.to_string(), "..");
        assert_eq!(UnaryOp::Not.to_string(), "!");
    }
}
