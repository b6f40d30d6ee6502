//! Foundation types shared across the lexer, parser and AST.

pub mod span;

pub use span::{SourceFile, SourceMap, Span};
