// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Hand-written recursive descent parser for weft templates.
//!
//! The parser consumes the token stream produced by [`weft_lexer::Lexer`]
//! and emits a typed [`weft_ast::ScriptPage`]. It interleaves raw and code
//! modes, resolves `end`/`end<tag>` terminators through a block stack,
//! attaches trivia to nodes when retention is enabled, and keeps going after
//! recoverable errors so one pass reports as many problems as possible.
//!
//! # Examples
//!
//! ```
//! use weft_lexer::{Lexer, LexerOptions};
//! use weft_parser::Parser;
//!
//! let lexer = Lexer::new("Hello {{ name }}!", LexerOptions::default());
//! let mut parser = Parser::new(lexer);
//! let page = parser.parse().expect("template parses");
//! assert_eq!(page.body.statements.len(), 3);
//! ```

pub mod parser;

pub use parser::stack::{BlockKind, BlockStack};
pub use parser::{Parser, ParserOptions};

// Re-export the lexer surface the parser is constructed from.
pub use weft_lexer::{Dialect, Lexer, LexerOptions, ScriptMode, Token, TokenKind};
