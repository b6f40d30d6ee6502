// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! weft: a textual template engine.
//!
//! This crate is the host-facing entry point: it wires the lexer and parser
//! together and re-exports the AST. Templates mix raw text with code
//! sections:
//!
//! ```text
//! Hello {{ name }}! {{ for item in items }}{{ item }}{{ end }}
//! ```
//!
//! # Examples
//!
//! ```
//! let result = weft::parse_str("Hello {{ name }}!");
//! let page = result.page.expect("parses cleanly");
//! assert_eq!(page.body.statements.len(), 3);
//! ```

pub use weft_ast as ast;
pub use weft_ast::{DiagnosticRenderer, LogMessage, ScriptPage, Severity, SourceMap, Span};
pub use weft_lexer::{Dialect, Lexer, LexerOptions, ScriptMode};
pub use weft_parser::{Parser, ParserOptions};

/// Outcome of a parse: the page (when error-free) plus all diagnostics.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed page; `None` when any error was logged.
    pub page: Option<ScriptPage>,
    /// Every diagnostic the lexer and parser produced.
    pub messages: Vec<LogMessage>,
}

impl ParseResult {
    /// True when no error was recorded.
    pub fn is_ok(&self) -> bool {
        self.page.is_some()
    }
}

/// Parse a template with default lexer and parser options.
pub fn parse_str(text: &str) -> ParseResult {
    parse_with(text, LexerOptions::default(), ParserOptions::default())
}

/// Parse a template with explicit options.
pub fn parse_with(
    text: &str,
    lexer_options: LexerOptions,
    parser_options: ParserOptions,
) -> ParseResult {
    tracing::debug!(
        source = %lexer_options.source_path.display(),
        bytes = text.len(),
        "parsing template"
    );
    let lexer = Lexer::new(text, lexer_options);
    let mut parser = Parser::with_options(lexer, parser_options);
    let page = parser.parse();
    let messages = parser.messages().to_vec();
    if page.is_none() {
        tracing::debug!(errors = messages.len(), "template has errors");
    }
    ParseResult { page, messages }
}
