//! Parser core.
//!
//! ## Architecture
//!
//! - `stream`: token stream adapter with lookahead and trivia routing
//! - `stack`: block stack for `end` resolution
//! - `statements`: statement dispatcher and default-dialect parsers
//! - `liquid`: Liquid-dialect keyword routing and tag parsers
//! - `expr`: pratt expression parser
//!
//! A [`Parser`] is single-use: construct it with a configured lexer, call
//! [`Parser::parse`] once, then read [`Parser::messages`]. `parse` returns
//! `None` whenever any error was logged; partial pages are never exposed.

pub(crate) mod expr;
pub(crate) mod liquid;
pub mod stack;
pub(crate) mod statements;
pub(crate) mod stream;

use stack::{BlockKind, BlockStack};
use std::collections::VecDeque;
use stream::TokenStream;
use weft_ast::{
    Block, LogMessage, ScriptPage, Span, Statement, StatementKind, Trivia, TriviaKind, TriviaSet,
};
use weft_lexer::{Dialect, Lexer, ScriptMode, TokenKind};

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Maximum expression nesting before a single fatal diagnostic is
    /// raised. `None` disables the check.
    pub expression_depth_limit: Option<usize>,
    /// Rewrite Liquid builtin calls (`cycle`, ...) onto their default-dialect
    /// library targets.
    pub liquid_functions_to_weft: bool,
}

/// Why a body loop stopped consuming statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockExit {
    /// An `end`/`end<tag>` resolved to an open statement.
    End,
    /// End of input.
    Eof,
    /// Unrecoverable dispatch state; stop quietly.
    Stop,
    /// The closing front-matter marker was reached.
    FrontMatter,
}

/// Position captured when a statement node opens.
pub(crate) struct StatementStart {
    pub(crate) start: u32,
    pub(crate) before: Vec<Trivia>,
}

/// The template parser.
pub struct Parser<'s> {
    pub(crate) stream: TokenStream<'s>,
    pub(crate) options: ParserOptions,
    pub(crate) dialect: Dialect,
    pub(crate) mode: ScriptMode,
    pub(crate) keep_trivia: bool,
    pub(crate) file_id: u16,

    pub(crate) in_code_section: bool,
    pub(crate) liquid_tag_section: bool,
    pub(crate) in_front_matter: bool,
    pub(crate) pending_front_matter_nudge: bool,

    pub(crate) blocks: BlockStack,
    pub(crate) pending_statements: VecDeque<Statement>,
    pub(crate) chained: Option<Statement>,
    pub(crate) exit: Option<BlockExit>,
    pub(crate) end_trivia: Vec<Trivia>,

    messages: Vec<LogMessage>,
    has_errors: bool,
    pub(crate) has_fatal_error: bool,

    expression_depth: usize,
    depth_limit_hit: bool,
    pub(crate) has_anonymous_function: bool,
}

impl<'s> Parser<'s> {
    /// Construct a parser with default options.
    pub fn new(lexer: Lexer<'s>) -> Self {
        Self::with_options(lexer, ParserOptions::default())
    }

    /// Construct a parser with explicit options.
    pub fn with_options(lexer: Lexer<'s>, options: ParserOptions) -> Self {
        let lexer_options = lexer.options();
        let mode = lexer_options.mode;
        let dialect = lexer_options.dialect;
        let keep_trivia = lexer_options.keep_trivia;
        let file_id = lexer.file_id();
        Self {
            stream: TokenStream::new(lexer),
            options,
            dialect,
            mode,
            keep_trivia,
            file_id,
            in_code_section: false,
            liquid_tag_section: false,
            in_front_matter: false,
            pending_front_matter_nudge: false,
            blocks: BlockStack::new(),
            pending_statements: VecDeque::new(),
            chained: None,
            exit: None,
            end_trivia: Vec::new(),
            messages: Vec::new(),
            has_errors: false,
            has_fatal_error: false,
            expression_depth: 0,
            depth_limit_hit: false,
            has_anonymous_function: false,
        }
    }

    /// Diagnostics recorded so far.
    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    /// True when any error (parser or lexer) was recorded.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Parse the template.
    ///
    /// Returns the page on success, `None` when any error was logged. The
    /// parser is single-use; calling `parse` twice returns an empty page.
    pub fn parse(&mut self) -> Option<ScriptPage> {
        let mut front_matter = None;

        match self.mode {
            ScriptMode::FrontMatterOnly | ScriptMode::FrontMatterAndContent => {
                if self.stream.current().kind == TokenKind::FrontMatterMarker {
                    self.in_front_matter = true;
                    self.in_code_section = true;
                    self.stream.advance();
                    let block = self.parse_block(BlockKind::FrontMatter);
                    match self.exit {
                        Some(BlockExit::FrontMatter) => self.exit = None,
                        _ if self.has_fatal_error => {}
                        _ => self.log_error(
                            self.stream.current_span(),
                            "end of file reached before the end of the front matter",
                        ),
                    }
                    front_matter = Some(block);
                } else {
                    self.log_error(
                        self.stream.current_span(),
                        "expecting a front matter marker at the start of the template",
                    );
                }
            }
            ScriptMode::ScriptOnly => {
                self.in_code_section = true;
            }
            ScriptMode::Default => {}
        }

        let body = if self.mode == ScriptMode::FrontMatterOnly {
            Block::new(Span::point(self.file_id, self.stream.current_start()))
        } else {
            self.exit = None;
            self.parse_block(BlockKind::Root)
        };

        let lexer_errors: Vec<LogMessage> = self.stream.lexer_errors().to_vec();
        for message in lexer_errors {
            if message.is_error() {
                self.has_errors = true;
            }
            self.messages.push(message);
        }

        let page = ScriptPage {
            front_matter,
            body,
            span: Span::new(self.file_id, 0, self.stream.previous_end()),
        };
        if self.has_errors {
            None
        } else {
            Some(page)
        }
    }

    // --- body parsing ---

    /// Parse statements into a block until the body terminates.
    ///
    /// Pushes `kind` for the duration of the body; the resulting exit reason
    /// is left in `self.exit` for the owning statement parser.
    pub(crate) fn parse_block(&mut self, kind: BlockKind) -> Block {
        self.blocks.push(kind);
        let anchor = self.stream.current_start();
        let mut block = Block::new(Span::point(self.file_id, anchor));
        while self.exit.is_none() && !self.has_fatal_error {
            let mark = self.stream.advances();
            match self.try_parse_statement() {
                Some(statement) => block.statements.push(statement),
                None => {
                    if self.exit.is_none()
                        && !self.has_fatal_error
                        && self.stream.advances() == mark
                    {
                        debug_assert!(false, "statement dispatcher made no progress");
                        self.exit = Some(BlockExit::Stop);
                    }
                }
            }
        }
        if let (Some(first), Some(last)) = (block.statements.first(), block.statements.last()) {
            block.span = first.span.union(&last.span);
        }
        self.blocks.pop();
        block
    }

    // --- node lifecycle ---

    pub(crate) fn open_statement(&mut self) -> StatementStart {
        StatementStart {
            start: self.stream.current_start(),
            before: if self.keep_trivia {
                self.stream.take_pending_trivia()
            } else {
                Vec::new()
            },
        }
    }

    pub(crate) fn close_statement(
        &mut self,
        start: StatementStart,
        kind: StatementKind,
    ) -> Statement {
        let end = self.stream.previous_end().max(start.start);
        let mut statement = Statement::new(kind, Span::new(self.file_id, start.start, end));
        statement.trivia = TriviaSet {
            before: start.before,
            after: if self.keep_trivia {
                self.stream.take_pending_trivia()
            } else {
                Vec::new()
            },
        };
        statement
    }

    /// Consume a pending `End` exit for an end-bearing statement, returning
    /// the trivia collected at the `end` keyword. Logs a missing-end
    /// diagnostic when the body ran out of input instead.
    pub(crate) fn expect_block_end(&mut self, keyword: &str) -> Vec<Trivia> {
        match self.exit {
            Some(BlockExit::End) => {
                self.exit = None;
                std::mem::take(&mut self.end_trivia)
            }
            Some(BlockExit::Eof) | Some(BlockExit::FrontMatter) => {
                self.log_error(
                    self.stream.current_span(),
                    format!("missing `end` to close this `{keyword}` statement"),
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn take_chained(&mut self) -> Option<Statement> {
        self.chained.take()
    }

    // --- end of statement ---

    /// Require an end-of-statement token after a statement in a code
    /// section. Separators become trivia; a missing terminator is fatal.
    pub(crate) fn expect_end_of_statement(&mut self) {
        if self.has_anonymous_function {
            // The anonymous-function tail already consumed the terminator.
            self.has_anonymous_function = false;
            return;
        }
        let kind = self.stream.current().kind.clone();
        let accepted = match self.dialect {
            Dialect::Default => match kind {
                TokenKind::NewLine => {
                    let span = self.stream.current_span();
                    self.stream.push_trivia(TriviaKind::NewLine, span);
                    self.stream.advance();
                    true
                }
                TokenKind::SemiColon => {
                    let span = self.stream.current_span();
                    self.stream.push_trivia(TriviaKind::SemiColon, span);
                    self.stream.advance();
                    true
                }
                TokenKind::CodeExit | TokenKind::Eof | TokenKind::FrontMatterMarker => true,
                _ => false,
            },
            Dialect::Liquid => match kind {
                TokenKind::CodeExit => true,
                TokenKind::LiquidTagExit if self.liquid_tag_section => true,
                _ => false,
            },
        };
        if !accepted {
            let span = self.stream.current_span();
            let found = statements::token_text(&self.stream.current().kind);
            self.log_error(span, format!("expecting the end of the statement, found {found}"));
            self.has_fatal_error = true;
        }
    }

    // --- depth limiter ---

    pub(crate) fn enter_expression(&mut self) {
        self.expression_depth += 1;
        if let Some(limit) = self.options.expression_depth_limit {
            if self.expression_depth > limit && !self.depth_limit_hit {
                self.depth_limit_hit = true;
                self.log_error(
                    self.stream.current_span(),
                    format!("expression nesting exceeds the configured limit of {limit}"),
                );
                self.has_fatal_error = true;
            }
        }
    }

    pub(crate) fn leave_expression(&mut self) {
        debug_assert!(self.expression_depth > 0, "expression depth underflow");
        self.expression_depth = self.expression_depth.saturating_sub(1);
    }

    // --- diagnostics ---

    pub(crate) fn log_error(&mut self, span: Span, text: impl Into<String>) {
        self.messages.push(LogMessage::error(span, text));
        self.has_errors = true;
    }

    #[allow(dead_code)]
    pub(crate) fn log_warning(&mut self, span: Span, text: impl Into<String>) {
        self.messages.push(LogMessage::warning(span, text));
    }
}
