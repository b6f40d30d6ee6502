//! Token stream adapter over the lexer.
//!
//! The adapter exposes `current`/`previous`/`advance`/`peek` over the raw
//! lexer iterator and never surfaces hidden tokens to the dispatcher:
//! whitespace and comments are reclassified into the pending-trivia buffer
//! (or dropped when retention is off). Newlines are hidden only while the
//! expression parser has raised the allow-newline level, which it does
//! around constructs that may span lines (argument lists, brackets).
//!
//! `peek` works through a small ordered buffer of already-fetched tokens
//! with a read cursor; the buffer is drained and reset whenever `advance`
//! catches up with its tail.

use weft_ast::{LogMessage, Span, Trivia, TriviaKind};
use weft_lexer::{Lexer, Token, TokenKind};

pub(crate) struct TokenStream<'s> {
    lexer: Lexer<'s>,
    buffer: Vec<Token>,
    cursor: usize,
    current: Token,
    previous: Token,
    pending: Vec<Trivia>,
    keep_trivia: bool,
    allow_newline: u32,
    advances: u64,
    file_id: u16,
}

impl<'s> TokenStream<'s> {
    pub(crate) fn new(lexer: Lexer<'s>) -> Self {
        let keep_trivia = lexer.options().keep_trivia;
        let file_id = lexer.file_id();
        let placeholder = Token {
            kind: TokenKind::Eof,
            span: 0..0,
        };
        let mut stream = Self {
            lexer,
            buffer: Vec::new(),
            cursor: 0,
            current: placeholder.clone(),
            previous: placeholder,
            pending: Vec::new(),
            keep_trivia,
            allow_newline: 0,
            advances: 0,
            file_id,
        };
        stream.advance();
        stream
    }

    /// The token the dispatcher is looking at. Never hidden.
    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    /// The last non-hidden token consumed.
    pub(crate) fn previous(&self) -> &Token {
        &self.previous
    }

    /// Move to the next non-hidden token, routing hidden ones to the
    /// pending-trivia buffer.
    pub(crate) fn advance(&mut self) {
        self.advances += 1;
        self.previous = self.current.clone();
        loop {
            let token = self.fetch();
            if self.is_hidden(&token.kind) {
                self.reclassify(&token);
            } else {
                self.current = token;
                return;
            }
        }
    }

    /// Next non-hidden token after `current`, without consuming anything.
    pub(crate) fn peek(&mut self) -> TokenKind {
        let mut index = self.cursor;
        loop {
            if index < self.buffer.len() {
                let kind = self.buffer[index].kind.clone();
                if !self.is_hidden(&kind) {
                    return kind;
                }
                index += 1;
            } else {
                match self.lexer.next() {
                    Some(token) => {
                        let kind = token.kind.clone();
                        self.buffer.push(token);
                        index = self.buffer.len();
                        if !self.is_hidden(&kind) {
                            return kind;
                        }
                    }
                    None => return TokenKind::Eof,
                }
            }
        }
    }

    /// Number of `advance` calls so far; used as a progress marker.
    pub(crate) fn advances(&self) -> u64 {
        self.advances
    }

    fn fetch(&mut self) -> Token {
        if self.cursor < self.buffer.len() {
            let token = self.buffer[self.cursor].clone();
            self.cursor += 1;
            if self.cursor == self.buffer.len() {
                self.buffer.clear();
                self.cursor = 0;
            }
            token
        } else {
            let end = self.lexer.text().len();
            self.lexer.next().unwrap_or(Token {
                kind: TokenKind::Eof,
                span: end..end,
            })
        }
    }

    fn is_hidden(&self, kind: &TokenKind) -> bool {
        kind.is_always_hidden() || (*kind == TokenKind::NewLine && self.allow_newline > 0)
    }

    fn reclassify(&mut self, token: &Token) {
        if !self.keep_trivia {
            return;
        }
        let kind = match token.kind {
            TokenKind::Whitespace => TriviaKind::Whitespace,
            TokenKind::Comment => TriviaKind::Comment,
            TokenKind::CommentMulti => TriviaKind::CommentMulti,
            TokenKind::NewLine => TriviaKind::NewLine,
            _ => return,
        };
        let span = self.span_of(token);
        self.pending.push(Trivia::new(kind, span));
    }

    // --- spans ---

    pub(crate) fn span_of(&self, token: &Token) -> Span {
        Span::new(self.file_id, token.span.start as u32, token.span.end as u32)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.span_of(&self.current)
    }

    pub(crate) fn current_start(&self) -> u32 {
        self.current.span.start as u32
    }

    pub(crate) fn previous_end(&self) -> u32 {
        self.previous.span.end as u32
    }

    /// Source text covered by a span.
    pub(crate) fn slice(&self, start: u32, end: u32) -> &'s str {
        &self.lexer.text()[start as usize..end as usize]
    }

    pub(crate) fn text(&self) -> &'s str {
        self.lexer.text()
    }

    // --- pending trivia ---

    pub(crate) fn has_pending_trivia(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn take_pending_trivia(&mut self) -> Vec<Trivia> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn clear_pending_trivia(&mut self) {
        self.pending.clear();
    }

    /// Record a visible token (separator, `end` keyword) as trivia.
    pub(crate) fn push_trivia(&mut self, kind: TriviaKind, span: Span) {
        if self.keep_trivia {
            self.pending.push(Trivia::new(kind, span));
        }
    }

    // --- newline visibility ---

    pub(crate) fn push_allow_newline(&mut self) {
        self.allow_newline += 1;
    }

    pub(crate) fn pop_allow_newline(&mut self) {
        debug_assert!(self.allow_newline > 0, "allow-newline underflow");
        self.allow_newline = self.allow_newline.saturating_sub(1);
    }

    // --- lexer passthrough ---

    pub(crate) fn lexer_errors(&self) -> &[LogMessage] {
        self.lexer.errors()
    }
}
