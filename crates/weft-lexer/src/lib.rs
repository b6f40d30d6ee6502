// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for weft templates.
//!
//! A template interleaves literal ("raw") text with code sections. The
//! delimiters that flip between the two modes are position-dependent and the
//! front-matter marker is configurable at runtime, so the outer scanning
//! loop is hand-written; everything *inside* a code section is tokenized by
//! a logos-generated recognizer.
//!
//! # Design
//!
//! - `TokenKind` — the unified, closed token set the parser consumes
//! - `CodeToken` — internal logos enum for code-section tokens
//! - `Lexer` — the state machine driving raw/code/escape/front-matter modes
//! - Whitespace, comments and newlines are emitted as tokens (not skipped);
//!   the parser reclassifies them into trivia
//!
//! # Examples
//!
//! ```
//! # use weft_lexer::*;
//! let lexer = Lexer::new("Hello {{ name }}", LexerOptions::default());
//! let kinds: Vec<TokenKind> = lexer.map(|t| t.kind).collect();
//! assert!(matches!(kinds[0], TokenKind::Raw));
//! assert!(matches!(kinds[1], TokenKind::CodeEnter));
//! ```

use logos::Logos;
use std::ops::Range;
use std::path::PathBuf;
use std::rc::Rc;
use weft_ast::{LogMessage, Span};

/// Top-level parsing mode of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptMode {
    /// Raw text with embedded code sections.
    #[default]
    Default,
    /// The whole input is code; no raw text expected.
    ScriptOnly,
    /// Only the front-matter block is lexed; content after the closing
    /// marker is ignored.
    FrontMatterOnly,
    /// Front-matter block first, then normal template content.
    FrontMatterAndContent,
}

/// Surface dialect of the template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// The default expression/statement language.
    #[default]
    Default,
    /// Liquid: `{% tag %}` sections and `{{ object }}` sections.
    Liquid,
}

/// Lexer configuration.
#[derive(Debug, Clone)]
pub struct LexerOptions {
    pub mode: ScriptMode,
    pub dialect: Dialect,
    /// Emitted hidden tokens are retained by the parser as trivia.
    pub keep_trivia: bool,
    /// Front-matter delimiter line, e.g. `+++`.
    pub front_matter_marker: String,
    /// Path reported in diagnostics.
    pub source_path: PathBuf,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            mode: ScriptMode::Default,
            dialect: Dialect::Default,
            keep_trivia: false,
            front_matter_marker: "+++".to_string(),
            source_path: PathBuf::from("<template>"),
        }
    }
}

/// A lexed token: kind plus byte range into the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// The unified token set.
///
/// Raw-mode kinds come from the hand-written scanner; code-mode kinds come
/// from the logos recognizer. `Whitespace`, `Comment` and `CommentMulti` are
/// always hidden to the parser; `NewLine` is hidden only while the parser
/// has raised its allow-newline level.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal template text.
    Raw,
    /// Verbatim text inside an escape block.
    Escape,
    /// `{%{` with 1..=9 percent signs; payload is the count.
    EscapeEnter(u8),
    /// `}%}` closing an escape block; payload is the count.
    EscapeExit(u8),
    /// `{{`
    CodeEnter,
    /// `}}`
    CodeExit,
    /// `{%` (Liquid only)
    LiquidTagEnter,
    /// `%}` (Liquid only)
    LiquidTagExit,
    /// Configurable front-matter delimiter line.
    FrontMatterMarker,
    Ident(Rc<str>),
    /// `$`-prefixed identifier; payload excludes the `$`.
    IdentSpecial(Rc<str>),
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    NewLine,
    SemiColon,
    Colon,
    Comma,
    Dot,
    DotDot,
    Pipe,
    PipePipe,
    AmpAmp,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    Eq,
    EqEq,
    BangEq,
    Bang,
    Lt,
    LtEq,
    Gt,
    GtEq,
    QuestionQuestion,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Whitespace,
    Comment,
    CommentMulti,
    /// Character sequence the code recognizer rejected.
    Invalid,
    Eof,
}

impl TokenKind {
    /// Tokens that never reach the statement dispatcher.
    pub fn is_always_hidden(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::CommentMulti
        )
    }
}

/// Code-section tokens, recognized by logos.
///
/// Nothing is skipped: whitespace, newlines and comments surface as tokens
/// so the parser can retain them as trivia.
#[derive(Logos, Debug, Clone, PartialEq)]
enum CodeToken {
    #[token("}}")]
    CodeExit,
    #[token("%}")]
    LiquidTagExit,
    #[token("{{")]
    CodeEnter,
    #[token("{%")]
    LiquidTagEnter,

    #[regex(r"[ \t]+")]
    Whitespace,
    #[regex(r"\r\n|\n|\r")]
    NewLine,
    #[regex(r"##([^#]|#[^#])*##", priority = 10)]
    CommentMulti,
    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice(), '"'))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice(), '\''))]
    String(Rc<str>),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
    #[regex(r"\$(\$|[0-9]+|[A-Za-z_][A-Za-z0-9_]*)?", |lex| Rc::from(&lex.slice()[1..]))]
    IdentSpecial(Rc<str>),

    #[token(";")]
    SemiColon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("||")]
    PipePipe,
    #[token("|")]
    Pipe,
    #[token("&&")]
    AmpAmp,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("//")]
    SlashSlash,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    BangEq,
    #[token("!")]
    Bang,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("??")]
    QuestionQuestion,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

/// Strip quotes and process escape sequences of a string literal.
fn unescape(slice: &str, quote: char) -> Option<Rc<str>> {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(c) if c == quote => out.push(c),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            _ => return None,
        }
    }
    Some(Rc::from(out.as_str()))
}

impl CodeToken {
    fn into_kind(self) -> TokenKind {
        match self {
            CodeToken::CodeExit => TokenKind::CodeExit,
            CodeToken::LiquidTagExit => TokenKind::LiquidTagExit,
            CodeToken::CodeEnter => TokenKind::CodeEnter,
            CodeToken::LiquidTagEnter => TokenKind::LiquidTagEnter,
            CodeToken::Whitespace => TokenKind::Whitespace,
            CodeToken::NewLine => TokenKind::NewLine,
            CodeToken::CommentMulti => TokenKind::CommentMulti,
            CodeToken::Comment => TokenKind::Comment,
            CodeToken::Float(v) => TokenKind::Float(v),
            CodeToken::Integer(v) => TokenKind::Integer(v),
            CodeToken::String(v) => TokenKind::String(v),
            CodeToken::Ident(v) => TokenKind::Ident(v),
            CodeToken::IdentSpecial(v) => TokenKind::IdentSpecial(v),
            CodeToken::SemiColon => TokenKind::SemiColon,
            CodeToken::Colon => TokenKind::Colon,
            CodeToken::Comma => TokenKind::Comma,
            CodeToken::DotDot => TokenKind::DotDot,
            CodeToken::Dot => TokenKind::Dot,
            CodeToken::PipePipe => TokenKind::PipePipe,
            CodeToken::Pipe => TokenKind::Pipe,
            CodeToken::AmpAmp => TokenKind::AmpAmp,
            CodeToken::Plus => TokenKind::Plus,
            CodeToken::Minus => TokenKind::Minus,
            CodeToken::Star => TokenKind::Star,
            CodeToken::SlashSlash => TokenKind::SlashSlash,
            CodeToken::Slash => TokenKind::Slash,
            CodeToken::Percent => TokenKind::Percent,
            CodeToken::EqEq => TokenKind::EqEq,
            CodeToken::Eq => TokenKind::Eq,
            CodeToken::BangEq => TokenKind::BangEq,
            CodeToken::Bang => TokenKind::Bang,
            CodeToken::LtEq => TokenKind::LtEq,
            CodeToken::Lt => TokenKind::Lt,
            CodeToken::GtEq => TokenKind::GtEq,
            CodeToken::Gt => TokenKind::Gt,
            CodeToken::QuestionQuestion => TokenKind::QuestionQuestion,
            CodeToken::LParen => TokenKind::LParen,
            CodeToken::RParen => TokenKind::RParen,
            CodeToken::LBracket => TokenKind::LBracket,
            CodeToken::RBracket => TokenKind::RBracket,
        }
    }
}

/// Lexer state: which scanning mode the next token comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Raw,
    Code,
    Escape { count: u8 },
    Done,
}

/// Delimiter found while scanning raw text.
enum RawDelimiter {
    CodeEnter,
    CodeExit,
    LiquidTagEnter,
    LiquidTagExit,
    EscapeEnter(u8),
}

impl RawDelimiter {
    fn len(&self) -> usize {
        match self {
            RawDelimiter::CodeEnter
            | RawDelimiter::CodeExit
            | RawDelimiter::LiquidTagEnter
            | RawDelimiter::LiquidTagExit => 2,
            RawDelimiter::EscapeEnter(n) => *n as usize + 2,
        }
    }
}

/// The template lexer: a forward-only iterator of [`Token`] terminating in
/// [`TokenKind::Eof`].
pub struct Lexer<'s> {
    text: &'s str,
    options: LexerOptions,
    file_id: u16,
    pos: usize,
    state: State,
    in_front_matter: bool,
    at_line_start: bool,
    started: bool,
    finished: bool,
    errors: Vec<LogMessage>,
}

impl<'s> Lexer<'s> {
    /// Create a lexer over `text` with file id 0.
    pub fn new(text: &'s str, options: LexerOptions) -> Self {
        Self::with_file_id(text, options, 0)
    }

    /// Create a lexer that stamps spans with the given file id.
    pub fn with_file_id(text: &'s str, options: LexerOptions, file_id: u16) -> Self {
        let state = match options.mode {
            ScriptMode::ScriptOnly => State::Code,
            _ => State::Raw,
        };
        Self {
            text,
            options,
            file_id,
            pos: 0,
            state,
            in_front_matter: false,
            at_line_start: true,
            started: false,
            finished: false,
            errors: Vec::new(),
        }
    }

    /// Backing source text.
    pub fn text(&self) -> &'s str {
        self.text
    }

    /// Lexer configuration.
    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    /// Path reported in diagnostics.
    pub fn source_path(&self) -> &std::path::Path {
        &self.options.source_path
    }

    /// File id stamped on spans and errors.
    pub fn file_id(&self) -> u16 {
        self.file_id
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[LogMessage] {
        &self.errors
    }

    /// True when any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn error(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.errors.push(LogMessage::error(
            Span::new(self.file_id, range.start as u32, range.end as u32),
            text,
        ));
    }

    fn marker(&self) -> &str {
        &self.options.front_matter_marker
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Some(tok) = self.open_front_matter() {
                return Some(tok);
            }
        }
        loop {
            if self.state == State::Done || self.pos >= self.text.len() {
                self.finished = true;
                let end = self.text.len();
                return Some(Token::new(TokenKind::Eof, end..end));
            }
            match self.state {
                State::Raw => return Some(self.raw_token()),
                State::Code => {
                    if let Some(tok) = self.code_token() {
                        return Some(tok);
                    }
                    // sub-lexer exhausted; loop re-checks for EOF
                }
                State::Escape { count } => return Some(self.escape_token(count)),
                State::Done => unreachable!("handled above"),
            }
        }
    }

    /// In a front-matter mode, the input must open with the marker.
    fn open_front_matter(&mut self) -> Option<Token> {
        if !matches!(
            self.options.mode,
            ScriptMode::FrontMatterOnly | ScriptMode::FrontMatterAndContent
        ) {
            return None;
        }
        if self.text.starts_with(self.marker()) {
            let len = self.marker().len();
            self.pos = len;
            self.state = State::Code;
            self.in_front_matter = true;
            self.at_line_start = false;
            Some(Token::new(TokenKind::FrontMatterMarker, 0..len))
        } else {
            // The parser reports the missing marker; lex as plain content.
            None
        }
    }

    /// Scan literal text until the next mode delimiter.
    fn raw_token(&mut self) -> Token {
        let start = self.pos;
        if let Some(delim) = self.delimiter_at(self.pos) {
            let len = delim.len();
            let span = self.pos..self.pos + len;
            self.pos += len;
            let kind = match delim {
                RawDelimiter::CodeEnter => {
                    self.state = State::Code;
                    TokenKind::CodeEnter
                }
                RawDelimiter::LiquidTagEnter => {
                    self.state = State::Code;
                    TokenKind::LiquidTagEnter
                }
                // Stray exits stay in raw mode; the parser reports them.
                RawDelimiter::CodeExit => TokenKind::CodeExit,
                RawDelimiter::LiquidTagExit => TokenKind::LiquidTagExit,
                RawDelimiter::EscapeEnter(n) => {
                    self.state = State::Escape { count: n };
                    TokenKind::EscapeEnter(n)
                }
            };
            return Token::new(kind, span);
        }

        let mut i = self.pos + 1;
        while i < self.text.len() {
            if self.delimiter_at(i).is_some() {
                break;
            }
            i += 1;
        }
        self.pos = i;
        Token::new(TokenKind::Raw, start..i)
    }

    /// Identify a raw-mode delimiter starting at `i`, if any.
    fn delimiter_at(&self, i: usize) -> Option<RawDelimiter> {
        let bytes = self.text.as_bytes();
        let rest = &bytes[i..];
        match rest.first()? {
            b'{' => match rest.get(1)? {
                b'{' => Some(RawDelimiter::CodeEnter),
                b'%' => match self.options.dialect {
                    Dialect::Liquid => Some(RawDelimiter::LiquidTagEnter),
                    Dialect::Default => {
                        // {%{ .. {%%%%%%%%%{ open an escape block
                        let mut count = 0usize;
                        while count < 9 && rest.get(1 + count) == Some(&b'%') {
                            count += 1;
                        }
                        if count > 0 && rest.get(1 + count) == Some(&b'{') {
                            Some(RawDelimiter::EscapeEnter(count as u8))
                        } else {
                            None
                        }
                    }
                },
                _ => None,
            },
            b'}' if rest.get(1) == Some(&b'}') => Some(RawDelimiter::CodeExit),
            b'%' if rest.get(1) == Some(&b'}') => {
                matches!(self.options.dialect, Dialect::Liquid).then_some(RawDelimiter::LiquidTagExit)
            }
            _ => None,
        }
    }

    /// Lex one code-section token; `None` when the input is exhausted.
    fn code_token(&mut self) -> Option<Token> {
        if self.in_front_matter
            && self.at_line_start
            && self.text[self.pos..].starts_with(self.marker())
        {
            let len = self.marker().len();
            let span = self.pos..self.pos + len;
            self.pos += len;
            self.in_front_matter = false;
            self.at_line_start = false;
            self.state = match self.options.mode {
                ScriptMode::FrontMatterOnly => State::Done,
                _ => State::Raw,
            };
            return Some(Token::new(TokenKind::FrontMatterMarker, span));
        }

        let mut sub = CodeToken::lexer(&self.text[self.pos..]);
        let result = sub.next()?;
        let rel = sub.span();
        let span = self.pos + rel.start..self.pos + rel.end;
        self.pos = span.end;

        let kind = match result {
            Ok(tok) => tok.into_kind(),
            Err(()) => {
                let slice = &self.text[span.clone()];
                if slice.starts_with('"') || slice.starts_with('\'') {
                    self.error(span.clone(), "unterminated string literal");
                } else {
                    self.error(span.clone(), format!("unexpected character `{slice}`"));
                }
                TokenKind::Invalid
            }
        };
        self.at_line_start = kind == TokenKind::NewLine;

        match kind {
            TokenKind::CodeExit | TokenKind::LiquidTagExit
                if self.options.mode != ScriptMode::ScriptOnly && !self.in_front_matter =>
            {
                self.state = State::Raw;
            }
            _ => {}
        }
        Some(Token::new(kind, span))
    }

    /// Scan escape-block content or its closing marker.
    fn escape_token(&mut self, count: u8) -> Token {
        let close_len = count as usize + 2;
        let mut i = self.pos;
        let found = loop {
            if i >= self.text.len() {
                break None;
            }
            if self.escape_exit_at(i, count) {
                break Some(i);
            }
            i += 1;
        };
        match found {
            Some(at) if at == self.pos => {
                let span = at..at + close_len;
                self.pos = span.end;
                self.state = State::Raw;
                Token::new(TokenKind::EscapeExit(count), span)
            }
            Some(at) => {
                let span = self.pos..at;
                self.pos = at;
                Token::new(TokenKind::Escape, span)
            }
            None => {
                let span = self.pos..self.text.len();
                self.error(span.clone(), "unterminated escape block");
                self.pos = self.text.len();
                self.state = State::Raw;
                Token::new(TokenKind::Escape, span)
            }
        }
    }

    /// True when `}%..%}` with `count` percent signs starts at `i`.
    fn escape_exit_at(&self, i: usize, count: u8) -> bool {
        let bytes = self.text.as_bytes();
        let count = count as usize;
        if bytes.get(i) != Some(&b'}') {
            return false;
        }
        for k in 0..count {
            if bytes.get(i + 1 + k) != Some(&b'%') {
                return false;
            }
        }
        bytes.get(i + 1 + count) == Some(&b'}')
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
