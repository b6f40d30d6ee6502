//! Statement dispatcher and default-dialect statement parsers.
//!
//! `try_parse_statement` classifies the current token and routes it based on
//! the code/raw mode, the dialect and the keyword. Statement parsers own
//! their keyword, parse any header expressions, require an end-of-statement
//! token and then parse their body through [`Parser::parse_block`].
//!
//! Condition chains (`else`, `else if`, chained `when`) are folded inside
//! the owning statement parser: the dispatcher parses the continuation,
//! parks it in `Parser::chained`, and the body loop hands it back through
//! `Parser::take_chained` once the body terminates.

use super::expr;
use super::liquid;
use super::stack::BlockKind;
use super::{BlockExit, Parser, StatementStart};
use std::rc::Rc;
use weft_ast::{
    CaptureStatement, CaseStatement, ElseStatement, ExpressionStatement, Expr, ExprKind,
    ForStatement, FuncStatement, IfStatement, ImportStatement, RawStatement, ReadOnlyStatement,
    RetStatement, Span, Statement, StatementKind, Trivia, TriviaKind, WhenStatement,
    WhileStatement, WithStatement, WrapStatement,
};
use weft_lexer::{Dialect, ScriptMode, TokenKind};

/// Short human-readable description of a token for diagnostics.
pub(crate) fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Raw | TokenKind::Escape => "raw text".to_string(),
        TokenKind::EscapeEnter(_) => "`{%{`".to_string(),
        TokenKind::EscapeExit(_) => "`}%}`".to_string(),
        TokenKind::CodeEnter => "`{{`".to_string(),
        TokenKind::CodeExit => "`}}`".to_string(),
        TokenKind::LiquidTagEnter => "`{%`".to_string(),
        TokenKind::LiquidTagExit => "`%}`".to_string(),
        TokenKind::FrontMatterMarker => "front matter marker".to_string(),
        TokenKind::Ident(name) => format!("`{name}`"),
        TokenKind::IdentSpecial(name) => format!("`${name}`"),
        TokenKind::Integer(value) => format!("`{value}`"),
        TokenKind::Float(value) => format!("`{value}`"),
        TokenKind::String(_) => "a string literal".to_string(),
        TokenKind::NewLine => "end of line".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Invalid => "an invalid token".to_string(),
        TokenKind::SemiColon => "`;`".to_string(),
        TokenKind::Colon => "`:`".to_string(),
        TokenKind::Comma => "`,`".to_string(),
        TokenKind::Dot => "`.`".to_string(),
        TokenKind::DotDot => "`..`".to_string(),
        TokenKind::Pipe => "`|`".to_string(),
        TokenKind::PipePipe => "`||`".to_string(),
        TokenKind::AmpAmp => "`&&`".to_string(),
        TokenKind::Plus => "`+`".to_string(),
        TokenKind::Minus => "`-`".to_string(),
        TokenKind::Star => "`*`".to_string(),
        TokenKind::Slash => "`/`".to_string(),
        TokenKind::SlashSlash => "`//`".to_string(),
        TokenKind::Percent => "`%`".to_string(),
        TokenKind::Eq => "`=`".to_string(),
        TokenKind::EqEq => "`==`".to_string(),
        TokenKind::BangEq => "`!=`".to_string(),
        TokenKind::Bang => "`!`".to_string(),
        TokenKind::Lt => "`<`".to_string(),
        TokenKind::LtEq => "`<=`".to_string(),
        TokenKind::Gt => "`>`".to_string(),
        TokenKind::GtEq => "`>=`".to_string(),
        TokenKind::QuestionQuestion => "`??`".to_string(),
        TokenKind::LParen => "`(`".to_string(),
        TokenKind::RParen => "`)`".to_string(),
        TokenKind::LBracket => "`[`".to_string(),
        TokenKind::RBracket => "`]`".to_string(),
        TokenKind::Whitespace => "whitespace".to_string(),
        TokenKind::Comment | TokenKind::CommentMulti => "a comment".to_string(),
    }
}

impl<'s> Parser<'s> {
    /// Classify the current token and parse at most one statement.
    ///
    /// Returns `None` for tokens that produce no statement (separators, mode
    /// switches, chained continuations, errors). Termination is signalled
    /// through `self.exit`.
    pub(crate) fn try_parse_statement(&mut self) -> Option<Statement> {
        if let Some(statement) = self.pending_statements.pop_front() {
            return Some(statement);
        }

        let kind = self.stream.current().kind.clone();
        match kind {
            TokenKind::Eof => {
                self.exit = Some(BlockExit::Eof);
                None
            }
            TokenKind::Raw => self.parse_raw_statement(),
            TokenKind::Escape | TokenKind::EscapeEnter(_) => self.parse_escape_statement(),
            TokenKind::CodeEnter => self.handle_code_enter(false),
            TokenKind::LiquidTagEnter if self.dialect == Dialect::Liquid => {
                self.handle_code_enter(true)
            }
            TokenKind::FrontMatterMarker => self.handle_front_matter_marker(),
            TokenKind::CodeExit => self.handle_code_exit(),
            TokenKind::LiquidTagExit if self.dialect == Dialect::Liquid => {
                self.handle_code_exit()
            }
            _ if self.in_code_section => self.parse_code_token(kind),
            _ => {
                let span = self.stream.current_span();
                let found = token_text(&kind);
                self.log_error(
                    span,
                    format!("unexpected token {found} outside of a code section"),
                );
                self.stream.advance();
                None
            }
        }
    }

    // --- raw mode ---

    fn parse_raw_statement(&mut self) -> Option<Statement> {
        if self.blocks.last() == BlockKind::Case {
            // Raw text between case branches carries no meaning.
            self.pending_front_matter_nudge = false;
            self.stream.advance();
            return None;
        }
        let mut open = self.open_statement();
        let token_end = self.stream.current().span.end as u32;
        if self.pending_front_matter_nudge {
            self.pending_front_matter_nudge = false;
            open.start = self.skip_front_matter_newline(open.start, token_end);
        }
        self.stream.advance();
        let text: Rc<str> = Rc::from(self.stream.slice(open.start, token_end));
        Some(self.close_statement(
            open,
            StatementKind::Raw(RawStatement {
                text,
                escape_count: 0,
            }),
        ))
    }

    /// Advance past spaces/tabs and at most one line terminator following
    /// the closing front-matter marker.
    fn skip_front_matter_newline(&self, start: u32, end: u32) -> u32 {
        let bytes = self.stream.text().as_bytes();
        let end = end as usize;
        let mut i = start as usize;
        while i < end && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i + 1 < end && bytes[i] == b'\r' && bytes[i + 1] == b'\n' {
            i += 2;
        } else if i < end && (bytes[i] == b'\n' || bytes[i] == b'\r') {
            i += 1;
        }
        i as u32
    }

    fn parse_escape_statement(&mut self) -> Option<Statement> {
        let in_case = self.blocks.last() == BlockKind::Case;
        let open = self.open_statement();
        let mut escape_count = 0u8;
        if let TokenKind::EscapeEnter(count) = self.stream.current().kind {
            escape_count = count;
            self.stream.advance();
        }
        let mut text: Rc<str> = Rc::from("");
        if self.stream.current().kind == TokenKind::Escape {
            let span = self.stream.current_span();
            text = Rc::from(self.stream.slice(span.start, span.end));
            self.stream.advance();
        }
        if let TokenKind::EscapeExit(_) = self.stream.current().kind {
            self.stream.advance();
        }
        if in_case {
            return None;
        }
        Some(self.close_statement(
            open,
            StatementKind::Raw(RawStatement { text, escape_count }),
        ))
    }

    // --- mode switches ---

    fn handle_code_enter(&mut self, liquid_tag: bool) -> Option<Statement> {
        if self.in_code_section {
            let span = self.stream.current_span();
            self.log_error(span, "cannot open a code section inside another code section");
            self.stream.advance();
            return None;
        }
        self.pending_front_matter_nudge = false;
        self.in_code_section = true;
        self.liquid_tag_section = liquid_tag;

        // A `}}{{` adjacency (or pending orphan trivia) gets an empty raw
        // placeholder so round-tripping stays lossless.
        let after_exit = matches!(
            self.stream.previous().kind,
            TokenKind::CodeExit | TokenKind::LiquidTagExit
        );
        let synthesized = if self.keep_trivia
            && self.blocks.last() != BlockKind::Case
            && (self.stream.has_pending_trivia() || after_exit)
        {
            let at = self.stream.current_start();
            let mut raw = Statement::new(
                StatementKind::Raw(RawStatement {
                    text: Rc::from(""),
                    escape_count: 0,
                }),
                Span::point(self.file_id, at),
            );
            let pending = self.stream.take_pending_trivia();
            raw.trivia.after = if pending.is_empty() {
                vec![Trivia::empty(self.file_id, at)]
            } else {
                pending
            };
            Some(raw)
        } else {
            None
        };

        self.stream.advance();

        let nop = if matches!(
            self.stream.current().kind,
            TokenKind::CodeExit | TokenKind::LiquidTagExit
        ) {
            let span = self.stream.span_of(self.stream.previous());
            let mut nop = Statement::new(StatementKind::Nop, span);
            if self.keep_trivia {
                nop.trivia.before = self.stream.take_pending_trivia();
            }
            Some(nop)
        } else {
            None
        };

        match (synthesized, nop) {
            (Some(raw), Some(nop)) => {
                self.pending_statements.push_back(nop);
                Some(raw)
            }
            (Some(raw), None) => Some(raw),
            (None, nop) => nop,
        }
    }

    fn handle_code_exit(&mut self) -> Option<Statement> {
        if self.mode == ScriptMode::ScriptOnly {
            let span = self.stream.current_span();
            self.log_error(span, "a code section exit is not allowed in script-only mode");
            self.stream.advance();
            return None;
        }
        if !self.in_code_section {
            let span = self.stream.current_span();
            self.log_error(
                span,
                "unexpected code section exit with no matching code section enter",
            );
            self.stream.advance();
            return None;
        }
        // Orphan trivia between the exit and the next content is dropped;
        // the adjacency case is resynthesized at the next code enter.
        self.stream.clear_pending_trivia();
        self.in_code_section = false;
        self.liquid_tag_section = false;
        self.stream.advance();
        None
    }

    fn handle_front_matter_marker(&mut self) -> Option<Statement> {
        if !self.in_front_matter {
            let span = self.stream.current_span();
            self.log_error(span, "unexpected front matter marker");
            self.stream.advance();
            return None;
        }
        self.in_front_matter = false;
        self.in_code_section = false;
        match self.mode {
            ScriptMode::FrontMatterAndContent => {
                self.mode = ScriptMode::Default;
                self.stream.advance();
                self.pending_front_matter_nudge = true;
            }
            ScriptMode::FrontMatterOnly => {
                // Stay on the marker; nothing after it is parsed.
            }
            _ => {
                self.stream.advance();
            }
        }
        self.exit = Some(BlockExit::FrontMatter);
        None
    }

    // --- code mode ---

    fn parse_code_token(&mut self, kind: TokenKind) -> Option<Statement> {
        match kind {
            TokenKind::NewLine => {
                let span = self.stream.current_span();
                self.stream.push_trivia(TriviaKind::NewLine, span);
                self.stream.advance();
                None
            }
            TokenKind::SemiColon => {
                let span = self.stream.current_span();
                self.stream.push_trivia(TriviaKind::SemiColon, span);
                self.stream.advance();
                None
            }
            TokenKind::Ident(name) if self.dialect == Dialect::Liquid => {
                if self.liquid_tag_section {
                    liquid::parse_tag_keyword(self, name)
                } else {
                    liquid::parse_object_section(self)
                }
            }
            TokenKind::Ident(name) => self.parse_default_keyword(name),
            _ if expr::is_start_of_expression(&kind) => {
                if self.dialect == Dialect::Liquid && !self.liquid_tag_section {
                    liquid::parse_object_section(self)
                } else {
                    self.parse_expression_statement()
                }
            }
            _ => {
                let span = self.stream.current_span();
                let found = token_text(&kind);
                self.log_error(span, format!("unexpected token {found}"));
                self.exit = Some(BlockExit::Stop);
                None
            }
        }
    }

    // --- default-dialect keyword routing ---

    fn parse_default_keyword(&mut self, name: Rc<str>) -> Option<Statement> {
        // `for.index` / `while.index` are member accesses on the loop
        // builtins, not statements.
        let promoted = matches!(&*name, "for" | "while") && self.stream.peek() == TokenKind::Dot;
        match &*name {
            "end" => {
                self.handle_end();
                None
            }
            "when" => self.handle_when(),
            "else" => self.handle_else(),
            "if" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_if_statement(open, false, false, "if")
            }
            "for" if !promoted => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_for_statement(open)
            }
            "while" if !promoted => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_while_statement(open)
            }
            "case" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_case_statement(open)
            }
            "capture" | "with" | "wrap" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_target_block_statement(open, name)
            }
            "func" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_func_statement(open)
            }
            "import" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_import_statement(open)
            }
            "readonly" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_readonly_statement(open)
            }
            "ret" => {
                self.check_case_body();
                let open = self.open_statement();
                self.parse_ret_statement(open)
            }
            "break" => {
                let open = self.open_statement();
                self.parse_simple_statement(open, StatementKind::Break)
            }
            "continue" => {
                let open = self.open_statement();
                self.parse_simple_statement(open, StatementKind::Continue)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Statements other than `end`/`when`/`else`/`break`/`continue` are user
    /// errors inside a `case` body.
    pub(crate) fn check_case_body(&mut self) {
        if self.blocks.last() == BlockKind::Case {
            let span = self.stream.current_span();
            self.log_error(
                span,
                "unexpected statement inside a `case` body; only `when` and `else` branches are allowed",
            );
        }
    }

    // --- end resolution ---

    pub(crate) fn handle_end(&mut self) {
        let span = self.stream.current_span();
        self.stream.advance();
        if self.blocks.find_first_expecting_end().is_some() {
            self.record_end_trivia(span);
            self.exit = Some(BlockExit::End);
        } else {
            self.log_error(span, "unable to find a matching statement for this `end`");
        }
    }

    /// Flush pending trivia plus the `end` keyword itself to the terminator
    /// buffer; the owning statement attaches it at close.
    pub(crate) fn record_end_trivia(&mut self, span: Span) {
        if self.keep_trivia {
            let mut trivia = self.stream.take_pending_trivia();
            trivia.push(Trivia::new(TriviaKind::End, span));
            self.end_trivia = trivia;
        }
    }

    // --- chained conditions ---

    pub(crate) fn handle_when(&mut self) -> Option<Statement> {
        let parent = self.blocks.last();
        let kw_span = self.stream.current_span();
        let open = self.open_statement();
        self.stream.advance();
        match parent {
            BlockKind::Case => self.parse_when_statement(open),
            BlockKind::When => {
                let statement = self.parse_when_statement(open)?;
                self.chained = Some(statement);
                None
            }
            _ => {
                self.log_error(kw_span, "a `when` is only valid inside a `case` body");
                self.parse_when_statement(open)
            }
        }
    }

    fn parse_when_statement(&mut self, open: StatementStart) -> Option<Statement> {
        let mut values = Vec::new();
        loop {
            if !expr::is_start_of_expression(&self.stream.current().kind) {
                break;
            }
            match expr::parse_value(self) {
                Some(value) => values.push(value),
                None => break,
            }
            let separator = self.stream.current().kind.clone();
            match separator {
                TokenKind::Comma | TokenKind::PipePipe => self.stream.advance(),
                TokenKind::Ident(ref s) if &**s == "or" => self.stream.advance(),
                _ => break,
            }
        }
        if values.is_empty() {
            let span = self.stream.current_span();
            self.log_error(span, "expecting at least one value after `when`");
        }
        self.expect_end_of_statement();
        let body = self.parse_block(BlockKind::When);
        let next = self.take_chained();
        Some(self.close_statement(
            open,
            StatementKind::When(WhenStatement {
                values,
                body,
                next: next.map(Box::new),
            }),
        ))
    }

    pub(crate) fn handle_else(&mut self) -> Option<Statement> {
        let parent = self.blocks.last();
        let kw_span = self.stream.current_span();
        let open = self.open_statement();
        self.stream.advance();
        let valid = matches!(parent, BlockKind::If { .. } | BlockKind::When);
        if !valid {
            self.log_error(kw_span, "`else` without a matching `if` or `when`");
        }
        let statement =
            if matches!(self.stream.current().kind, TokenKind::Ident(ref s) if &**s == "if") {
                self.parse_if_statement(open, true, false, "if")?
            } else {
                self.expect_end_of_statement();
                let body = self.parse_block(BlockKind::Else);
                self.close_statement(open, StatementKind::Else(ElseStatement { body }))
            };
        if valid {
            self.chained = Some(statement);
            None
        } else {
            Some(statement)
        }
    }

    // --- statement parsers ---

    pub(crate) fn parse_if_statement(
        &mut self,
        open: StatementStart,
        is_else_if: bool,
        invert_condition: bool,
        keyword: &str,
    ) -> Option<Statement> {
        self.stream.advance(); // if / unless / elsif
        let condition = expr::parse(self)?;
        self.expect_end_of_statement();
        let then_body = self.parse_block(BlockKind::If { else_if: is_else_if });
        let else_branch = self.take_chained();
        let end_trivia = if is_else_if {
            Vec::new()
        } else {
            self.expect_block_end(keyword)
        };
        let mut statement = self.close_statement(
            open,
            StatementKind::If(IfStatement {
                condition,
                is_else_if,
                invert_condition,
                then_body,
                else_branch: else_branch.map(Box::new),
            }),
        );
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    pub(crate) fn parse_for_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // for
        let variable = self.parse_variable("after `for`")?;
        if matches!(self.stream.current().kind, TokenKind::Ident(ref s) if &**s == "in") {
            self.stream.advance();
        } else {
            let span = self.stream.current_span();
            self.log_error(span, "expecting `in` after the `for` variable");
        }
        let iterator = expr::parse(self)?;
        self.expect_end_of_statement();
        let body = self.parse_block(BlockKind::For);
        let end_trivia = self.expect_block_end("for");
        let mut statement = self.close_statement(
            open,
            StatementKind::For(ForStatement {
                variable,
                iterator,
                body,
            }),
        );
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    fn parse_while_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // while
        let condition = expr::parse(self)?;
        self.expect_end_of_statement();
        let body = self.parse_block(BlockKind::While);
        let end_trivia = self.expect_block_end("while");
        let mut statement = self.close_statement(
            open,
            StatementKind::While(WhileStatement { condition, body }),
        );
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    pub(crate) fn parse_case_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // case
        let value = expr::parse(self)?;
        self.expect_end_of_statement();
        let body = self.parse_block(BlockKind::Case);
        let end_trivia = self.expect_block_end("case");
        let mut statement =
            self.close_statement(open, StatementKind::Case(CaseStatement { value, body }));
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    pub(crate) fn parse_target_block_statement(
        &mut self,
        open: StatementStart,
        keyword: Rc<str>,
    ) -> Option<Statement> {
        self.stream.advance(); // capture / with / wrap
        let target = expr::parse(self)?;
        self.expect_end_of_statement();
        let block_kind = match &*keyword {
            "capture" => BlockKind::Capture,
            "with" => BlockKind::With,
            _ => BlockKind::Wrap,
        };
        let body = self.parse_block(block_kind);
        let end_trivia = self.expect_block_end(&keyword);
        let kind = match &*keyword {
            "capture" => StatementKind::Capture(CaptureStatement { target, body }),
            "with" => StatementKind::With(WithStatement { name: target, body }),
            _ => StatementKind::Wrap(WrapStatement { target, body }),
        };
        let mut statement = self.close_statement(open, kind);
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    fn parse_func_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // func
        let name = if let TokenKind::Ident(name) = self.stream.current().kind.clone() {
            self.stream.advance();
            Some(name)
        } else {
            None
        };
        self.expect_end_of_statement();
        let body = self.parse_block(BlockKind::Func);
        let end_trivia = self.expect_block_end("func");
        let mut statement =
            self.close_statement(open, StatementKind::Func(FuncStatement { name, body }));
        statement.trivia.after.extend(end_trivia);
        Some(statement)
    }

    fn parse_import_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // import
        let expr = expr::parse(self)?;
        self.expect_end_of_statement();
        Some(self.close_statement(open, StatementKind::Import(ImportStatement { expr })))
    }

    fn parse_readonly_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // readonly
        let variable = self.parse_variable("after `readonly`")?;
        self.expect_end_of_statement();
        Some(self.close_statement(
            open,
            StatementKind::ReadOnly(ReadOnlyStatement { variable }),
        ))
    }

    fn parse_ret_statement(&mut self, open: StatementStart) -> Option<Statement> {
        self.stream.advance(); // ret
        let expr = if expr::is_start_of_expression(&self.stream.current().kind) {
            Some(expr::parse(self)?)
        } else {
            None
        };
        self.expect_end_of_statement();
        Some(self.close_statement(open, StatementKind::Ret(RetStatement { expr })))
    }

    pub(crate) fn parse_simple_statement(
        &mut self,
        open: StatementStart,
        kind: StatementKind,
    ) -> Option<Statement> {
        self.stream.advance(); // break / continue
        self.expect_end_of_statement();
        Some(self.close_statement(open, kind))
    }

    pub(crate) fn parse_expression_statement(&mut self) -> Option<Statement> {
        self.check_case_body();
        let open = self.open_statement();
        let expr = expr::parse_statement_expression(self)?;
        self.expect_end_of_statement();
        Some(self.close_statement(
            open,
            StatementKind::Expression(ExpressionStatement { expr }),
        ))
    }

    /// Parse a bare variable (used for loop variables and `readonly`).
    pub(crate) fn parse_variable(&mut self, context: &str) -> Option<Expr> {
        let span = self.stream.current_span();
        let kind = self.stream.current().kind.clone();
        let before = if self.keep_trivia {
            self.stream.take_pending_trivia()
        } else {
            Vec::new()
        };
        let mut variable = match kind {
            TokenKind::Ident(name) => {
                self.stream.advance();
                Expr::new(
                    ExprKind::Variable {
                        name,
                        special: false,
                    },
                    span,
                )
            }
            TokenKind::IdentSpecial(name) => {
                self.stream.advance();
                Expr::new(
                    ExprKind::Variable {
                        name,
                        special: true,
                    },
                    span,
                )
            }
            _ => {
                self.log_error(span, format!("expecting a variable {context}"));
                return None;
            }
        };
        variable.trivia.before = before;
        Some(variable)
    }
}
