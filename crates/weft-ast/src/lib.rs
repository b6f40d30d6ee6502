// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for the weft template engine.
//!
//! This crate contains everything the parser produces and the evaluator
//! consumes: source spans, trivia, diagnostics, and the statement and
//! expression node families.
//!
//! # Design
//!
//! - `foundation` — compact `Span` plus `SourceFile`/`SourceMap` lookup
//! - `trivia` — hidden-token spans attached to nodes for round-tripping
//! - `error` — `LogMessage` diagnostics with a snippet renderer
//! - `ast` — `ScriptPage`, `Block`, `Statement`, `Expr` node families

pub mod ast;
pub mod error;
pub mod foundation;
pub mod trivia;

pub use ast::*;
pub use error::{DiagnosticRenderer, LogMessage, Severity};
pub use foundation::{SourceFile, SourceMap, Span};
pub use trivia::{Trivia, TriviaKind, TriviaSet};
