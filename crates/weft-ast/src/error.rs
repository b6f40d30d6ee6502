//! Parse diagnostics.
//!
//! The parser never aborts on the first problem; it accumulates
//! [`LogMessage`] values and keeps going. A message is either a warning or an
//! error; a separate *fatal* notion lives inside the parser (fatal errors
//! stop statement production but are reported through the same type).
//!
//! [`DiagnosticRenderer`] turns messages into human-readable output with a
//! source snippet and caret underline.

use crate::foundation::{SourceMap, Span};
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suspicious but valid input.
    Warning,
    /// Invalid input; the parse result will be discarded.
    Error,
}

/// A single diagnostic with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Warning or error.
    pub severity: Severity,
    /// Where the problem was detected.
    pub span: Span,
    /// Human-readable description.
    pub text: String,
}

impl LogMessage {
    /// Create an error message.
    pub fn error(span: Span, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            text: text.into(),
        }
    }

    /// Create a warning message.
    pub fn warning(span: Span, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            text: text.into(),
        }
    }

    /// True for `Severity::Error`.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}..{})",
            self.severity, self.text, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for LogMessage {}

/// Renders diagnostics with source context.
///
/// Output format:
///
/// ```text
/// error: expecting end of statement
///   --> page.weft:2:14
///    |
///  2 | {{ if x 42 }}
///    |         ^^
/// ```
pub struct DiagnosticRenderer<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticRenderer<'a> {
    /// Create a renderer over a source map.
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    /// Render a single message.
    pub fn render(&self, message: &LogMessage) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}: {}\n", message.severity, message.text));

        let path = self.sources.file_path(&message.span);
        let (line, col) = self.sources.line_col(&message.span);
        out.push_str(&format!("  --> {}:{}:{}\n", path.display(), line, col));

        let file = self.sources.file(&message.span);
        if let Some(text) = file.line_text(line) {
            let text = text.trim_end_matches(['\r', '\n']);
            out.push_str("   |\n");
            out.push_str(&format!("{line:3}| {text}\n"));
            let width = (message.span.len() as usize).clamp(1, text.len() + 1);
            out.push_str(&format!(
                "   | {}{}\n",
                " ".repeat((col as usize).saturating_sub(1)),
                "^".repeat(width)
            ));
        }
        out
    }

    /// Render all messages, separated by blank lines.
    pub fn render_all(&self, messages: &[LogMessage]) -> String {
        messages
            .iter()
            .map(|m| self.render(m))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sources() -> SourceMap {
        let mut map = SourceMap::new();
        map.add_file(PathBuf::from("t.weft"), "Hello {{ nmae }}\n".to_string());
        map
    }

    #[test]
    fn message_constructors() {
        let span = Span::new(0, 9, 13);
        let err = LogMessage::error(span, "bad name");
        assert!(err.is_error());
        let warn = LogMessage::warning(span, "odd name");
        assert!(!warn.is_error());
        assert!(warn.to_string().contains("warning"));
    }

    #[test]
    fn renderer_points_at_span() {
        let sources = sources();
        let msg = LogMessage::error(Span::new(0, 9, 13), "unknown variable");
        let rendered = DiagnosticRenderer::new(&sources).render(&msg);
        assert!(rendered.contains("error: unknown variable"));
        assert!(rendered.contains("t.weft:1:10"));
        assert!(rendered.contains("Hello {{ nmae }}"));
        assert!(rendered.contains("^^^^"));
    }

    #[test]
    fn renderer_joins_messages() {
        let sources = sources();
        let msgs = vec![
            LogMessage::error(Span::new(0, 0, 5), "first"),
            LogMessage::error(Span::new(0, 6, 8), "second"),
        ];
        let rendered = DiagnosticRenderer::new(&sources).render_all(&msgs);
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
    }
}
