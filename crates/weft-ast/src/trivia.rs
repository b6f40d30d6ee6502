//! Trivia: hidden tokens attached to AST nodes.
//!
//! Whitespace, comments and statement separators carry no evaluation meaning
//! but are preserved so a template can be reproduced losslessly. Trivia are
//! stored as spans only; the text lives in the source file and is looked up
//! through the span when needed.
//!
//! Statements and expressions carry a [`TriviaSet`]; block containers never
//! do (their trivia migrate to the first and last child).

use crate::foundation::Span;
use serde::{Deserialize, Serialize};

/// What kind of hidden token a trivia entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// Single-line `#` comment.
    Comment,
    /// Multi-line `## ... ##` comment.
    CommentMulti,
    /// Line terminator used as a statement separator.
    NewLine,
    /// `;` statement separator.
    SemiColon,
    /// The `end` keyword (or Liquid `end<tag>`) closing a block.
    End,
    /// Placeholder with no source text, used to anchor `{% %}{% %}`
    /// adjacency.
    Empty,
}

/// One hidden token, identified by kind and source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub span: Span,
}

impl Trivia {
    /// Create a trivia entry.
    pub fn new(kind: TriviaKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Placeholder entry with an empty span.
    pub fn empty(file_id: u16, offset: u32) -> Self {
        Self::new(TriviaKind::Empty, Span::point(file_id, offset))
    }
}

/// Trivia attached to a node: entries before its first token and after its
/// last token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriviaSet {
    pub before: Vec<Trivia>,
    pub after: Vec<Trivia>,
}

impl TriviaSet {
    /// True when no trivia is attached on either side.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_placeholder() {
        let t = Trivia::empty(0, 12);
        assert_eq!(t.kind, TriviaKind::Empty);
        assert!(t.span.is_empty());
        assert_eq!(t.span.start, 12);
    }

    #[test]
    fn set_emptiness() {
        let mut set = TriviaSet::default();
        assert!(set.is_empty());
        set.after.push(Trivia::new(TriviaKind::SemiColon, Span::new(0, 3, 4)));
        assert!(!set.is_empty());
    }
}
