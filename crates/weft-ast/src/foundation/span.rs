//! Source location tracking.
//!
//! Spans are kept deliberately small (10 bytes) because every AST node and
//! every trivia entry carries one. Line and column information is not cached
//! on the span; it is derived on demand through [`SourceFile::line_col`],
//! which only runs when a diagnostic is rendered.
//!
//! # Examples
//!
//! ```
//! # use weft_ast::foundation::span::*;
//! # use std::path::PathBuf;
//! let mut sources = SourceMap::new();
//! let file_id = sources.add_file(PathBuf::from("page.weft"), "Hello {{ name }}".to_string());
//! let span = Span::new(file_id, 6, 16);
//!
//! assert_eq!(sources.snippet(&span), "{{ name }}");
//! assert_eq!(sources.line_col(&span), (1, 7));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A byte range inside one source file.
///
/// `start` is inclusive, `end` exclusive. Both are byte offsets into the
/// file identified by `file_id` within a [`SourceMap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into [`SourceMap`] files.
    pub file_id: u16,
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
}

impl Span {
    /// Create a span from byte offsets.
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// Zero-length span at a given offset.
    pub fn point(file_id: u16, offset: u32) -> Self {
        Self::new(file_id, offset, offset)
    }

    /// True when the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// # Panics
    /// Panics when the spans belong to different files.
    pub fn union(&self, other: &Span) -> Span {
        assert_eq!(self.file_id, other.file_id, "span union across files");
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Grow this span in place so it also covers `other`.
    ///
    /// # Panics
    /// Panics when the spans belong to different files.
    pub fn cover(&mut self, other: &Span) {
        *self = self.union(other);
    }
}

/// All source files taking part in a parse session.
///
/// Converts spans back into paths, snippets and line/column pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single template source with a precomputed line index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the template was loaded from (or a synthetic name).
    pub path: PathBuf,
    /// Full source text.
    pub source: String,
    /// Byte offset of each line start; the last entry is an EOF sentinel.
    line_starts: Vec<u32>,
}

impl SourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id.
    ///
    /// # Panics
    /// Panics when more than `u16::MAX` files are registered.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let id = self.files.len();
        assert!(id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        id as u16
    }

    /// File a span points into.
    pub fn file(&self, span: &Span) -> &SourceFile {
        &self.files[span.file_id as usize]
    }

    /// Path of the file a span points into.
    pub fn file_path(&self, span: &Span) -> &Path {
        &self.file(span).path
    }

    /// Text covered by a span.
    pub fn snippet(&self, span: &Span) -> &str {
        let file = self.file(span);
        &file.source[span.start as usize..span.end as usize]
    }

    /// 1-based line and column of a span's start.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        self.file(span).line_col(span.start)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceFile {
    /// Create a file entry and index its line starts.
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = index_lines(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// 1-based line and column for a byte offset.
    ///
    /// # Panics
    /// Panics when `offset` lies beyond the end of the source.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        assert!(
            offset as usize <= self.source.len(),
            "offset {offset} past end of source ({} bytes)",
            self.source.len()
        );
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Text of a 1-based line, including its terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let idx = (line - 1) as usize;
        let start = self.line_starts[idx] as usize;
        let end = self.line_starts[idx + 1] as usize;
        Some(&self.source[start..end])
    }

    /// Number of lines in this file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

/// Compute line-start offsets, terminated by an EOF sentinel.
fn index_lines(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (idx, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push((idx + 1) as u32);
        }
    }
    if starts.last() != Some(&(source.len() as u32)) {
        starts.push(source.len() as u32);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(0, 4, 9);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(Span::point(0, 4).is_empty());
    }

    #[test]
    fn span_union_and_cover() {
        let a = Span::new(0, 4, 9);
        let b = Span::new(0, 7, 20);
        let u = a.union(&b);
        assert_eq!((u.start, u.end), (4, 20));

        let mut c = Span::new(0, 10, 12);
        c.cover(&a);
        assert_eq!((c.start, c.end), (4, 12));
    }

    #[test]
    #[should_panic(expected = "span union across files")]
    fn span_union_rejects_cross_file() {
        let _ = Span::new(0, 0, 1).union(&Span::new(1, 0, 1));
    }

    #[test]
    fn line_index() {
        assert_eq!(index_lines("a\nbb\nc"), vec![0, 2, 5, 6]);
        assert_eq!(index_lines("a\n"), vec![0, 2]);
        assert_eq!(index_lines(""), vec![0]);
    }

    #[test]
    fn file_line_col() {
        let file = SourceFile::new(PathBuf::from("t.weft"), "one\ntwo\n".to_string());
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(3), (1, 4));
        assert_eq!(file.line_col(4), (2, 1));
        assert_eq!(file.line_count(), 2);
        assert_eq!(file.line_text(2), Some("two\n"));
        assert_eq!(file.line_text(3), None);
    }

    #[test]
    fn source_map_lookup() {
        let mut sources = SourceMap::new();
        let id = sources.add_file(PathBuf::from("t.weft"), "Hello {{ name }}".to_string());
        let span = Span::new(id, 9, 13);
        assert_eq!(sources.snippet(&span), "name");
        assert_eq!(sources.line_col(&span), (1, 10));
        assert_eq!(sources.file_path(&span).to_str(), Some("t.weft"));
    }
}
