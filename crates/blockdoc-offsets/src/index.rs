//! Line offsets of the original document.

use std::ops::Range;

use serde::Serialize;

use crate::error::OffsetError;

/// One line of the original document and its byte range.
///
/// `end - start` is the byte length of `text`; the terminating `\n` is not
/// included in the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl LineRecord {
    /// Blank lines carry a real byte range but never anchor an alignment.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Byte ranges of every line of the original, unmodified document.
///
/// Built once, before any preprocessor has seen the document, and never
/// modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OffsetIndex {
    records: Vec<LineRecord>,
    /// The lines joined back together, for slicing source text
    #[serde(skip)]
    document: String,
}

impl OffsetIndex {
    /// Index `lines`, which must be the original document split on `\n`.
    ///
    /// # Example
    ///
    /// ```
    /// use blockdoc_offsets::OffsetIndex;
    ///
    /// let lines: Vec<String> = "# Title\n\nBody".split('\n').map(String::from).collect();
    /// let index = OffsetIndex::build(&lines);
    /// assert_eq!(index.get(2).map(|r| (r.start, r.end)), Some((9, 13)));
    /// ```
    pub fn build(lines: &[String]) -> Self {
        let mut cursor = 0;
        let records = lines
            .iter()
            .map(|line| {
                let record = LineRecord {
                    text: line.clone(),
                    start: cursor,
                    end: cursor + line.len(),
                };
                cursor += line.len() + 1;
                record
            })
            .collect();
        OffsetIndex {
            records,
            document: lines.join("\n"),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, line: usize) -> Option<&LineRecord> {
        self.records.get(line)
    }

    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    /// Length in bytes of the document the index was built from.
    pub fn document_len(&self) -> usize {
        self.records.last().map_or(0, |last| last.end)
    }

    /// Byte range covered by original lines `lines` (half-open, non-empty).
    pub fn byte_range(&self, lines: Range<usize>) -> Result<Range<usize>, OffsetError> {
        if lines.is_empty() {
            return Err(OffsetError::NoMapping {
                start: lines.start,
                end: lines.end,
            });
        }
        let out_of_range = |line| OffsetError::LineOutOfRange {
            line,
            len: self.records.len(),
        };
        let first = self.get(lines.start).ok_or_else(|| out_of_range(lines.start))?;
        let last = self.get(lines.end - 1).ok_or_else(|| out_of_range(lines.end - 1))?;
        Ok(first.start..last.end)
    }

    /// Line containing byte `offset`, by binary search.
    ///
    /// An offset that falls on a line terminator belongs to the line it
    /// terminates.
    pub fn line_at(&self, offset: usize) -> Option<usize> {
        if offset > self.document_len() {
            return None;
        }
        match self.records.binary_search_by(|r| r.start.cmp(&offset)) {
            Ok(idx) => Some(idx),
            Err(0) => None,
            Err(idx) => Some(idx - 1),
        }
    }

    /// The original document.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Original text of `range` (a byte range).
    pub fn text(&self, range: Range<usize>) -> Option<&str> {
        self.document.get(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> OffsetIndex {
        let lines: Vec<String> = text.split('\n').map(String::from).collect();
        OffsetIndex::build(&lines)
    }

    #[test]
    fn test_records_are_contiguous() {
        let idx = index("# Title\n\nBody text.");
        let spans: Vec<(usize, usize)> = idx.records().iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 7), (8, 8), (9, 19)]);
        assert_eq!(idx.document_len(), 19);
        assert!(idx.get(1).unwrap().is_blank());
    }

    #[test]
    fn test_empty_document() {
        let idx = index("");
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.document_len(), 0);
    }

    #[test]
    fn test_crlf_keeps_carriage_return_width() {
        let idx = index("ab\r\ncd");
        assert_eq!((idx.get(0).unwrap().start, idx.get(0).unwrap().end), (0, 3));
        assert_eq!((idx.get(1).unwrap().start, idx.get(1).unwrap().end), (4, 6));
    }

    #[test]
    fn test_multibyte_lines_use_byte_offsets() {
        // "café" is 5 bytes
        let idx = index("café\nx");
        assert_eq!(idx.get(1).unwrap().start, 6);
    }

    #[test]
    fn test_byte_range() {
        let idx = index("a\nbb\nccc");
        assert_eq!(idx.byte_range(1..3), Ok(2..8));
        assert_eq!(
            idx.byte_range(2..2),
            Err(OffsetError::NoMapping { start: 2, end: 2 })
        );
        assert_eq!(
            idx.byte_range(2..5),
            Err(OffsetError::LineOutOfRange { line: 4, len: 3 })
        );
    }

    #[test]
    fn test_line_at() {
        let idx = index("a\nbb\nccc");
        assert_eq!(idx.line_at(0), Some(0));
        assert_eq!(idx.line_at(1), Some(0));
        assert_eq!(idx.line_at(2), Some(1));
        assert_eq!(idx.line_at(8), Some(2));
        assert_eq!(idx.line_at(9), None);
    }

    #[test]
    fn test_text() {
        let idx = index("a\nbb\nccc");
        assert_eq!(idx.text(2..8), Some("bb\nccc"));
        assert_eq!(idx.text(5..20), None);
        assert_eq!(idx.document(), "a\nbb\nccc");
    }
}
