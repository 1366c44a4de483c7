//! Per-document offsets state.
//!
//! A [`DocumentOffsets`] is installed in the session's extension map by the
//! `capture_document` preprocessor and lives exactly as long as the render.

use std::collections::HashMap;
use std::ops::Range;

use blockdoc_core::NodeId;
use serde::Serialize;

use crate::align::{LineAligner, RestoreMap};
use crate::annotation::Annotation;
use crate::error::{OffsetError, Result};
use crate::guard::RecursionGuard;
use crate::index::{LineRecord, OffsetIndex};

/// Contiguous range of mutated lines a raw block was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpan {
    pub mutated_start: usize,
    pub mutated_end: usize,
}

impl BlockSpan {
    pub fn range(&self) -> Range<usize> {
        self.mutated_start..self.mutated_end
    }
}

/// Alignment state captured while preprocessing.
#[derive(Debug, Clone)]
struct Alignment {
    mutated: Vec<String>,
    restore: RestoreMap,
}

#[derive(Debug, Clone)]
pub struct DocumentOffsets {
    index: OffsetIndex,
    alignment: Option<Alignment>,
    /// One flag per original line, set once an emitted node owns it
    used: Vec<bool>,
    pub(crate) guard: RecursionGuard,
    /// Last mutated line claimed by a block
    last_processed: Option<usize>,
    pub(crate) last_emitted_parent: Option<NodeId>,
}

impl DocumentOffsets {
    /// Index the untouched original lines.
    pub fn new(original: &[String]) -> Self {
        let index = OffsetIndex::build(original);
        let used = vec![false; index.len()];
        DocumentOffsets {
            index,
            alignment: None,
            used,
            guard: RecursionGuard::default(),
            last_processed: None,
            last_emitted_parent: None,
        }
    }

    /// Record the lines the block parser will see and align them.
    pub fn align(&mut self, aligner: &LineAligner, mutated: &[String]) {
        let restore = aligner.align(&self.index, mutated);
        self.alignment = Some(Alignment {
            mutated: mutated.to_vec(),
            restore,
        });
    }

    pub fn index(&self) -> &OffsetIndex {
        &self.index
    }

    pub fn restore_map(&self) -> Option<&RestoreMap> {
        self.alignment.as_ref().map(|a| &a.restore)
    }

    pub fn mutated_lines(&self) -> &[String] {
        self.alignment
            .as_ref()
            .map(|a| a.mutated.as_slice())
            .unwrap_or_default()
    }

    pub fn is_used(&self, line: usize) -> bool {
        self.used.get(line).copied().unwrap_or(false)
    }

    fn unclaimed(&self) -> impl Iterator<Item = (usize, &str)> {
        let from = self.last_processed.map_or(0, |line| line + 1);
        self.mutated_lines()
            .iter()
            .enumerate()
            .skip(from)
            .map(|(i, line)| (i, line.as_str()))
            .filter(|(_, line)| !line.trim().is_empty())
    }

    /// Whether `block` contains a non-blank mutated line not yet claimed.
    pub fn wants(&self, block: &str) -> bool {
        if self.guard.is_prerendering() {
            return false;
        }
        let lines: Vec<&str> = block.split('\n').collect();
        self.unclaimed().any(|(_, line)| lines.contains(&line))
    }

    /// Claim the maximal run of unclaimed mutated lines that `block` was
    /// built from.
    ///
    /// Blank lines neither start nor break a run. Each block line can match
    /// only once, so a duplicate of the block's text further down the
    /// document is left for the block that really contains it.
    pub fn claim(&mut self, block: &str) -> Option<BlockSpan> {
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        for line in block.split('\n') {
            *remaining.entry(line).or_default() += 1;
        }

        let mut run: Option<(usize, usize)> = None;
        for (i, line) in self.unclaimed() {
            match remaining.get_mut(line) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    run = Some((run.map_or(i, |(first, _)| first), i));
                }
                _ if run.is_some() => break,
                _ => {}
            }
        }

        let (first, last) = run?;
        self.last_processed = Some(last);
        Some(BlockSpan {
            mutated_start: first,
            mutated_end: last + 1,
        })
    }

    /// Translate `span` into a byte range of the original document and mark
    /// the original lines it covers as used.
    ///
    /// An approximate start moves to the first non-blank line no earlier
    /// block owns, staying inside the rewritten region and before the end.
    /// When there is no such line the span has no mapping of its own.
    pub fn annotate(&mut self, span: BlockSpan) -> Result<Annotation> {
        let no_mapping = OffsetError::NoMapping {
            start: span.mutated_start,
            end: span.mutated_end,
        };
        let restore = self
            .alignment
            .as_ref()
            .map(|a| &a.restore)
            .ok_or_else(|| no_mapping.clone())?;
        let translation = restore.translate(span.range())?;

        let mut lines = translation.original.clone();
        if !translation.start_accurate {
            let limit = translation.start_window.end.min(lines.end);
            let free = |line: &usize| {
                !self.is_used(*line) && !self.index.get(*line).is_some_and(LineRecord::is_blank)
            };
            lines.start = (lines.start..limit).find(free).ok_or(no_mapping)?;
        }

        let bytes = self.index.byte_range(lines.clone())?;
        for flag in &mut self.used[lines] {
            *flag = true;
        }
        Ok(Annotation {
            start: bytes.start,
            end: bytes.end,
            start_accurate: translation.start_accurate,
            end_accurate: translation.end_accurate,
        })
    }

    /// Original text under `annotation`.
    pub fn source_text(&self, annotation: &Annotation) -> &str {
        self.index
            .text(annotation.start..annotation.end)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignmentStrategy;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(String::from).collect()
    }

    fn context(original: &str, mutated: &str) -> DocumentOffsets {
        let mut ctx = DocumentOffsets::new(&lines(original));
        ctx.align(&LineAligner::new(AlignmentStrategy::Diff), &lines(mutated));
        ctx
    }

    #[test]
    fn test_claim_skips_blank_lines_and_advances() {
        let mut ctx = context("a\nb\n\nc", "a\nb\n\nc");
        assert!(ctx.wants("a\nb"));

        let span = ctx.claim("a\nb").unwrap();
        assert_eq!(span.range(), 0..2);
        assert!(!ctx.wants("a\nb"));

        assert_eq!(ctx.claim("c").unwrap().range(), 3..4);
        assert!(ctx.claim("c").is_none());
    }

    #[test]
    fn test_claim_stops_at_foreign_line() {
        let mut ctx = context("a\nb\nc", "a\nb\nc");
        assert_eq!(ctx.claim("a\nc").unwrap().range(), 0..1);
    }

    #[test]
    fn test_claim_respects_line_multiplicity() {
        let mut ctx = context("x\nx\n\nx", "x\nx\n\nx");
        assert_eq!(ctx.claim("x\nx").unwrap().range(), 0..2);
        assert_eq!(ctx.claim("x").unwrap().range(), 3..4);
    }

    #[test]
    fn test_guard_blocks_wants() {
        let mut ctx = context("a", "a");
        ctx.guard.enter();
        assert!(!ctx.wants("a"));
        ctx.guard.exit();
        assert!(ctx.wants("a"));
    }

    #[test]
    fn test_annotate_marks_lines_used() {
        let mut ctx = context("# T\n\nbody", "# T\n\nbody");
        let span = ctx.claim("body").unwrap();
        let annotation = ctx.annotate(span).unwrap();

        assert_eq!((annotation.start, annotation.end), (5, 9));
        assert!(ctx.is_used(2));
        assert!(!ctx.is_used(0));
        assert_eq!(ctx.source_text(&annotation), "body");
    }

    #[test]
    fn test_approximate_start_skips_used_lines() {
        // Both mutated lines fall inside one rewritten region
        let mut ctx = context("one\ntwo\nthree", "ONE\nTWO");
        let first = ctx.annotate(BlockSpan { mutated_start: 0, mutated_end: 1 }).unwrap();
        assert_eq!((first.start, first.end), (0, 13));
        assert!(!first.start_accurate);

        // Every line is used now, so nothing is left for the second block
        assert_eq!(
            ctx.annotate(BlockSpan { mutated_start: 1, mutated_end: 2 }),
            Err(OffsetError::NoMapping { start: 1, end: 2 })
        );
    }

    #[test]
    fn test_blocks_sharing_a_rewrite_get_disjoint_lines() {
        let mut ctx = context("a1\na2\n\nb1\nb2", "A\n\nB");
        let first = ctx.annotate(BlockSpan { mutated_start: 0, mutated_end: 1 }).unwrap();
        let second = ctx.annotate(BlockSpan { mutated_start: 2, mutated_end: 3 }).unwrap();

        assert_eq!((first.start, first.end), (0, 5));
        assert_eq!((second.start, second.end), (7, 12));
        assert_eq!(ctx.source_text(&second), "b1\nb2");
        assert!(!ctx.is_used(2));
    }

    #[test]
    fn test_annotate_without_alignment() {
        let mut ctx = DocumentOffsets::new(&lines("a"));
        assert_eq!(
            ctx.annotate(BlockSpan { mutated_start: 0, mutated_end: 1 }),
            Err(OffsetError::NoMapping { start: 0, end: 1 })
        );
    }
}
