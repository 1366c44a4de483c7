//! Alignment between original and preprocessed lines.
//!
//! Preprocessors run between the moment the original document is indexed and
//! the moment blocks are parsed. They may rewrite, drop, split or inject
//! lines. The [`LineAligner`] compares the two line sequences and produces a
//! [`RestoreMap`]: an edit script that partitions both coordinate spaces and
//! can translate any contiguous range of mutated lines back to original
//! lines.
//!
//! The edit script reads as "how to turn the mutated lines back into the
//! original lines":
//!
//! | kind      | mutated lines | original lines |
//! |-----------|---------------|----------------|
//! | `Equal`   | same text     | same text      |
//! | `Replace` | rewritten     | source of the rewrite |
//! | `Delete`  | injected      | none           |
//! | `Insert`  | none          | dropped        |

use std::ops::Range;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

use crate::error::{OffsetError, Result};
use crate::index::OffsetIndex;

/// How mutated lines are aligned with the original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentStrategy {
    /// Line diff. Tolerates insertions, deletions and rewritten lines;
    /// rewritten lines produce approximate offsets.
    #[default]
    Diff,
    /// Forward scan binding each mutated line to the next original line with
    /// identical text. Only valid when preprocessing drops or injects lines
    /// but never rewrites them. Original lines skipped between two bindings
    /// are folded into the end of the preceding binding.
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One opcode of the edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOp {
    pub kind: EditKind,
    /// Lines of the original document
    pub original: Range<usize>,
    /// Lines of the mutated sequence
    pub mutated: Range<usize>,
}

impl EditOp {
    fn new(kind: EditKind, original: Range<usize>, mutated: Range<usize>) -> Self {
        EditOp {
            kind,
            original,
            mutated,
        }
    }

    /// Whether this op covers mutated line `line` and can anchor it.
    fn anchors(&self, line: usize) -> bool {
        matches!(self.kind, EditKind::Equal | EditKind::Replace) && self.mutated.contains(&line)
    }
}

/// Result of translating a mutated line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTranslation {
    /// Original lines, half-open and non-empty
    pub original: Range<usize>,
    /// Start came from an `Equal` op
    pub start_accurate: bool,
    /// End came from an `Equal` op
    pub end_accurate: bool,
    /// Original lines the start could plausibly refer to. A single line when
    /// the start is accurate; the whole source of the rewrite otherwise.
    pub start_window: Range<usize>,
}

/// Edit script between the original and the mutated line sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreMap {
    ops: Vec<EditOp>,
    /// Extend ends over original-only lines that follow them
    fold_continuations: bool,
    #[serde(skip)]
    original_blank: Vec<bool>,
    #[serde(skip)]
    mutated_blank: Vec<bool>,
}

impl RestoreMap {
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// True if the ops cover `0..original_len` and `0..mutated_len` in order,
    /// without gaps or overlaps, and each op's ranges fit its kind.
    pub fn is_partition(&self, original_len: usize, mutated_len: usize) -> bool {
        let mut orig = 0;
        let mut muta = 0;
        for op in &self.ops {
            if op.original.start != orig || op.mutated.start != muta {
                return false;
            }
            let shape_ok = match op.kind {
                EditKind::Equal => op.original.len() == op.mutated.len() && !op.original.is_empty(),
                EditKind::Replace => !op.original.is_empty() && !op.mutated.is_empty(),
                EditKind::Delete => op.original.is_empty() && !op.mutated.is_empty(),
                EditKind::Insert => !op.original.is_empty() && op.mutated.is_empty(),
            };
            if !shape_ok {
                return false;
            }
            orig = op.original.end;
            muta = op.mutated.end;
        }
        orig == original_len && muta == mutated_len
    }

    /// Translate mutated lines `mutated` to original lines.
    ///
    /// Injected (`Delete`) lines at either edge are clipped off first. A
    /// boundary inside an `Equal` op maps exactly; a boundary inside a
    /// `Replace` op maps to the edge of the op's original range and is
    /// flagged approximate.
    pub fn translate(&self, mutated: Range<usize>) -> Result<LineTranslation> {
        let no_mapping = || OffsetError::NoMapping {
            start: mutated.start,
            end: mutated.end,
        };

        let mut start = mutated.start;
        let mut end = mutated.end;
        while let Some(op) = self.deleted_at(start) {
            start = op.mutated.end;
        }
        while let Some(op) = self.deleted_before(end) {
            end = op.mutated.start;
        }
        if start >= end {
            return Err(no_mapping());
        }

        let start_op = self.ops.iter().find(|op| op.anchors(start)).ok_or_else(no_mapping)?;
        let (orig_start, start_accurate) = match start_op.kind {
            EditKind::Equal => (start_op.original.start + (start - start_op.mutated.start), true),
            _ => (start_op.original.start, false),
        };
        let start_window = if start_accurate {
            orig_start..orig_start + 1
        } else {
            start_op.original.clone()
        };

        let end_pos = self
            .ops
            .iter()
            .position(|op| op.anchors(end - 1))
            .ok_or_else(no_mapping)?;
        let end_op = &self.ops[end_pos];
        let (mut orig_end, end_accurate) = match end_op.kind {
            EditKind::Equal => (end_op.original.start + (end - end_op.mutated.start), true),
            _ => (self.approximate_end(end_op, orig_start, end), false),
        };

        if self.fold_continuations && end == end_op.mutated.end {
            orig_end = self.ops[end_pos + 1..]
                .iter()
                .take_while(|op| matches!(op.kind, EditKind::Insert | EditKind::Delete))
                .filter(|op| op.kind == EditKind::Insert)
                .map(|op| op.original.end)
                .fold(orig_end, usize::max);
        }

        if orig_end <= orig_start {
            return Err(no_mapping());
        }
        Ok(LineTranslation {
            original: orig_start..orig_end,
            start_accurate,
            end_accurate,
            start_window,
        })
    }

    /// Original end for a range that stops at mutated line `end` inside
    /// the rewrite `op`.
    ///
    /// Mutated lines of the same rewrite past `end` belong to later blocks.
    /// Each blank-line break among them gives up one break on the original
    /// side, so the range stops before the original lines those blocks were
    /// built from. Without enough breaks the range runs to the end of the op.
    fn approximate_end(&self, op: &EditOp, orig_start: usize, end: usize) -> usize {
        let later = block_breaks(&self.mutated_blank, end..op.mutated.end).len();
        if later == 0 {
            return op.original.end;
        }
        let breaks = block_breaks(&self.original_blank, orig_start..op.original.end);
        breaks
            .len()
            .checked_sub(later)
            .map(|i| breaks[i])
            .filter(|&line| line > orig_start)
            .unwrap_or(op.original.end)
    }

    /// `Delete` op containing mutated line `line`.
    fn deleted_at(&self, line: usize) -> Option<&EditOp> {
        self.ops
            .iter()
            .find(|op| op.kind == EditKind::Delete && op.mutated.contains(&line))
    }

    /// `Delete` op whose range ends the exclusive bound `end` sits in.
    fn deleted_before(&self, end: usize) -> Option<&EditOp> {
        self.ops.iter().find(|op| {
            op.kind == EditKind::Delete && op.mutated.start < end && end <= op.mutated.end
        })
    }
}

/// Comparison key: blank lines compare equal to each other regardless of
/// whitespace, and a trailing carriage return is ignored.
fn line_key(line: &str) -> &str {
    if line.trim().is_empty() {
        ""
    } else {
        line.strip_suffix('\r').unwrap_or(line)
    }
}

/// First line of every blank run in `range` that is followed by a non-blank
/// line still inside `range`.
fn block_breaks(blank: &[bool], range: Range<usize>) -> Vec<usize> {
    let offset = range.start;
    let mut breaks = Vec::new();
    let mut run: Option<usize> = None;
    for (i, is_blank) in blank.get(range).unwrap_or_default().iter().enumerate() {
        match (is_blank, run) {
            (true, None) => run = Some(offset + i),
            (false, Some(first)) => {
                breaks.push(first);
                run = None;
            }
            _ => {}
        }
    }
    breaks
}

/// Builds [`RestoreMap`]s with a fixed [`AlignmentStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAligner {
    strategy: AlignmentStrategy,
}

impl LineAligner {
    pub fn new(strategy: AlignmentStrategy) -> Self {
        LineAligner { strategy }
    }

    pub fn strategy(&self) -> AlignmentStrategy {
        self.strategy
    }

    /// Align `mutated` against the lines recorded in `original`.
    pub fn align(&self, original: &OffsetIndex, mutated: &[String]) -> RestoreMap {
        let orig_keys: Vec<&str> = original.records().iter().map(|r| line_key(&r.text)).collect();
        let mut_keys: Vec<&str> = mutated.iter().map(|l| line_key(l)).collect();

        let ops = match self.strategy {
            AlignmentStrategy::Diff => diff_ops(&orig_keys, &mut_keys),
            AlignmentStrategy::Sequential => sequential_ops(&orig_keys, &mut_keys),
        };
        let map = RestoreMap {
            ops,
            fold_continuations: self.strategy == AlignmentStrategy::Sequential,
            original_blank: orig_keys.iter().map(|k| k.is_empty()).collect(),
            mutated_blank: mut_keys.iter().map(|k| k.is_empty()).collect(),
        };
        debug_assert!(map.is_partition(orig_keys.len(), mut_keys.len()));

        tracing::debug!(
            strategy = ?self.strategy,
            original = orig_keys.len(),
            mutated = mut_keys.len(),
            ops = map.ops.len(),
            "Aligned preprocessed lines"
        );
        map
    }
}

/// Append `op`, merging it into the previous op when both have the same
/// kind. Adjacent ops are always contiguous, so merging is a range union.
fn push_op(ops: &mut Vec<EditOp>, op: EditOp) {
    if op.original.is_empty() && op.mutated.is_empty() {
        return;
    }
    if let Some(last) = ops.last_mut() {
        if last.kind == op.kind {
            last.original.end = op.original.end;
            last.mutated.end = op.mutated.end;
            return;
        }
    }
    ops.push(op);
}

fn diff_ops(original: &[&str], mutated: &[&str]) -> Vec<EditOp> {
    let raw: Vec<EditOp> = capture_diff_slices(Algorithm::Myers, mutated, original)
        .iter()
        .map(|op| {
            let (tag, mutated, original) = op.as_tag_tuple();
            let kind = match tag {
                DiffTag::Equal => EditKind::Equal,
                DiffTag::Replace => EditKind::Replace,
                DiffTag::Delete => EditKind::Delete,
                DiffTag::Insert => EditKind::Insert,
            };
            EditOp::new(kind, original, mutated)
        })
        .collect();
    demote_blank_anchors(raw, mutated)
}

/// Fold `Equal` runs made only of blank lines that sit between two
/// non-`Equal` ops into a single `Replace` with their neighbours.
fn demote_blank_anchors(raw: Vec<EditOp>, mutated: &[&str]) -> Vec<EditOp> {
    let mut out: Vec<EditOp> = Vec::with_capacity(raw.len());
    let mut iter = raw.into_iter().peekable();
    while let Some(op) = iter.next() {
        let blank_only = op.kind == EditKind::Equal && mutated[op.mutated.clone()].iter().all(|k| k.is_empty());
        let prev_unequal = out.last().is_some_and(|p| p.kind != EditKind::Equal);
        let next_unequal = iter.peek().is_some_and(|n| n.kind != EditKind::Equal);

        if blank_only && prev_unequal && next_unequal {
            if let (Some(prev), Some(next)) = (out.pop(), iter.next()) {
                out.push(EditOp::new(
                    EditKind::Replace,
                    prev.original.start..next.original.end,
                    prev.mutated.start..next.mutated.end,
                ));
                continue;
            }
        }
        match out.last_mut() {
            // A merged replace absorbs any unequal op that follows it
            Some(last) if last.kind == EditKind::Replace && op.kind != EditKind::Equal => {
                last.original.end = op.original.end;
                last.mutated.end = op.mutated.end;
            }
            _ => out.push(op),
        }
    }
    out
}

fn sequential_ops(original: &[&str], mutated: &[&str]) -> Vec<EditOp> {
    let mut ops = Vec::new();
    let mut cursor = 0;
    for (j, key) in mutated.iter().enumerate() {
        let bound = if key.is_empty() {
            // Blank lines bind only in place, never by searching ahead
            (original.get(cursor) == Some(&"")).then_some(cursor)
        } else {
            (cursor..original.len()).find(|&i| original[i] == *key)
        };
        match bound {
            Some(i) => {
                push_op(&mut ops, EditOp::new(EditKind::Insert, cursor..i, j..j));
                push_op(&mut ops, EditOp::new(EditKind::Equal, i..i + 1, j..j + 1));
                cursor = i + 1;
            }
            None => push_op(&mut ops, EditOp::new(EditKind::Delete, cursor..cursor, j..j + 1)),
        }
    }
    push_op(
        &mut ops,
        EditOp::new(EditKind::Insert, cursor..original.len(), mutated.len()..mutated.len()),
    );
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(String::from).collect()
    }

    fn align(strategy: AlignmentStrategy, original: &str, mutated: &str) -> RestoreMap {
        let index = OffsetIndex::build(&lines(original));
        LineAligner::new(strategy).align(&index, &lines(mutated))
    }

    fn kinds(map: &RestoreMap) -> Vec<EditKind> {
        map.ops().iter().map(|op| op.kind).collect()
    }

    #[test]
    fn test_identity_is_single_equal() {
        let map = align(AlignmentStrategy::Diff, "a\n\nb", "a\n\nb");
        assert_eq!(map.ops(), &[EditOp::new(EditKind::Equal, 0..3, 0..3)]);

        let t = map.translate(2..3).unwrap();
        assert_eq!(t.original, 2..3);
        assert!(t.start_accurate && t.end_accurate);
    }

    #[test]
    fn test_injected_lines_are_clipped() {
        // Line 1 of the mutated sequence was injected
        let map = align(AlignmentStrategy::Diff, "a\nb", "a\nX\nb");
        assert!(map.is_partition(2, 3));
        assert_eq!(kinds(&map), vec![EditKind::Equal, EditKind::Delete, EditKind::Equal]);

        assert_eq!(map.translate(1..3).unwrap().original, 1..2);
        assert_eq!(map.translate(0..2).unwrap().original, 0..1);
        assert_eq!(
            map.translate(1..2),
            Err(OffsetError::NoMapping { start: 1, end: 2 })
        );
    }

    #[test]
    fn test_rewritten_lines_are_approximate() {
        let map = align(
            AlignmentStrategy::Diff,
            "intro\n```\ncode\n```\noutro",
            "intro\nPLACEHOLDER\noutro",
        );
        assert_eq!(kinds(&map), vec![EditKind::Equal, EditKind::Replace, EditKind::Equal]);

        let t = map.translate(1..2).unwrap();
        assert_eq!(t.original, 1..4);
        assert!(!t.start_accurate && !t.end_accurate);
        assert_eq!(t.start_window, 1..4);
    }

    #[test]
    fn test_rewrite_shared_by_two_blocks_is_split_at_blank_line() {
        // Two fences collapse to placeholders; the blank line between them
        // is folded into a single replace
        let map = align(
            AlignmentStrategy::Diff,
            "```\na\n```\n\n```\nb\n```",
            "P1\n\nP2",
        );
        assert_eq!(map.ops(), &[EditOp::new(EditKind::Replace, 0..7, 0..3)]);

        let first = map.translate(0..1).unwrap();
        assert_eq!(first.original, 0..3);
        assert!(!first.end_accurate);
        assert_eq!(map.translate(2..3).unwrap().original, 0..7);
    }

    #[test]
    fn test_rewrite_without_matching_breaks_runs_to_op_end() {
        let map = align(AlignmentStrategy::Diff, "one\ntwo\nthree", "ONE\n\nTWO");
        assert_eq!(map.translate(0..1).unwrap().original, 0..3);
    }

    #[test]
    fn test_block_breaks() {
        let blank = [false, true, true, false, true, false, true];
        assert_eq!(block_breaks(&blank, 0..7), vec![1, 4]);
        assert_eq!(block_breaks(&blank, 2..4), vec![2]);
        assert!(block_breaks(&blank, 0..1).is_empty());
    }

    #[test]
    fn test_dropped_lines_are_not_folded_by_diff() {
        let map = align(AlignmentStrategy::Diff, "a\nmeta\nb", "a\nb");
        assert_eq!(kinds(&map), vec![EditKind::Equal, EditKind::Insert, EditKind::Equal]);
        assert_eq!(map.translate(0..1).unwrap().original, 0..1);
        assert_eq!(map.translate(1..2).unwrap().original, 2..3);
    }

    #[test]
    fn test_sequential_folds_continuations() {
        let map = align(AlignmentStrategy::Sequential, "a\ncomment\n\nb", "a\n\nb");
        assert!(map.is_partition(4, 3));
        assert_eq!(
            kinds(&map),
            vec![EditKind::Equal, EditKind::Delete, EditKind::Insert, EditKind::Equal]
        );
        // "a" owns the dropped comment and the blank line after it
        assert_eq!(map.translate(0..1).unwrap().original, 0..3);
        assert_eq!(map.translate(2..3).unwrap().original, 3..4);
    }

    #[test]
    fn test_sequential_skips_unbound_lines() {
        let map = align(AlignmentStrategy::Sequential, "a\nb", "a\nnew\nb");
        assert_eq!(kinds(&map), vec![EditKind::Equal, EditKind::Delete, EditKind::Equal]);
        assert!(map.is_partition(2, 3));
    }

    #[test]
    fn test_lone_blank_never_anchors() {
        let map = align(AlignmentStrategy::Diff, "x1\n\nx2", "y1\n\ny2");
        assert_eq!(map.ops(), &[EditOp::new(EditKind::Replace, 0..3, 0..3)]);
    }

    #[test]
    fn test_carriage_returns_are_ignored() {
        let map = align(AlignmentStrategy::Diff, "a\r\nb\r", "a\nb");
        assert_eq!(map.ops(), &[EditOp::new(EditKind::Equal, 0..2, 0..2)]);
    }

    #[test]
    fn test_ops_serialize_with_lowercase_kinds() {
        let map = align(AlignmentStrategy::Diff, "a\nb", "a");
        let json = serde_json::to_value(map.ops()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"kind": "equal", "original": {"start": 0, "end": 1}, "mutated": {"start": 0, "end": 1}},
                {"kind": "insert", "original": {"start": 1, "end": 2}, "mutated": {"start": 1, "end": 1}}
            ])
        );
    }

    #[test]
    fn test_empty_range_has_no_mapping() {
        let map = align(AlignmentStrategy::Diff, "a", "a");
        assert!(map.translate(0..0).is_err());
    }
}
