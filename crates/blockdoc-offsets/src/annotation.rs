/*
 * annotation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Offset attributes on emitted elements.
 */

//! Offset attributes on emitted elements.
//!
//! An [`Annotation`] is written onto elements as string attributes so it
//! survives serialization:
//!
//! | attribute                          | value                     |
//! |------------------------------------|---------------------------|
//! | `{prefix}original-document-start`  | byte offset               |
//! | `{prefix}original-document-end`    | byte offset (exclusive)   |
//! | `{prefix}original-document`        | source text (debug only)  |
//! | `{prefix}offset-accurate-start`    | `true`/`false` (debug only) |
//! | `{prefix}offset-accurate-end`      | `true`/`false` (debug only) |

use std::ops::Range;

use blockdoc_core::{ElementTree, NodeId};
use serde::Serialize;

/// Byte range in the original document attached to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    /// Start came from an exact line alignment
    pub start_accurate: bool,
    /// End came from an exact line alignment
    pub end_accurate: bool,
}

/// Attribute names for a given prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    pub start: String,
    pub end: String,
    pub text: String,
    pub start_accurate: String,
    pub end_accurate: String,
}

impl AttributeNames {
    pub fn new(prefix: &str) -> Self {
        AttributeNames {
            start: format!("{prefix}original-document-start"),
            end: format!("{prefix}original-document-end"),
            text: format!("{prefix}original-document"),
            start_accurate: format!("{prefix}offset-accurate-start"),
            end_accurate: format!("{prefix}offset-accurate-end"),
        }
    }
}

/// Writes annotations onto elements.
///
/// With a `document` (debug mode) the original text of each element's full
/// range and the accuracy flags are recorded as well.
pub struct Stamper<'a> {
    pub names: &'a AttributeNames,
    pub document: Option<&'a str>,
}

impl Stamper<'_> {
    /// Overwrite both ends of `node`'s range.
    pub fn stamp(&self, tree: &mut ElementTree, node: NodeId, annotation: &Annotation) {
        tree.set_attribute(node, &self.names.start, annotation.start.to_string());
        tree.set_attribute(node, &self.names.end, annotation.end.to_string());
        if self.document.is_some() {
            self.record_text(tree, node, annotation.start..annotation.end);
            tree.set_attribute(node, &self.names.start_accurate, annotation.start_accurate.to_string());
            tree.set_attribute(node, &self.names.end_accurate, annotation.end_accurate.to_string());
        }
    }

    /// Extend `node`'s range to `annotation.end`, leaving its start alone.
    pub fn extend(&self, tree: &mut ElementTree, node: NodeId, annotation: &Annotation) {
        tree.set_attribute(node, &self.names.end, annotation.end.to_string());
        if self.document.is_some() {
            let start = tree
                .attribute(node, &self.names.start)
                .and_then(|v| v.parse().ok())
                .unwrap_or(annotation.start);
            self.record_text(tree, node, start..annotation.end);
            tree.set_attribute(node, &self.names.end_accurate, annotation.end_accurate.to_string());
        }
    }

    /// Extend `node` and give it a start if it has none. Returns `false`
    /// when the start had to be filled in.
    pub fn patch(&self, tree: &mut ElementTree, node: NodeId, annotation: &Annotation) -> bool {
        let had_start = tree.attribute(node, &self.names.start).is_some();
        if !had_start {
            tree.set_attribute(node, &self.names.start, annotation.start.to_string());
        }
        self.extend(tree, node, annotation);
        had_start
    }

    fn record_text(&self, tree: &mut ElementTree, node: NodeId, range: Range<usize>) {
        let text = self.document.and_then(|doc| doc.get(range)).unwrap_or_default();
        tree.set_attribute(node, &self.names.text, text);
    }
}

/// An annotated element, as read back from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSpan {
    pub node: usize,
    pub tag: String,
    pub start: usize,
    pub end: usize,
    /// Only known when the tree was rendered in debug mode
    pub start_accurate: Option<bool>,
    pub end_accurate: Option<bool>,
}

/// Every element carrying a complete, parseable range, in document order.
pub fn collect_spans(tree: &ElementTree, prefix: &str) -> Vec<NodeSpan> {
    let names = AttributeNames::new(prefix);
    let flag = |node: NodeId, name: &str| tree.attribute(node, name).and_then(|v| v.parse().ok());

    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|node| {
            let start = tree.attribute(node, &names.start)?.parse().ok()?;
            let end = tree.attribute(node, &names.end)?.parse().ok()?;
            Some(NodeSpan {
                node: node.0,
                tag: tree.get(node).tag.clone(),
                start,
                end,
                start_accurate: flag(node, &names.start_accurate),
                end_accurate: flag(node, &names.end_accurate),
            })
        })
        .collect()
}
