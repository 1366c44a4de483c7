/*
 * handlers/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reference block grammar.
 */

//! Reference block grammar.
//!
//! A deliberately small Markdown-like grammar, enough to exercise every
//! dispatch shape an extension has to cope with:
//!
//! - blocks split around a matched line, with the remainder pushed back
//!   ([`HeadingHandler`], [`RuleHandler`])
//! - recursive re-entry into the handler chain ([`ListHandler`],
//!   [`BlockQuoteHandler`])
//! - content merged into a node emitted by an earlier block
//!   ([`IndentedCodeHandler`], [`ListHandler`], [`BlockQuoteHandler`])
//! - nodes restored from preprocessor placeholders ([`StashHandler`])

mod blockquote;
mod code;
mod heading;
mod list;

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

pub use blockquote::BlockQuoteHandler;
pub use code::{IndentedCodeHandler, StashHandler};
pub use heading::HeadingHandler;
pub use list::ListHandler;

use crate::parser::{BlockHandler, BlockParser, Outcome};
use crate::session::Session;
use crate::tree::NodeId;

/// Register the reference grammar on `parser`.
pub fn register_defaults(parser: &mut BlockParser) {
    parser.register(100, Box::new(EmptyBlockHandler));
    parser.register(80, Box::new(IndentedCodeHandler));
    parser.register(70, Box::new(HeadingHandler));
    parser.register(50, Box::new(RuleHandler));
    parser.register(40, Box::new(ListHandler));
    parser.register(20, Box::new(BlockQuoteHandler));
    parser.register(15, Box::new(StashHandler));
    parser.register(10, Box::new(ParagraphHandler));
}

/// Parse the text before a matched line, then push the text after it back
/// onto the queue.
///
/// `matched` is a byte range of `block`.
pub(crate) fn split_around(
    parser: &BlockParser,
    session: &mut Session,
    parent: NodeId,
    blocks: &mut VecDeque<String>,
    block: &str,
    matched: std::ops::Range<usize>,
) {
    let before = block[..matched.start].trim_end_matches('\n');
    if !before.trim().is_empty() {
        parser.parse_blocks(session, parent, VecDeque::from([before.to_string()]));
    }
    let after = block[matched.end..].strip_prefix('\n').unwrap_or(&block[matched.end..]);
    if !after.trim().is_empty() {
        blocks.push_front(after.to_string());
    }
}

/// Consumes blank blocks and strips leading newlines left by runs of blank
/// lines.
pub struct EmptyBlockHandler;

impl BlockHandler for EmptyBlockHandler {
    fn name(&self) -> &str {
        "empty"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        block.trim().is_empty() || block.starts_with('\n')
    }

    fn run(
        &self,
        _parser: &BlockParser,
        _session: &mut Session,
        _parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let Some(block) = blocks.pop_front() else {
            return Outcome::Declined;
        };
        let rest = block.trim_start_matches('\n');
        if !rest.trim().is_empty() {
            blocks.push_front(rest.to_string());
        }
        Outcome::Handled
    }
}

static RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ ]{0,3}(?:(?:\*[ ]*){3,}|(?:-[ ]*){3,}|(?:_[ ]*){3,})$").unwrap()
});

/// Thematic breaks (`***`, `---`, `___`).
pub struct RuleHandler;

impl BlockHandler for RuleHandler {
    fn name(&self) -> &str {
        "rule"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        RULE.is_match(block)
    }

    fn run(
        &self,
        parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let Some(block) = blocks.pop_front() else {
            return Outcome::Declined;
        };
        let Some(matched) = RULE.find(&block).map(|m| m.range()) else {
            blocks.push_front(block);
            return Outcome::Declined;
        };
        split_around(parser, session, parent, blocks, &block, matched);
        session.tree.append(parent, "hr");
        Outcome::Handled
    }
}

/// Fallback: every remaining block becomes a paragraph.
pub struct ParagraphHandler;

impl BlockHandler for ParagraphHandler {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn test(&self, _session: &Session, _parent: NodeId, _block: &str) -> bool {
        true
    }

    fn run(
        &self,
        _parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let Some(block) = blocks.pop_front() else {
            return Outcome::Declined;
        };
        let text = block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            session.tree.append_with_text(parent, "p", text);
        }
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Session {
        let mut parser = BlockParser::new();
        register_defaults(&mut parser);
        let mut session = Session::new();
        parser.parse_chunk(&mut session, NodeId(0), text);
        session
    }

    fn tags(session: &Session) -> Vec<String> {
        let tree = &session.tree;
        tree.descendants(tree.root())
            .into_iter()
            .map(|id| tree.get(id).tag.clone())
            .collect()
    }

    #[test]
    fn test_empty_blocks_produce_nothing() {
        let session = parse("\n\n\n\n");
        assert!(session.tree.is_empty());
    }

    #[test]
    fn test_rule_splits_block() {
        let session = parse("above\n---\nbelow");
        assert_eq!(tags(&session), vec!["p", "hr", "p"]);
    }

    #[test]
    fn test_paragraph_trims_lines() {
        let session = parse("  one\n two  ");
        let tree = &session.tree;
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.get(p).text.as_deref(), Some("one\ntwo"));
    }
}
