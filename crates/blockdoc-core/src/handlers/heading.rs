//! ATX headings.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use super::split_around;
use crate::parser::{BlockHandler, BlockParser, Outcome};
use crate::session::Session;
use crate::tree::NodeId;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<level>#{1,6})(?:[ ]+(?P<text>.*?))?[ ]*#*[ ]*\r?$").unwrap()
});

/// `#` through `######` headings. A heading line inside a larger block splits
/// it: the text before is parsed on the spot, the text after goes back on the
/// queue.
pub struct HeadingHandler;

impl BlockHandler for HeadingHandler {
    fn name(&self) -> &str {
        "heading"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        HEADING.is_match(block)
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
        let parsed = HEADING.captures(&block).and_then(|caps| {
            let whole = caps.get(0)?.range();
            let level = caps["level"].len();
            let text = caps
                .name("text")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            Some((whole, level, text))
        });
        let Some((whole, level, text)) = parsed else {
            blocks.push_front(block);
            return Outcome::Declined;
        };

        split_around(parser, session, parent, blocks, &block, whole);
        session
            .tree
            .append_with_text(parent, &format!("h{}", level), text);
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Session {
        let mut parser = BlockParser::new();
        super::super::register_defaults(&mut parser);
        let mut session = Session::new();
        parser.parse_chunk(&mut session, NodeId(0), text);
        session
    }

    #[test]
    fn test_heading_levels_and_closing_hashes() {
        let session = parse("# One\n\n### Three ###");
        let tree = &session.tree;
        let kids = tree.children(tree.root());
        assert_eq!(tree.get(kids[0]).tag, "h1");
        assert_eq!(tree.get(kids[0]).text.as_deref(), Some("One"));
        assert_eq!(tree.get(kids[1]).tag, "h3");
        assert_eq!(tree.get(kids[1]).text.as_deref(), Some("Three"));
    }

    #[test]
    fn test_heading_splits_surrounding_text() {
        let session = parse("before\n## Mid\nafter");
        let tree = &session.tree;
        let tags: Vec<&str> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree.get(*id).tag.as_str())
            .collect();
        assert_eq!(tags, vec!["p", "h2", "p"]);
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        let session = parse("#tag");
        let tree = &session.tree;
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.get(p).tag, "p");
    }
}
