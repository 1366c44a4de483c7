//! Block quotes.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{BlockHandler, BlockParser, Outcome};
use crate::session::Session;
use crate::tree::NodeId;

static QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ ]{0,3}>[ ]?(?P<text>.*)$").unwrap());

/// `>`-prefixed blocks. The stripped content is parsed recursively inside
/// the quote; a quote block following another quote continues it.
pub struct BlockQuoteHandler;

impl BlockHandler for BlockQuoteHandler {
    fn name(&self) -> &str {
        "blockquote"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        block
            .split('\n')
            .next()
            .is_some_and(|first| QUOTE.is_match(first))
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

        // Lines without a marker are lazy continuations
        let inner = block
            .split('\n')
            .map(|line| match QUOTE.captures(line) {
                Some(caps) => caps["text"].to_string(),
                None => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let quote = match session.tree.last_child(parent) {
            Some(sibling) if session.tree.get(sibling).tag == "blockquote" => sibling,
            _ => session.tree.append(parent, "blockquote"),
        };
        parser.parse_chunk(session, quote, &inner);
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
    fn test_quote_content_is_parsed() {
        let session = parse("> # Inside\n> text\nlazy");
        let tree = &session.tree;
        let quote = tree.children(tree.root())[0];
        assert_eq!(tree.get(quote).tag, "blockquote");

        let inner: Vec<&str> = tree
            .children(quote)
            .iter()
            .map(|id| tree.get(*id).tag.as_str())
            .collect();
        assert_eq!(inner, vec!["h1", "p"]);
        let p = tree.children(quote)[1];
        assert_eq!(tree.get(p).text.as_deref(), Some("text\nlazy"));
    }

    #[test]
    fn test_consecutive_quotes_merge() {
        let session = parse("> a\n\n> b");
        let tree = &session.tree;
        let roots = tree.children(tree.root());
        assert_eq!(roots.len(), 1);
        assert_eq!(tree.children(roots[0]).len(), 2);
    }
}
