//! Ordered and unordered lists.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{BlockHandler, BlockParser, Outcome};
use crate::preprocess::TAB_LENGTH;
use crate::session::Session;
use crate::tree::NodeId;

static ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ ]{0,3}(?P<marker>[*+-]|\d+\.)[ ]+(?P<text>.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn of_marker(marker: &str) -> Self {
        if marker.ends_with('.') {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Bullet (`-`, `*`, `+`) and numbered (`1.`) lists.
///
/// Each item body is parsed recursively; an item whose body is a single
/// paragraph is kept tight (text directly on the `li`). A list block that
/// follows a list of the same kind is appended to it.
pub struct ListHandler;

impl ListHandler {
    fn split_items(block: &str, kind: ListKind) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        for line in block.split('\n') {
            match ITEM.captures(line) {
                Some(caps) if ListKind::of_marker(&caps["marker"]) == kind => {
                    items.push(caps["text"].to_string());
                }
                _ => {
                    let strip = line.bytes().take(TAB_LENGTH).take_while(|b| *b == b' ').count();
                    if let Some(current) = items.last_mut() {
                        current.push('\n');
                        current.push_str(&line[strip..]);
                    }
                }
            }
        }
        items
    }

    fn tighten(session: &mut Session, item: NodeId) {
        let tree = &mut session.tree;
        let [only] = tree.children(item) else {
            return;
        };
        let only = *only;
        if tree.get(only).tag != "p" || !tree.children(only).is_empty() {
            return;
        }
        let text = tree.get_mut(only).text.take();
        tree.detach(only);
        tree.get_mut(item).text = text;
    }
}

impl BlockHandler for ListHandler {
    fn name(&self) -> &str {
        "list"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        block
            .split('\n')
            .next()
            .is_some_and(|first| ITEM.is_match(first))
    }

    fn run(
        &self,
        parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let kind = blocks
            .front()
            .and_then(|block| block.split('\n').next())
            .and_then(|first| ITEM.captures(first))
            .map(|caps| ListKind::of_marker(&caps["marker"]));
        let Some(kind) = kind else {
            return Outcome::Declined;
        };
        let Some(block) = blocks.pop_front() else {
            return Outcome::Declined;
        };

        let list = match session.tree.last_child(parent) {
            Some(sibling) if session.tree.get(sibling).tag == kind.tag() => sibling,
            _ => session.tree.append(parent, kind.tag()),
        };

        for body in Self::split_items(&block, kind) {
            let item = session.tree.append(list, "li");
            parser.parse_chunk(session, item, &body);
            Self::tighten(session, item);
        }
        Outcome::Handled
    }
}
