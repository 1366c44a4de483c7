//! Code blocks: indented code and fenced code restored from the stash.

use std::collections::VecDeque;

use crate::parser::{BlockHandler, BlockParser, Outcome};
use crate::preprocess::TAB_LENGTH;
use crate::session::{Session, Stash};
use crate::tree::NodeId;

fn is_indented(line: &str) -> bool {
    line.len() >= TAB_LENGTH && line.as_bytes()[..TAB_LENGTH].iter().all(|b| *b == b' ')
}

fn dedent(line: &str) -> &str {
    let strip = line.bytes().take(TAB_LENGTH).take_while(|b| *b == b' ').count();
    &line[strip..]
}

/// Code blocks indented by four spaces.
///
/// An indented block that directly follows a `pre > code` sibling is
/// appended to that code element instead of creating a new one, so code
/// interrupted by blank lines stays a single element.
pub struct IndentedCodeHandler;

impl IndentedCodeHandler {
    fn sibling_code(session: &Session, parent: NodeId) -> Option<NodeId> {
        let tree = &session.tree;
        let sibling = tree.last_child(parent)?;
        if tree.get(sibling).tag != "pre" {
            return None;
        }
        let code = *tree.children(sibling).first()?;
        (tree.get(code).tag == "code").then_some(code)
    }
}

impl BlockHandler for IndentedCodeHandler {
    fn name(&self) -> &str {
        "indented_code"
    }

    fn test(&self, _session: &Session, _parent: NodeId, block: &str) -> bool {
        is_indented(block)
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

        let lines: Vec<&str> = block.split('\n').collect();
        let taken = lines
            .iter()
            .take_while(|line| is_indented(line) || line.trim().is_empty())
            .count();
        let code = lines[..taken]
            .iter()
            .map(|line| dedent(line))
            .collect::<Vec<_>>()
            .join("\n");
        let code = code.trim_end_matches('\n').to_string();
        if taken < lines.len() {
            blocks.push_front(lines[taken..].join("\n"));
        }

        match Self::sibling_code(session, parent) {
            Some(existing) => {
                let element = session.tree.get_mut(existing);
                let text = element.text.get_or_insert_with(String::new);
                text.push_str("\n\n");
                text.push_str(&code);
            }
            None => {
                let pre = session.tree.append(parent, "pre");
                session.tree.append_with_text(pre, "code", code);
            }
        }
        Outcome::Handled
    }
}

/// Expands placeholder lines left by the `fenced_code` preprocessor.
pub struct StashHandler;

impl BlockHandler for StashHandler {
    fn name(&self) -> &str {
        "stash"
    }

    fn test(&self, session: &Session, _parent: NodeId, block: &str) -> bool {
        Stash::parse_placeholder(block)
            .and_then(|index| session.stash.get(index))
            .is_some()
    }

    fn run(
        &self,
        _parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let entry = blocks
            .front()
            .and_then(|block| Stash::parse_placeholder(block))
            .and_then(|index| session.stash.get(index))
            .cloned();
        let Some(entry) = entry else {
            return Outcome::Declined;
        };
        blocks.pop_front();

        let pre = session.tree.append(parent, "pre");
        let code = session.tree.append_with_text(pre, "code", entry.code);
        if let Some(info) = entry.info {
            session
                .tree
                .set_attribute(code, "class", format!("language-{}", info));
        }
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StashEntry;

    fn parser() -> BlockParser {
        let mut parser = BlockParser::new();
        super::super::register_defaults(&mut parser);
        parser
    }

    #[test]
    fn test_indented_code_merges_across_blank_lines() {
        let mut session = Session::new();
        parser().parse_chunk(&mut session, NodeId(0), "    a\n\n    b\nafter");

        let tree = &session.tree;
        let kids = tree.children(tree.root());
        assert_eq!(kids.len(), 2);
        let code = tree.children(kids[0])[0];
        assert_eq!(tree.get(code).text.as_deref(), Some("a\n\nb"));
        assert_eq!(tree.get(kids[1]).tag, "p");
    }

    #[test]
    fn test_stash_placeholder_expands() {
        let mut session = Session::new();
        let placeholder = session.stash.store(StashEntry {
            info: Some("rust".to_string()),
            code: "let x = 1;".to_string(),
        });
        parser().parse_chunk(&mut session, NodeId(0), &placeholder);

        let tree = &session.tree;
        let pre = tree.children(tree.root())[0];
        let code = tree.children(pre)[0];
        assert_eq!(tree.get(code).text.as_deref(), Some("let x = 1;"));
        assert_eq!(tree.attribute(code, "class"), Some("language-rust"));
    }

    #[test]
    fn test_unknown_placeholder_falls_through() {
        let mut session = Session::new();
        parser().parse_chunk(&mut session, NodeId(0), &Stash::placeholder(3));

        let tree = &session.tree;
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.get(p).tag, "p");
    }
}
