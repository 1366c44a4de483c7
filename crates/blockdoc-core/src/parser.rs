/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Recursive block parser dispatching to a priority-ordered handler chain.
 */

//! Block parser.
//!
//! The parser splits text into blocks on blank-line boundaries and offers the
//! head of the pending queue to each registered [`BlockHandler`] in priority
//! order. A handler that accepts a block must remove it from the queue (it
//! may push remainders back to the front), and may feed text back into the
//! parser through [`BlockParser::parse_chunk`] or
//! [`BlockParser::parse_blocks`], re-entering the same handler chain.

use std::collections::VecDeque;

use crate::registry::Registry;
use crate::session::Session;
use crate::tree::NodeId;

/// Result of [`BlockHandler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler consumed the head of the queue.
    Handled,
    /// The handler left the queue untouched; dispatch continues with the
    /// next handler.
    Declined,
}

/// A participant in block dispatch.
pub trait BlockHandler {
    /// Name used for registration and logging.
    fn name(&self) -> &str;

    /// Cheap check whether this handler wants `block`.
    fn test(&self, session: &Session, parent: NodeId, block: &str) -> bool;

    /// Consume `blocks[0]` and emit nodes under `parent`, or decline.
    fn run(
        &self,
        parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome;
}

/// Splits text into blocks and dispatches them through the handler chain.
pub struct BlockParser {
    handlers: Registry<Box<dyn BlockHandler>>,
}

impl BlockParser {
    pub fn new() -> Self {
        BlockParser {
            handlers: Registry::new(),
        }
    }

    pub fn register(&mut self, priority: i32, handler: Box<dyn BlockHandler>) {
        let name = handler.name().to_string();
        self.handlers.register(name, priority, handler);
    }

    pub fn deregister(&mut self, name: &str) -> Option<Box<dyn BlockHandler>> {
        self.handlers.deregister(name)
    }

    /// Handler names in dispatch order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.names()
    }

    /// Parse a whole document into the session tree's root.
    pub fn parse_document(&self, session: &mut Session, lines: &[String]) {
        let root = session.tree.root();
        self.parse_chunk(session, root, &lines.join("\n"));
    }

    /// Split `text` into blocks and parse them under `parent`.
    pub fn parse_chunk(&self, session: &mut Session, parent: NodeId, text: &str) {
        self.parse_blocks(session, parent, split_blocks(text));
    }

    /// Dispatch each pending block until the queue is empty.
    pub fn parse_blocks(&self, session: &mut Session, parent: NodeId, mut blocks: VecDeque<String>) {
        while let Some(head) = blocks.front().cloned() {
            let before = blocks.len();
            let mut handled = false;
            for handler in self.handlers.iter() {
                if !handler.test(session, parent, &head) {
                    continue;
                }
                tracing::trace!(handler = handler.name(), "Offering block");
                if handler.run(self, session, parent, &mut blocks) == Outcome::Handled {
                    handled = true;
                    break;
                }
                // A declining handler must not have touched the queue
                debug_assert_eq!(blocks.len(), before);
            }
            if !handled {
                blocks.pop_front();
                tracing::warn!(block = %head, "No block handler accepted block; dropping it");
            }
        }
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text on blank-line separators.
///
/// Runs of more than one blank line leave leading newlines on the following
/// block; the `empty` handler strips them.
pub fn split_blocks(text: &str) -> VecDeque<String> {
    text.split("\n\n").map(String::from).collect()
}
