/*
 * attributor.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Block handler that attaches original-document offsets to emitted nodes.
 */

//! The block attributor.
//!
//! [`BlockAttributor`] is registered above every grammar handler. For each
//! raw block it finds the mutated lines the block was built from, hands the
//! block back to the parser to build the real nodes, then translates the
//! line span to original byte offsets and writes them onto whatever the
//! parse produced.

use std::collections::VecDeque;

use blockdoc_core::{BlockHandler, BlockParser, NodeId, Outcome, Session};

use crate::annotation::{AttributeNames, Stamper};
use crate::config::OffsetsConfig;
use crate::context::DocumentOffsets;

pub const HANDLER_NAME: &str = "offsets";

pub struct BlockAttributor {
    config: OffsetsConfig,
    names: AttributeNames,
}

impl BlockAttributor {
    pub fn new(config: OffsetsConfig) -> Self {
        let names = AttributeNames::new(&config.attribute_prefix);
        BlockAttributor { config, names }
    }
}

/// Children of `parent` that delegation produced.
///
/// Nodes created by the delegated parse, or, when nothing was created, an
/// existing node the parse moved to the end of `parent`.
fn produced_nodes(before: &[NodeId], after: &[NodeId]) -> Vec<NodeId> {
    let mut produced: Vec<NodeId> = after.iter().copied().filter(|id| !before.contains(id)).collect();
    if produced.is_empty() && after.last() != before.last() {
        produced.extend(after.last().copied());
    }
    produced
}

impl BlockHandler for BlockAttributor {
    fn name(&self) -> &str {
        HANDLER_NAME
    }

    fn test(&self, session: &Session, _parent: NodeId, block: &str) -> bool {
        session
            .extensions
            .get::<DocumentOffsets>()
            .is_some_and(|ctx| ctx.wants(block))
    }

    fn run(
        &self,
        parser: &BlockParser,
        session: &mut Session,
        parent: NodeId,
        blocks: &mut VecDeque<String>,
    ) -> Outcome {
        let Some(ctx) = session.extensions.get_mut::<DocumentOffsets>() else {
            return Outcome::Declined;
        };
        let Some(span) = blocks.front().and_then(|block| ctx.claim(block)) else {
            return Outcome::Declined;
        };

        ctx.guard.enter();
        let before = session.tree.children(parent).to_vec();
        if let Some(block) = blocks.pop_front() {
            parser.parse_blocks(session, parent, VecDeque::from([block]));
        }

        let Some(ctx) = session.extensions.get_mut::<DocumentOffsets>() else {
            return Outcome::Handled;
        };
        ctx.guard.exit();

        let tree = &mut session.tree;
        let produced = produced_nodes(&before, tree.children(parent));
        tracing::debug!(
            lines = ?span.range(),
            produced = produced.len(),
            "Delegated block"
        );

        let annotation = match ctx.annotate(span) {
            Ok(annotation) => annotation,
            Err(err) => {
                if self.config.debug {
                    tracing::warn!(%err, "Failed to restore document offsets for block");
                } else {
                    tracing::debug!(%err, "No document offsets for block");
                }
                return Outcome::Handled;
            }
        };
        let stamper = Stamper {
            names: &self.names,
            document: self.config.debug.then(|| ctx.index().document()),
        };

        let mut emitted = None;
        match produced.as_slice() {
            [] => {
                // Content was merged into an existing node
                if let Some(last) = tree.last_child(parent) {
                    let had_start = stamper.patch(tree, last, &annotation);
                    if !had_start && self.config.debug {
                        tracing::warn!(
                            start = annotation.start,
                            end = annotation.end,
                            "Patched a node without an original document start"
                        );
                    }
                }
            }
            [only] if Some(*only) == ctx.last_emitted_parent => {
                stamper.extend(tree, *only, &annotation);
            }
            nodes => {
                for node in nodes {
                    stamper.stamp(tree, *node, &annotation);
                }
                emitted = nodes.last().copied();
            }
        }
        if emitted.is_some() {
            ctx.last_emitted_parent = emitted;
        }
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produced_nodes() {
        let (a, b, c) = (NodeId(1), NodeId(2), NodeId(3));
        assert_eq!(produced_nodes(&[a], &[a, b, c]), vec![b, c]);
        assert_eq!(produced_nodes(&[a, b], &[a, b]), vec![]);
        // b moved to the end
        assert_eq!(produced_nodes(&[b, a], &[a, b]), vec![b]);
    }

    #[test]
    fn test_declines_without_context() {
        let attributor = BlockAttributor::new(OffsetsConfig::default());
        let parser = BlockParser::new();
        let mut session = Session::new();
        let root = session.tree.root();
        let mut blocks = VecDeque::from(["text".to_string()]);

        assert!(!attributor.test(&session, root, "text"));
        assert_eq!(
            attributor.run(&parser, &mut session, root, &mut blocks),
            Outcome::Declined
        );
        assert_eq!(blocks.len(), 1);
    }
}
