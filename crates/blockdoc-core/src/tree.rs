/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Arena-backed element tree produced by the block parser.
 */

//! Element tree.
//!
//! Elements live in a flat arena owned by [`ElementTree`] and refer to each
//! other by [`NodeId`]. Handlers append children under a parent, and may
//! detach and reattach existing nodes when they merge content into an element
//! emitted by an earlier block.

use indexmap::IndexMap;

/// Index of an element inside its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A single element of the output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name (`p`, `h1`, `blockquote`, ...)
    pub tag: String,
    /// Text content, written before any children
    pub text: Option<String>,
    /// Attributes in insertion order
    pub attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            text: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Arena of elements rooted at a synthetic `div`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTree {
    nodes: Vec<Element>,
}

impl ElementTree {
    pub fn new() -> Self {
        ElementTree {
            nodes: vec![Element::new("div")],
        }
    }

    /// The synthetic root element. It is never serialized itself.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    /// Create a new element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut element = Element::new(tag);
        element.parent = Some(parent);
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Create a new element with text content as the last child of `parent`.
    pub fn append_with_text(&mut self, parent: NodeId, tag: &str, text: impl Into<String>) -> NodeId {
        let id = self.append(parent, tag);
        self.nodes[id.0].text = Some(text.into());
        id
    }

    /// Remove `id` from its parent's child list. The element stays in the
    /// arena and can be reattached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Move `id` to the end of `parent`'s child list.
    pub fn reattach(&mut self, parent: NodeId, id: NodeId) {
        self.detach(id);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0].attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attribute(name)
    }

    /// All attached descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_children() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let p = tree.append_with_text(root, "p", "hello");
        let h = tree.append(root, "h1");

        assert_eq!(tree.children(root), &[p, h]);
        assert_eq!(tree.get(p).text.as_deref(), Some("hello"));
        assert_eq!(tree.get(h).parent(), Some(root));
        assert_eq!(tree.last_child(root), Some(h));
    }

    #[test]
    fn test_detach_and_reattach() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let a = tree.append(root, "p");
        let b = tree.append(root, "p");

        tree.detach(a);
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.get(a).parent(), None);

        tree.reattach(root, a);
        assert_eq!(tree.children(root), &[b, a]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let quote = tree.append(root, "blockquote");
        let inner = tree.append(quote, "p");
        let after = tree.append(root, "p");

        assert_eq!(tree.descendants(root), vec![quote, inner, after]);
    }

    #[test]
    fn test_attributes_keep_insertion_order() {
        let mut tree = ElementTree::new();
        let p = tree.append(tree.root(), "p");
        tree.set_attribute(p, "b", "2");
        tree.set_attribute(p, "a", "1");

        let names: Vec<&String> = tree.get(p).attributes.keys().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(tree.attribute(p, "a"), Some("1"));
    }
}
