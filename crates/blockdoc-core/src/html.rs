/*
 * html.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * HTML serialization of the element tree.
 */

//! HTML writer.
//!
//! Serializes the children of the tree root. Elements with children are
//! written with their children on separate lines, except `pre`, whose
//! content is written inline so code text is not padded with newlines.

use std::io::{self, Write};

use crate::tree::{ElementTree, NodeId};

/// Render the whole tree to a string.
pub fn to_html(tree: &ElementTree) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write(tree, &mut buf);
    String::from_utf8_lossy(&buf).trim_end().to_string()
}

/// Main entry point: write every top-level element to `buf`.
pub fn write<W: Write>(tree: &ElementTree, buf: &mut W) -> io::Result<()> {
    for child in tree.children(tree.root()) {
        write_element(tree, *child, buf, true)?;
    }
    Ok(())
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

fn write_element<W: Write>(
    tree: &ElementTree,
    id: NodeId,
    buf: &mut W,
    block: bool,
) -> io::Result<()> {
    let element = tree.get(id);
    write!(buf, "<{}", element.tag)?;
    for (name, value) in &element.attributes {
        write!(buf, " {}=\"{}\"", name, escape_html(value))?;
    }

    let children = element.children();
    if element.text.is_none() && children.is_empty() && is_void(&element.tag) {
        write!(buf, " />")?;
        if block {
            writeln!(buf)?;
        }
        return Ok(());
    }
    write!(buf, ">")?;

    if let Some(text) = &element.text {
        write!(buf, "{}", escape_html(text))?;
    }
    let inline_children = element.tag == "pre";
    if !children.is_empty() && !inline_children {
        writeln!(buf)?;
    }
    for child in children {
        write_element(tree, *child, buf, !inline_children)?;
    }

    write!(buf, "</{}>", element.tag)?;
    if block {
        writeln!(buf)?;
    }
    Ok(())
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "hr" | "br" | "img")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_and_inline_children() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let quote = tree.append(root, "blockquote");
        tree.append_with_text(quote, "p", "a < b");
        let pre = tree.append(root, "pre");
        tree.append_with_text(pre, "code", "x");
        tree.append(root, "hr");

        insta::assert_snapshot!(to_html(&tree), @r"
        <blockquote>
        <p>a &lt; b</p>
        </blockquote>
        <pre><code>x</code></pre>
        <hr />
        ");
    }

    #[test]
    fn test_attributes_are_escaped() {
        let mut tree = ElementTree::new();
        let p = tree.append_with_text(tree.root(), "p", "t");
        tree.set_attribute(p, "title", "\"q\"");

        assert_eq!(to_html(&tree), "<p title=\"&quot;q&quot;\">t</p>");
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(to_html(&ElementTree::new()), "");
    }
}
