//! End-to-end rendering through the reference grammar.

use blockdoc_core::{Compiler, html};

const DOCUMENT: &str = "title: Demo
author: Someone

# Heading

Some text
over two lines.

- one
- two

> quoted

```rust
let x = 1;
```

***";

#[test]
fn test_reference_grammar_document() {
    let rendered = Compiler::with_defaults().render(DOCUMENT);

    insta::assert_snapshot!(html::to_html(&rendered.tree), @r#"
    <h1>Heading</h1>
    <p>Some text
    over two lines.</p>
    <ul>
    <li>one</li>
    <li>two</li>
    </ul>
    <blockquote>
    <p>quoted</p>
    </blockquote>
    <pre><code class="language-rust">let x = 1;</code></pre>
    <hr />
    "#);
}

#[test]
fn test_front_matter_lands_in_meta() {
    let rendered = Compiler::with_defaults().render(DOCUMENT);

    assert_eq!(rendered.meta.get("title").map(String::as_str), Some("Demo"));
    assert_eq!(rendered.meta.get("author").map(String::as_str), Some("Someone"));
}

#[test]
fn test_bare_compiler_renders_nothing() {
    let rendered = Compiler::new().render("# Heading\n\ntext");
    assert_eq!(html::to_html(&rendered.tree), "");
}
