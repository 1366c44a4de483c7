//! Block-oriented document compiler.
//!
//! This crate is the host pipeline that position-tracking and other
//! extensions attach to. It exposes two extension points:
//!
//! - [`Preprocessor`]: ordered line-to-line rewrites that run before parsing
//! - [`BlockHandler`]: a priority-ordered chain of handlers that consume raw
//!   blocks and emit [`Element`]s, possibly re-entering the chain recursively
//!
//! # Overview
//!
//! - [`Compiler`]: registries plus the [`BlockParser`]; renders a source
//!   string into an [`ElementTree`]
//! - [`Session`]: per-document state handed to every stage by reference
//! - [`html`]: serializes the tree
//!
//! # Example
//!
//! ```rust
//! use blockdoc_core::{Compiler, html};
//!
//! let rendered = Compiler::with_defaults().render("> quoted\n\n- item");
//! assert_eq!(
//!     html::to_html(&rendered.tree),
//!     "<blockquote>\n<p>quoted</p>\n</blockquote>\n<ul>\n<li>item</li>\n</ul>"
//! );
//! ```

pub mod compiler;
pub mod handlers;
pub mod html;
pub mod parser;
pub mod preprocess;
pub mod registry;
pub mod session;
pub mod tree;

pub use compiler::{Compiler, Extension, Rendered};
pub use parser::{BlockHandler, BlockParser, Outcome, split_blocks};
pub use preprocess::Preprocessor;
pub use registry::Registry;
pub use session::{Extensions, Session, Stash, StashEntry};
pub use tree::{Element, ElementTree, NodeId};
