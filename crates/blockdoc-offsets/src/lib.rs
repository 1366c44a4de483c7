//! Original-document byte offsets for every emitted element.
//!
//! Preprocessors may rewrite, drop or inject lines before the block parser
//! ever sees them, and block handlers may feed text back into the parser
//! recursively. This crate recovers, for each element the parser emits, the
//! half-open byte range `[start, end)` of the original source that produced
//! it, and flags ranges that could only be recovered approximately.
//!
//! # Pipeline
//!
//! 1. [`OffsetIndex`]: byte range of every original line, captured before
//!    any preprocessor runs
//! 2. [`LineAligner`]: aligns the preprocessed lines with the original ones
//!    into a [`RestoreMap`]
//! 3. [`BlockAttributor`]: claims each raw block, delegates it to the rest of
//!    the handler chain under a [`RecursionGuard`], then stamps the resulting
//!    nodes
//!
//! All three share one [`DocumentOffsets`] context that lives in the render
//! session. [`OffsetsExtension`] installs the whole thing on a compiler.
//!
//! # Example
//!
//! ```rust
//! use blockdoc_core::Compiler;
//! use blockdoc_offsets::{OffsetsExtension, collect_spans};
//!
//! let mut compiler = Compiler::with_defaults();
//! compiler.use_extension(&OffsetsExtension::default());
//!
//! let rendered = compiler.render("# Title\n\nBody text.");
//! let spans: Vec<(String, usize, usize)> = collect_spans(&rendered.tree, "data-")
//!     .into_iter()
//!     .map(|s| (s.tag, s.start, s.end))
//!     .collect();
//! assert_eq!(
//!     spans,
//!     vec![("h1".to_string(), 0, 7), ("p".to_string(), 9, 19)]
//! );
//! ```

pub mod align;
pub mod annotation;
pub mod attributor;
pub mod config;
pub mod context;
pub mod error;
pub mod extension;
pub mod guard;
pub mod index;

pub use align::{AlignmentStrategy, EditKind, EditOp, LineAligner, LineTranslation, RestoreMap};
pub use annotation::{Annotation, AttributeNames, NodeSpan, collect_spans};
pub use attributor::BlockAttributor;
pub use config::OffsetsConfig;
pub use context::{BlockSpan, DocumentOffsets};
pub use error::{ConfigError, OffsetError, Result};
pub use extension::OffsetsExtension;
pub use guard::RecursionGuard;
pub use index::{LineRecord, OffsetIndex};
