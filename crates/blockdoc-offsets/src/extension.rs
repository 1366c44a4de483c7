//! Wiring of the offsets layer into a [`Compiler`].

use blockdoc_core::{Compiler, Extension, Preprocessor, Session};

use crate::align::LineAligner;
use crate::attributor::BlockAttributor;
use crate::config::OffsetsConfig;
use crate::context::DocumentOffsets;

/// Runs before every other preprocessor.
pub const CAPTURE_PRIORITY: i32 = 1000;
/// Runs after every other preprocessor.
pub const ALIGN_PRIORITY: i32 = 0;
/// Above every grammar handler.
pub const HANDLER_PRIORITY: i32 = 200;

/// Indexes the untouched original document.
struct CaptureDocument;

impl Preprocessor for CaptureDocument {
    fn name(&self) -> &str {
        "capture_document"
    }

    fn run(&self, session: &mut Session, lines: Vec<String>) -> Vec<String> {
        session.extensions.insert(DocumentOffsets::new(&lines));
        lines
    }
}

/// Aligns the fully preprocessed lines against the original.
struct AlignDocument {
    aligner: LineAligner,
}

impl Preprocessor for AlignDocument {
    fn name(&self) -> &str {
        "align_document"
    }

    fn run(&self, session: &mut Session, lines: Vec<String>) -> Vec<String> {
        match session.extensions.get_mut::<DocumentOffsets>() {
            Some(ctx) => ctx.align(&self.aligner, &lines),
            None => tracing::warn!("Original document was not captured; offsets are disabled"),
        }
        lines
    }
}

/// Attaches original-document byte offsets to emitted nodes.
///
/// # Example
///
/// ```rust
/// use blockdoc_core::{Compiler, html};
/// use blockdoc_offsets::OffsetsExtension;
///
/// let mut compiler = Compiler::with_defaults();
/// compiler.use_extension(&OffsetsExtension::default());
///
/// let rendered = compiler.render("Lorem ipsum");
/// assert_eq!(
///     html::to_html(&rendered.tree),
///     r#"<p data-original-document-start="0" data-original-document-end="11">Lorem ipsum</p>"#
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct OffsetsExtension {
    config: OffsetsConfig,
}

impl OffsetsExtension {
    pub fn new(config: OffsetsConfig) -> Self {
        OffsetsExtension { config }
    }

    pub fn config(&self) -> &OffsetsConfig {
        &self.config
    }
}

impl Extension for OffsetsExtension {
    fn extend(&self, compiler: &mut Compiler) {
        compiler.register_preprocessor(CAPTURE_PRIORITY, Box::new(CaptureDocument));
        compiler.register_preprocessor(
            ALIGN_PRIORITY,
            Box::new(AlignDocument {
                aligner: LineAligner::new(self.config.strategy),
            }),
        );
        compiler.register_handler(HANDLER_PRIORITY, Box::new(BlockAttributor::new(self.config.clone())));
    }
}
