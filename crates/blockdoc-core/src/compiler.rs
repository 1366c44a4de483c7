/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Document compiler: preprocessors, block parser and extensions.
 */

//! Document compiler.
//!
//! A [`Compiler`] owns the registered preprocessors and the block parser.
//! Each call to [`Compiler::render`] creates a fresh [`Session`], runs the
//! preprocessors over the source lines in priority order, and parses the
//! result into an element tree.
//!
//! # Example
//!
//! ```rust
//! use blockdoc_core::{Compiler, html};
//!
//! let compiler = Compiler::with_defaults();
//! let rendered = compiler.render("# Title\n\nBody text.");
//! assert_eq!(html::to_html(&rendered.tree), "<h1>Title</h1>\n<p>Body text.</p>");
//! ```

use indexmap::IndexMap;

use crate::handlers;
use crate::parser::{BlockHandler, BlockParser};
use crate::preprocess::{FencedCode, FrontMatter, NormalizeWhitespace, Preprocessor};
use crate::registry::Registry;
use crate::session::{Extensions, Session};
use crate::tree::ElementTree;

/// A bundle of preprocessors and handlers installed together.
pub trait Extension {
    /// Register this extension's components on `compiler`.
    fn extend(&self, compiler: &mut Compiler);
}

/// Output of a render.
#[derive(Debug)]
pub struct Rendered {
    pub tree: ElementTree,
    pub meta: IndexMap<String, String>,
    /// Per-document state extensions left behind
    pub extensions: Extensions,
}

pub struct Compiler {
    preprocessors: Registry<Box<dyn Preprocessor>>,
    parser: BlockParser,
}

impl Compiler {
    /// A compiler with no preprocessors and no handlers.
    pub fn new() -> Self {
        Compiler {
            preprocessors: Registry::new(),
            parser: BlockParser::new(),
        }
    }

    /// A compiler with the reference grammar installed.
    pub fn with_defaults() -> Self {
        let mut compiler = Self::new();
        compiler.register_preprocessor(30, Box::new(NormalizeWhitespace));
        compiler.register_preprocessor(25, Box::new(FrontMatter));
        compiler.register_preprocessor(20, Box::new(FencedCode));
        handlers::register_defaults(&mut compiler.parser);
        compiler
    }

    pub fn register_preprocessor(&mut self, priority: i32, preprocessor: Box<dyn Preprocessor>) {
        let name = preprocessor.name().to_string();
        self.preprocessors.register(name, priority, preprocessor);
    }

    pub fn register_handler(&mut self, priority: i32, handler: Box<dyn BlockHandler>) {
        self.parser.register(priority, handler);
    }

    pub fn use_extension(&mut self, extension: &dyn Extension) -> &mut Self {
        extension.extend(self);
        self
    }

    pub fn parser(&self) -> &BlockParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut BlockParser {
        &mut self.parser
    }

    /// Preprocessor names in execution order.
    pub fn preprocessor_names(&self) -> Vec<&str> {
        self.preprocessors.names()
    }

    /// Render `source` into an element tree.
    ///
    /// Lines are split on `\n` only; a carriage return stays part of its
    /// line until a preprocessor removes it.
    pub fn render(&self, source: &str) -> Rendered {
        let mut session = Session::new();
        let mut lines: Vec<String> = source.split('\n').map(String::from).collect();

        for preprocessor in self.preprocessors.iter() {
            tracing::debug!(preprocessor = preprocessor.name(), lines = lines.len(), "Running preprocessor");
            lines = preprocessor.run(&mut session, lines);
        }

        self.parser.parse_document(&mut session, &lines);
        Rendered {
            tree: session.tree,
            meta: session.meta,
            extensions: session.extensions,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::with_defaults()
    }
}
