//! Command implementations for the blockdoc CLI
//!
//! Each command reads one document, renders it through the default grammar
//! with the offsets layer installed, and writes its result to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use blockdoc_core::Compiler;
use blockdoc_offsets::{AlignmentStrategy, OffsetsConfig, OffsetsExtension};

pub mod index;
pub mod render;
pub mod spans;

/// Line alignment strategy
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Strategy {
    /// Line diff; tolerates rewritten lines
    Diff,
    /// Forward scan; only for preprocessing that drops or injects lines
    Sequential,
}

impl From<Strategy> for AlignmentStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Diff => AlignmentStrategy::Diff,
            Strategy::Sequential => AlignmentStrategy::Sequential,
        }
    }
}

/// Input document and offsets options shared by every command
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input document
    pub file: PathBuf,

    /// Record source text and accuracy flags on every element
    #[arg(long)]
    pub debug: bool,

    /// Line alignment strategy (overrides the config file)
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// TOML file with an [offsets] table
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))
    }

    /// Config file values with command-line overrides applied.
    pub fn offsets_config(&self) -> Result<OffsetsConfig> {
        let mut config = match &self.config {
            Some(path) => OffsetsConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => OffsetsConfig::default(),
        };
        if self.debug {
            config.debug = true;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }
        Ok(config)
    }
}

/// Default grammar with the offsets layer installed.
pub fn offsets_compiler(config: &OffsetsConfig) -> Compiler {
    let mut compiler = Compiler::with_defaults();
    compiler.use_extension(&OffsetsExtension::new(config.clone()));
    compiler
}
