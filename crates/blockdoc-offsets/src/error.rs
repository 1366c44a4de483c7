//! Error types for blockdoc-offsets

use thiserror::Error;

/// Failures translating a line range between coordinate spaces.
///
/// These are never fatal: the attributor logs them and leaves the affected
/// element without offset attributes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffsetError {
    /// The mutated lines have no counterpart in the original document:
    /// they were injected by a preprocessor, or clipping against injected
    /// lines left nothing.
    #[error("no original lines correspond to lines {start}..{end}")]
    NoMapping { start: usize, end: usize },

    #[error("line {line} is outside the {len}-line document")]
    LineOutOfRange { line: usize, len: usize },
}

/// Failures loading [`OffsetsConfig`](crate::OffsetsConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OffsetError>;
