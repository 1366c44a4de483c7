//! Configuration for the offsets layer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::AlignmentStrategy;
use crate::error::ConfigError;

/// Options for [`OffsetsExtension`](crate::OffsetsExtension).
///
/// Read from the `[offsets]` table of a TOML file:
///
/// ```toml
/// [offsets]
/// debug = true
/// strategy = "sequential"
/// attribute-prefix = "data-"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OffsetsConfig {
    /// Record the source text and accuracy flags on every node, and log
    /// failed translations as warnings
    pub debug: bool,
    pub strategy: AlignmentStrategy,
    /// Prefix of every attribute name written onto nodes
    pub attribute_prefix: String,
}

impl Default for OffsetsConfig {
    fn default() -> Self {
        OffsetsConfig {
            debug: false,
            strategy: AlignmentStrategy::Diff,
            attribute_prefix: "data-".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    offsets: OffsetsConfig,
}

impl OffsetsConfig {
    /// Parse a TOML document. A missing `[offsets]` table yields the
    /// defaults; other tables are ignored.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        Ok(file.offsets)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_table_missing() {
        let config = OffsetsConfig::from_toml_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, OffsetsConfig::default());
    }

    #[test]
    fn test_partial_table() {
        let config = OffsetsConfig::from_toml_str(
            r#"
[offsets]
strategy = "sequential"
attribute-prefix = "x-"
"#,
        )
        .unwrap();
        assert!(!config.debug);
        assert_eq!(config.strategy, AlignmentStrategy::Sequential);
        assert_eq!(config.attribute_prefix, "x-");
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let err = OffsetsConfig::from_toml_str("[offsets]\nstrategy = \"fuzzy\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = OffsetsConfig::load("/nonexistent/blockdoc.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
