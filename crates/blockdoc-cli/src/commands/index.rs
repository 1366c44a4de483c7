//! `blockdoc index`: line index and restore map as JSON.

use anyhow::{Context, Result};

use blockdoc_offsets::DocumentOffsets;

use super::{SourceArgs, offsets_compiler};

pub fn execute(source: &SourceArgs) -> Result<()> {
    let text = source.read()?;
    let config = source.offsets_config()?;
    let rendered = offsets_compiler(&config).render(&text);

    let Some(offsets) = rendered.extensions.get::<DocumentOffsets>() else {
        anyhow::bail!("Document offsets were not captured");
    };
    let json = serde_json::json!({
        "strategy": config.strategy,
        "lines": offsets.index().records(),
        "mutated": offsets.mutated_lines(),
        "restore": offsets.restore_map(),
    });

    let json = serde_json::to_string_pretty(&json).context("Failed to serialize index")?;
    println!("{json}");
    Ok(())
}
