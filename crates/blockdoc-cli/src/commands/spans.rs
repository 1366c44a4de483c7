//! `blockdoc spans`: annotated elements as JSON.

use anyhow::{Context, Result};
use serde::Serialize;

use blockdoc_offsets::collect_spans;

use super::{SourceArgs, offsets_compiler};

#[derive(Debug, Serialize)]
struct SpanRecord<'a> {
    tag: String,
    start: usize,
    end: usize,
    start_accurate: Option<bool>,
    end_accurate: Option<bool>,
    /// Source text under the range
    text: &'a str,
}

pub fn execute(source: &SourceArgs) -> Result<()> {
    let text = source.read()?;
    let config = source.offsets_config()?;
    let rendered = offsets_compiler(&config).render(&text);

    let records: Vec<SpanRecord> = collect_spans(&rendered.tree, &config.attribute_prefix)
        .into_iter()
        .map(|span| SpanRecord {
            text: text.get(span.start..span.end).unwrap_or_default(),
            tag: span.tag,
            start: span.start,
            end: span.end,
            start_accurate: span.start_accurate,
            end_accurate: span.end_accurate,
        })
        .collect();

    let json = serde_json::to_string_pretty(&records).context("Failed to serialize spans")?;
    println!("{json}");
    Ok(())
}
