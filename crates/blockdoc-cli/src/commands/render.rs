//! `blockdoc render`: HTML with offset attributes.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use blockdoc_core::{Compiler, html};

use super::{SourceArgs, offsets_compiler};

pub fn execute(source: &SourceArgs, no_offsets: bool) -> Result<()> {
    let text = source.read()?;
    let compiler = if no_offsets {
        Compiler::with_defaults()
    } else {
        offsets_compiler(&source.offsets_config()?)
    };

    let rendered = compiler.render(&text);
    debug!(
        file = %source.file.display(),
        elements = rendered.tree.len() - 1,
        "Rendered document"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", html::to_html(&rendered.tree)).context("Failed to write HTML")?;
    Ok(())
}
