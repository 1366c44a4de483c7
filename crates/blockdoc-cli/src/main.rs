//! blockdoc CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "blockdoc")]
#[command(version)]
#[command(about = "Render block documents with original-source offsets", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document to HTML with offset attributes
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Render without the offsets layer
        #[arg(long)]
        no_offsets: bool,
    },

    /// Print every annotated element as JSON
    Spans {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the original line index and the restore map as JSON
    Index {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let default_filter = if cli.verbose {
        "blockdoc=debug"
    } else {
        "blockdoc=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render { source, no_offsets } => commands::render::execute(&source, no_offsets),
        Commands::Spans { source } => commands::spans::execute(&source),
        Commands::Index { source } => commands::index::execute(&source),
    }
}
