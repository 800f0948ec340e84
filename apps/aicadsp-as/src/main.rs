mod args;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::args::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let listing = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let image = aicadsp_core::asm::assemble(&listing)?;
    let bytes = image.to_bytes();
    fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("packed {} bytes into {}", bytes.len(), args.output.display());
    Ok(())
}
