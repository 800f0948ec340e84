mod args;

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::args::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let source = if args.preprocess {
        preprocess(&args.input)?
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?
    };

    let result = aicadsp_core::compile(&source)?;
    fs::write(&args.output, &result.listing)
        .with_context(|| format!("writing {}", args.output.display()))?;

    // The offending lines were already reported as they were found.
    if !result.unhandled.is_empty() {
        bail!("{} unhandled instruction(s)", result.unhandled.len());
    }
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn preprocess(input: &Path) -> Result<String> {
    let output = Command::new("cpp")
        .arg("-P")
        .arg(input)
        .output()
        .context("spawning cpp")?;
    if !output.status.success() {
        bail!("cpp exited with {}", output.status);
    }
    String::from_utf8(output.stdout).context("cpp produced invalid UTF-8")
}
