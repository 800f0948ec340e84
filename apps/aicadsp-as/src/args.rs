use std::path::PathBuf;

use clap::Parser;

/// AICA DSP microcode assembler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the assembler-level listing
    #[arg(required = true)]
    pub input: PathBuf,

    /// Path for the packed binary image
    #[arg(required = true)]
    pub output: PathBuf,
}
