use std::path::PathBuf;

use clap::Parser;

/// AICA DSP effect compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the effect source file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Path for the assembler-level listing
    #[arg(required = true)]
    pub output: PathBuf,

    /// Run the source through the C preprocessor (cpp -P) first
    #[arg(long)]
    pub preprocess: bool,

    /// Log the compiler's internal phases
    #[arg(long)]
    pub verbose: bool,
}
