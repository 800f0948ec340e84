//! Compiler and assembler for the AICA sound DSP.
//!
//! The DSP runs a straight-line microcode of 128 64-bit steps once per
//! audio sample. [`compile`] turns the high-level effect language into an
//! assembler-level listing; [`asm::assemble`] packs such a listing into the
//! binary [`image::DspImage`] the hardware consumes.

pub mod asm;
pub mod compile;
pub mod emit;
pub mod error;
pub mod image;
pub mod lexer;
pub mod lower;
pub mod opt;
pub mod step;
pub mod stmt;

pub use compile::{Compilation, compile};
pub use error::{AsmError, CompileError};
pub use image::DspImage;
pub use lower::Program;
pub use step::Step;
