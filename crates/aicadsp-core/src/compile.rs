//! The compiler pipeline: classify lines, lower statements, run the
//! peephole passes, emit the listing.

use tracing::{debug, error};

use crate::error::CompileError;
use crate::lexer::{self, Line};
use crate::lower::{Lowerer, Program};
use crate::stmt::Statement;
use crate::{emit, opt};

/// The result of one compilation run.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The optimized program tables.
    pub program: Program,
    /// The assembler-level listing.
    pub listing: String,
    /// Lines that matched no statement rule. They produce no output; the
    /// caller decides whether that fails the run.
    pub unhandled: Vec<String>,
}

/// Compiles a source text end to end. Semantic violations abort with an
/// error; purely syntactic misses are collected in
/// [`Compilation::unhandled`] and reported as they are found.
pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    let mut lowerer = Lowerer::new();
    let mut unhandled = Vec::new();

    for raw in source.lines() {
        match lexer::classify(raw) {
            Line::Blank | Line::Comment => {}
            Line::Madrs(def) => lowerer.define_madrs(def),
            Line::Statement(text) => match Statement::parse(text)? {
                Some(stmt) => lowerer.apply(&stmt),
                None => {
                    error!("Unhandled instruction: {text}");
                    unhandled.push(text.to_string());
                }
            },
        }
    }

    let mut program = lowerer.finish();
    let lowered = program.steps.len();
    opt::hoist_loads(&mut program);
    opt::trickle_nops(&mut program);
    opt::drop_nop_pairs(&mut program);
    debug!(lowered, optimized = program.steps.len(), "compiled program");

    let listing = emit::listing(&program);
    Ok(Compilation {
        program,
        listing,
        unhandled,
    })
}
