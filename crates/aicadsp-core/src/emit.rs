//! Emission of the assembler-level listing.

use std::fmt::Write;

use crate::lower::Program;
use crate::step::FIELD_ORDER;

/// Renders a program as one directive per line: the verbatim MADRS
/// definitions, then for each step an optional `COEF[i]` line and an
/// `MPRO[i]` line naming every non-zero field in canonical order.
pub fn listing(program: &Program) -> String {
    let mut out = String::new();
    for def in &program.madrs {
        let _ = writeln!(out, "{def}");
    }
    for (i, (word, coef)) in program.steps.iter().zip(&program.coefs).enumerate() {
        if *coef != 0 {
            let _ = writeln!(out, "COEF[{i}] = {coef}");
        }
        let _ = write!(out, "MPRO[{i}] =");
        for (name, kind) in FIELD_ORDER {
            let value = kind.extract(word.bits());
            if value == 0 {
                continue;
            }
            if kind.width() == 1 {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(out, " {name}:{value}");
            }
        }
        let _ = writeln!(out);
    }
    out
}
