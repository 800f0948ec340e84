//! Peephole passes over the lowered step list.
//!
//! Order matters: loads are hoisted first (their setup steps would otherwise
//! pin the no-ops around them), then no-ops trickle toward the end, then
//! adjacent no-op pairs are dropped. Dropping in pairs is what keeps every
//! memory access on an odd index.

use crate::lower::Program;
use crate::step::{self, Step, StepFlags};

/// Fields that constitute a memory-read setup, moved as one unit.
const READ_SETUP_MASK: u64 = StepFlags::MRD
    .union(StepFlags::TABLE)
    .union(StepFlags::ADREB)
    .union(StepFlags::NXADR)
    .union(StepFlags::NOFL)
    .bits()
    | step::MASA.mask();

/// Fields that constitute the matching MEMS write.
const MEMS_WRITE_MASK: u64 = StepFlags::IWT.bits() | step::IWA.mask();

/// Hoists memory-read setups backward so the three-step read latency
/// overlaps earlier work instead of stalling behind it.
///
/// A load occupies steps `i` (MRD), `i+1` and `i+2` (IWT into MEMS). The
/// setup may move to any earlier odd step `c` as long as nothing between
/// `c` and `i`:
/// - already writes MEMS (one read may be in flight at a time), or
/// - reads INPUTS through the MEMS register this load overwrites, or
/// - performs a memory write at the target slot (`MWT` clash; slide forward
///   by 2 past those).
///
/// The MEMS write moves along to `c+2`, keeping the read-to-write distance.
pub fn hoist_loads(program: &mut Program) {
    let steps = &mut program.steps;
    for i in 3..steps.len() {
        let word = steps[i];
        if !word.contains(StepFlags::MRD) || word.contains(StepFlags::IWT) {
            continue;
        }
        let Some(write) = steps.get(i + 2).copied() else {
            continue;
        };
        let mems = write.field(step::IWA);

        let mut c = i - 1;
        while c > 2 {
            let scanned = steps[c];
            if scanned.contains(StepFlags::IWT) {
                break;
            }
            if scanned.intersects(StepFlags::ADRL | StepFlags::YRL | StepFlags::XSEL)
                && scanned.field(step::IRA) == mems
            {
                break;
            }
            c -= 1;
        }
        c |= 1;
        while steps[c].contains(StepFlags::MWT) {
            c += 2;
        }
        if c >= i {
            continue;
        }

        let setup = steps[i].bits() & READ_SETUP_MASK;
        steps[c] = Step::from_bits(steps[c].bits() | setup);
        steps[i] = Step::from_bits(steps[i].bits() & !READ_SETUP_MASK);
        let mems_write = steps[i + 2].bits() & MEMS_WRITE_MASK;
        steps[c + 2] = Step::from_bits(steps[c + 2].bits() | mems_write);
        steps[i + 2] = Step::from_bits(steps[i + 2].bits() & !MEMS_WRITE_MASK);
    }
}

/// Bubbles useful steps downward past no-ops until nothing moves.
///
/// Memory-touching steps stay pinned to their slots; everything else may
/// swap with a preceding coefficient-free no-op. Sweeps run from the end of
/// the program toward the start so one sweep can carry a step across a whole
/// run of no-ops.
pub fn trickle_nops(program: &mut Program) {
    let pinned = StepFlags::MWT | StepFlags::MRD | StepFlags::IWT;
    loop {
        let mut moved = false;
        for i in (1..program.steps.len()).rev() {
            let word = program.steps[i];
            if word.is_dummy_acc() || word.intersects(pinned) {
                continue;
            }
            if program.steps[i - 1].is_dummy_acc() && program.coefs[i - 1] == 0 {
                program.steps.swap(i - 1, i);
                program.coefs.swap(i - 1, i);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// Deletes adjacent pairs of coefficient-free no-ops, scanning backward with
/// a one-step lookbehind. Only ever removing two at a time preserves the
/// parity of every remaining step.
pub fn drop_nop_pairs(program: &mut Program) {
    let mut behind_nop = false;
    let mut i = program.steps.len();
    while i > 0 {
        i -= 1;
        let nop = program.steps[i].is_dummy_acc() && program.coefs[i] == 0;
        if nop && behind_nop {
            program.steps.drain(i..i + 2);
            program.coefs.drain(i..i + 2);
            behind_nop = false;
        } else {
            behind_nop = nop;
        }
    }
}
