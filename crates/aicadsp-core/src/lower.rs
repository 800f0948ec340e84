//! Lowering of parsed statements into microcode steps.
//!
//! The lowerer owns the growing step list plus the two latched modes that
//! statements set for their successors: the current input selector
//! (`INPUT`) and the current shift mode (`SMODE`). Apart from `MAC`, every
//! step-producing statement starts from [`Step::DUMMY_ACC`] and ORs its
//! fields in, so the accumulator survives it.

use crate::step::{self, Step, StepFlags};
use crate::stmt::{MacB, MacX, MacY, MemRef, ShiftMode, Statement};

/// Everything one compilation run accumulates before the peephole passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub steps: Vec<Step>,
    /// Coefficient per step, already shifted into the top 13 bits; 0 where
    /// the step has none.
    pub coefs: Vec<i16>,
    /// Verbatim `MADRS[n] = <int>` lines from the source.
    pub madrs: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Lowerer {
    program: Program,
    /// Latched input selector (`INPUT`), a flat 6-bit index.
    imode: u8,
    /// Latched shift mode (`SMODE`).
    smode: ShiftMode,
}

impl Lowerer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_madrs(&mut self, line: &str) {
        self.program.madrs.push(line.to_string());
    }

    pub fn apply(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Input { bank, index } => {
                self.imode = bank.base() + index;
            }
            Statement::Smode(mode) => {
                self.smode = *mode;
            }
            Statement::OutputYreg => {
                self.push(
                    Step::DUMMY_ACC
                        .with_field(step::IRA, self.imode.into())
                        .with(StepFlags::YRL),
                );
            }
            Statement::OutputAdrs => {
                if self.smode == ShiftMode::Trim {
                    // ADRL wants the shifter's saturated output, which the
                    // shifted-lo encoding would displace; take two steps.
                    self.push(
                        Step::DUMMY_ACC
                            .with_field(step::SHIFT, self.smode.encode())
                            .with(StepFlags::ADRL),
                    );
                    self.push(
                        Step::DUMMY_ACC
                            .with_field(step::IRA, self.imode.into())
                            .with(StepFlags::ADRL),
                    );
                } else {
                    self.push(
                        Step::DUMMY_ACC
                            .with_field(step::IRA, self.imode.into())
                            .with_field(step::SHIFT, self.smode.encode())
                            .with(StepFlags::ADRL),
                    );
                }
            }
            Statement::OutputAdrsShifted => {
                self.push(
                    Step::DUMMY_ACC
                        .with_field(step::IRA, self.imode.into())
                        .with_field(step::SHIFT, ShiftMode::Trim.encode())
                        .with(StepFlags::ADRL),
                );
            }
            Statement::OutputMixer { channel } => {
                self.push(
                    Step::DUMMY_ACC
                        .with(StepFlags::EWT)
                        .with_field(step::EWA, u64::from(*channel))
                        .with_field(step::SHIFT, self.smode.encode()),
                );
            }
            Statement::StoreTemp { addr } => {
                self.push(
                    Step::DUMMY_ACC
                        .with_field(step::SHIFT, self.smode.encode())
                        .with(StepFlags::TWT)
                        .with_field(step::TWA, u64::from(*addr)),
                );
            }
            Statement::StoreMem { mem, float } => {
                self.align_memory();
                let word = Step::DUMMY_ACC
                    .with_field(step::SHIFT, self.smode.encode())
                    .with(StepFlags::MWT);
                self.push(with_mem_ref(word, mem, *float));
            }
            Statement::LoadMem { mem, mems, float } => {
                self.align_memory();
                self.push(with_mem_ref(
                    Step::DUMMY_ACC.with(StepFlags::MRD),
                    mem,
                    *float,
                ));
                // The value read at step i crosses the memory pipeline and
                // lands in MEMS two steps later.
                self.push(Step::DUMMY_ACC);
                self.push(
                    Step::DUMMY_ACC
                        .with(StepFlags::IWT)
                        .with_field(step::IWA, u64::from(*mems)),
                );
            }
            Statement::Mac { x, y, b } => self.mac(*x, *y, *b),
        }
    }

    fn mac(&mut self, x: MacX, y: MacY, b: Option<MacB>) {
        let mut word = Step::default();
        let mut coef = 0i16;

        match x {
            MacX::Input => {
                word = word
                    .with(StepFlags::XSEL)
                    .with_field(step::IRA, self.imode.into());
            }
            MacX::Temp(addr) => {
                word = word.with_field(step::TRA, u64::from(addr));
            }
        }

        match y {
            MacY::YregHi => word = word.with_field(step::YSEL, 2),
            MacY::YregLo => word = word.with_field(step::YSEL, 3),
            // YSEL 0 selects the fractional latch, loaded one step earlier.
            MacY::ShiftedHi => self.push(Step::DUMMY_ACC.with(StepFlags::FRCL)),
            MacY::ShiftedLo => self.push(
                Step::DUMMY_ACC
                    .with(StepFlags::FRCL)
                    .with_field(step::SHIFT, ShiftMode::Trim.encode()),
            ),
            MacY::Coef(imm) => {
                word = word.with_field(step::YSEL, 1);
                // COEF is a 13-bit value stored in the top of a 16-bit word.
                coef = (imm << 3) as i16;
            }
        }

        match b {
            None => word = word.with(StepFlags::ZERO),
            Some(MacB::Acc { negate }) => {
                word = word.with(StepFlags::BSEL);
                if negate {
                    word = word.with(StepFlags::NEGB);
                }
            }
            Some(MacB::Temp { addr, negate }) => {
                word = word.with_field(step::TRA, u64::from(addr));
                if negate {
                    word = word.with(StepFlags::NEGB);
                }
            }
        }

        self.push_with_coef(word, coef);
    }

    /// Memory accesses must sit on odd step indices; pad with a no-op when
    /// the next slot would be even.
    fn align_memory(&mut self) {
        if self.program.steps.len() % 2 == 0 {
            self.push(Step::DUMMY_ACC);
        }
    }

    fn push(&mut self, word: Step) {
        self.push_with_coef(word, 0);
    }

    fn push_with_coef(&mut self, word: Step, coef: i16) {
        self.program.steps.push(word);
        self.program.coefs.push(coef);
    }

    pub fn finish(self) -> Program {
        self.program
    }
}

fn with_mem_ref(word: Step, mem: &MemRef, float: bool) -> Step {
    let mut word = word.with_field(step::MASA, u64::from(mem.masa));
    if !mem.relative {
        word = word.with(StepFlags::TABLE);
    }
    if mem.add_adrs {
        word = word.with(StepFlags::ADREB);
    }
    if mem.post_increment {
        word = word.with(StepFlags::NXADR);
    }
    if !float {
        word = word.with(StepFlags::NOFL);
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::InputBank;

    fn lower(lines: &[&str]) -> Program {
        let mut lowerer = Lowerer::new();
        for line in lines {
            let stmt = Statement::parse(line)
                .expect("statement parses")
                .expect("statement matches a rule");
            lowerer.apply(&stmt);
        }
        lowerer.finish()
    }

    #[test]
    fn input_latches_without_emitting() {
        let program = lower(&["INPUT mixer:3"]);
        assert!(program.steps.is_empty());
    }

    #[test]
    fn output_yreg_reads_the_latched_input() {
        let program = lower(&["INPUT mems:5", "OUTPUT yreg"]);
        assert_eq!(program.steps.len(), 1);
        let word = program.steps[0];
        assert_eq!(word.field(step::IRA), 5);
        assert!(word.contains(StepFlags::YRL));
        assert_eq!(
            word.bits(),
            Step::DUMMY_ACC
                .with_field(step::IRA, 5)
                .with(StepFlags::YRL)
                .bits()
        );
    }

    #[test]
    fn input_banks_map_onto_one_selector_space() {
        let program = lower(&["INPUT cdda:1", "OUTPUT yreg"]);
        assert_eq!(program.steps[0].field(step::IRA), 49);
        assert_eq!(InputBank::Mixer.base(), 32);
    }

    #[test]
    fn output_adrs_splits_under_trim() {
        let program = lower(&["SMODE trim", "OUTPUT adrs"]);
        assert_eq!(program.steps.len(), 2);
        assert_eq!(
            program.steps[0],
            Step::DUMMY_ACC
                .with_field(step::SHIFT, 3)
                .with(StepFlags::ADRL)
        );
        assert_eq!(
            program.steps[1],
            Step::DUMMY_ACC.with(StepFlags::ADRL)
        );

        let plain = lower(&["SMODE sat2", "OUTPUT adrs"]);
        assert_eq!(plain.steps.len(), 1);
        assert_eq!(plain.steps[0].field(step::SHIFT), 1);
        assert!(plain.steps[0].contains(StepFlags::ADRL));
    }

    #[test]
    fn output_adrs_shifted_is_the_one_step_form() {
        let program = lower(&["OUTPUT adrs/s"]);
        assert_eq!(program.steps.len(), 1);
        assert_eq!(program.steps[0].field(step::SHIFT), 3);
        assert!(program.steps[0].contains(StepFlags::ADRL));
    }

    #[test]
    fn output_mixer_uses_the_latched_shift_mode() {
        let program = lower(&["SMODE trim2", "OUTPUT mixer:9"]);
        let word = program.steps[0];
        assert!(word.contains(StepFlags::EWT));
        assert_eq!(word.field(step::EWA), 9);
        assert_eq!(word.field(step::SHIFT), 2);
    }

    #[test]
    fn store_temp_writes_through_the_shifter() {
        let program = lower(&["ST [temp:100]"]);
        let word = program.steps[0];
        assert!(word.contains(StepFlags::TWT));
        assert_eq!(word.field(step::TWA), 100);
    }

    #[test]
    fn memory_store_lands_on_an_odd_step() {
        let program = lower(&["ST madrs:7"]);
        assert_eq!(program.steps.len(), 2);
        assert!(program.steps[0].is_dummy_acc());
        let word = program.steps[1];
        assert!(word.contains(StepFlags::MWT | StepFlags::TABLE | StepFlags::NOFL));
        assert_eq!(word.field(step::MASA), 7);

        // An odd next slot needs no padding.
        let aligned = lower(&["OUTPUT yreg", "STF [madrs:3+]"]);
        assert_eq!(aligned.steps.len(), 2);
        let word = aligned.steps[1];
        assert!(word.contains(StepFlags::MWT | StepFlags::NXADR));
        assert!(!word.contains(StepFlags::TABLE));
        assert!(!word.contains(StepFlags::NOFL));
    }

    #[test]
    fn memory_load_emits_the_read_triplet() {
        let program = lower(&["OUTPUT yreg", "LDF madrs:7, mems:3"]);
        assert_eq!(program.steps.len(), 4);
        let read = program.steps[1];
        assert!(read.contains(StepFlags::MRD | StepFlags::TABLE));
        assert!(!read.contains(StepFlags::NOFL));
        assert_eq!(read.field(step::MASA), 7);
        assert!(program.steps[2].is_dummy_acc());
        let write = program.steps[3];
        assert!(write.contains(StepFlags::IWT));
        assert_eq!(write.field(step::IWA), 3);
    }

    #[test]
    fn mac_with_coefficient() {
        let program = lower(&["INPUT mems:1", "MAC input, #0x10"]);
        assert_eq!(program.steps.len(), 1);
        let word = program.steps[0];
        assert!(word.contains(StepFlags::XSEL | StepFlags::ZERO));
        assert_eq!(word.field(step::IRA), 1);
        assert_eq!(word.field(step::YSEL), 1);
        assert!(!word.contains(StepFlags::BSEL));
        assert_eq!(program.coefs[0], 0x80);
    }

    #[test]
    fn mac_negative_coefficient_keeps_the_shifted_encoding() {
        let program = lower(&["MAC input, #-1"]);
        assert_eq!(program.coefs[0], -8);
    }

    #[test]
    fn mac_shifted_lo_latches_the_fraction_first() {
        let program = lower(&["MAC input, shifted:lo"]);
        assert_eq!(program.steps.len(), 2);
        assert_eq!(
            program.steps[0],
            Step::DUMMY_ACC
                .with(StepFlags::FRCL)
                .with_field(step::SHIFT, 3)
        );
        let word = program.steps[1];
        assert!(word.contains(StepFlags::XSEL | StepFlags::ZERO));
        assert_eq!(word.field(step::YSEL), 0);
        assert!(!word.contains(StepFlags::BSEL));
    }

    #[test]
    fn mac_shifted_hi_skips_the_low_extraction() {
        let program = lower(&["MAC [temp:2], shifted:hi, acc"]);
        assert_eq!(program.steps.len(), 2);
        assert_eq!(program.steps[0], Step::DUMMY_ACC.with(StepFlags::FRCL));
        let word = program.steps[1];
        assert_eq!(word.field(step::TRA), 2);
        assert!(word.contains(StepFlags::BSEL));
        assert!(!word.contains(StepFlags::ZERO));
    }

    #[test]
    fn mac_b_operand_forms() {
        let none = lower(&["MAC input, yreg:hi"]).steps[0];
        assert!(none.contains(StepFlags::ZERO));
        assert!(!none.intersects(StepFlags::BSEL | StepFlags::NEGB));
        assert_eq!(none.field(step::YSEL), 2);

        let neg_acc = lower(&["MAC input, yreg:lo, -acc"]).steps[0];
        assert!(neg_acc.contains(StepFlags::BSEL | StepFlags::NEGB));
        assert!(!neg_acc.contains(StepFlags::ZERO));
        assert_eq!(neg_acc.field(step::YSEL), 3);

        let temp_b = lower(&["MAC input, yreg:hi, [temp:6]"]).steps[0];
        assert!(!temp_b.intersects(StepFlags::BSEL | StepFlags::ZERO));
        assert_eq!(temp_b.field(step::TRA), 6);
    }

    #[test]
    fn smode_latches_across_statements() {
        let program = lower(&["SMODE sat2", "ST [temp:1]", "ST [temp:2]"]);
        assert_eq!(program.steps[0].field(step::SHIFT), 1);
        assert_eq!(program.steps[1].field(step::SHIFT), 1);
    }
}
