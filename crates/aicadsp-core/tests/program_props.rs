//! Property tests: any well-formed source must compile into a program that
//! honors the hardware contract, whatever the peepholes rearranged.

use aicadsp_core::lower::Program;
use aicadsp_core::step::{self, StepFlags};
use aicadsp_core::{asm, compile, opt};
use proptest::prelude::*;

fn smode() -> impl Strategy<Value = String> {
    prop_oneof![Just("sat"), Just("sat2"), Just("trim"), Just("trim2")]
        .prop_map(|mode| format!("SMODE {mode}"))
}

fn input() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..32).prop_map(|i| format!("INPUT mems:{i}")),
        (0u8..16).prop_map(|i| format!("INPUT mixer:{i}")),
        (0u8..2).prop_map(|i| format!("INPUT cdda:{i}")),
    ]
}

fn output() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("OUTPUT yreg".to_string()),
        Just("OUTPUT adrs".to_string()),
        Just("OUTPUT adrs/s".to_string()),
        (0u8..16).prop_map(|n| format!("OUTPUT mixer:{n}")),
    ]
}

fn mem_address() -> impl Strategy<Value = String> {
    (0u8..64, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(masa, bracketed, increment, add_adrs)| {
            let mut addr = format!("madrs:{masa}");
            if increment {
                addr.push('+');
            }
            if add_adrs {
                addr.push_str("/s");
            }
            if bracketed {
                format!("[{addr}]")
            } else {
                addr
            }
        },
    )
}

fn store() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..128).prop_map(|n| format!("ST [temp:{n}]")),
        (mem_address(), any::<bool>())
            .prop_map(|(addr, float)| format!("{} {addr}", if float { "STF" } else { "ST" })),
    ]
}

fn load() -> impl Strategy<Value = String> {
    (mem_address(), 0u8..32, any::<bool>())
        .prop_map(|(addr, mems, float)| {
            format!("{} {addr}, mems:{mems}", if float { "LDF" } else { "LD" })
        })
}

fn mac() -> impl Strategy<Value = String> {
    let x = prop_oneof![
        Just(None::<u8>),
        (0u8..128).prop_map(Some),
    ];
    let y = prop_oneof![
        Just("shifted:lo".to_string()),
        Just("shifted:hi".to_string()),
        Just("yreg:lo".to_string()),
        Just("yreg:hi".to_string()),
        (-4096i32..4096).prop_map(|imm| format!("#{imm}")),
    ];
    (x, y, 0u8..3, any::<bool>(), 0u8..128).prop_map(|(temp_x, y, b_kind, negate, temp_b)| {
        let x = match temp_x {
            None => "input".to_string(),
            Some(addr) => format!("[temp:{addr}]"),
        };
        let sign = if negate { "-" } else { "" };
        match b_kind {
            0 => format!("MAC {x}, {y}"),
            1 => format!("MAC {x}, {y}, {sign}acc"),
            // Both sides share one temp read port, so B mirrors X's slot.
            _ => {
                let addr = temp_x.unwrap_or(temp_b);
                format!("MAC {x}, {y}, {sign}[temp:{addr}]")
            }
        }
    })
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => input(),
        2 => output(),
        1 => smode(),
        2 => store(),
        2 => load(),
        3 => mac(),
    ]
}

fn source() -> impl Strategy<Value = String> {
    // A statement lowers to at most four steps, so 24 of them always fit
    // the 128-step program RAM.
    prop::collection::vec(statement(), 0..24).prop_map(|lines| {
        let mut text = String::from("# generated\n");
        for line in lines {
            text.push_str(&line);
            text.push('\n');
        }
        text
    })
}

fn assert_contract(program: &Program) {
    let steps = &program.steps;
    assert_eq!(steps.len(), program.coefs.len());

    for (i, word) in steps.iter().enumerate() {
        assert_eq!(
            word.bits() & step::RESERVED_MASK,
            0,
            "reserved bits set at step {i}"
        );
        if word.is_memory_access() {
            assert_eq!(i % 2, 1, "memory access at even step {i}");
        }
        if word.contains(StepFlags::MRD) {
            let write = steps.get(i + 2).unwrap_or_else(|| {
                panic!("read at step {i} has no landing step");
            });
            assert!(
                write.contains(StepFlags::IWT),
                "read at step {i} lost its MEMS write"
            );
        }
    }

    for i in 1..steps.len() {
        let free_nop =
            |j: usize| steps[j].is_dummy_acc() && program.coefs[j] == 0;
        assert!(
            !(free_nop(i - 1) && free_nop(i)),
            "adjacent no-op pair left at {}..{}",
            i - 1,
            i
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn compiled_programs_uphold_the_hardware_contract(src in source()) {
        let result = compile(&src).expect("generated source compiles");
        prop_assert!(result.unhandled.is_empty(), "generator produced junk: {:?}", result.unhandled);
        assert_contract(&result.program);
    }

    #[test]
    fn nop_passes_are_a_fixed_point(src in source()) {
        let result = compile(&src).expect("generated source compiles");
        let mut again = result.program.clone();
        opt::trickle_nops(&mut again);
        prop_assert_eq!(&again, &result.program, "trickle moved steps on a second pass");
        opt::drop_nop_pairs(&mut again);
        prop_assert_eq!(&again, &result.program, "drop removed steps on a second pass");
    }

    #[test]
    fn listings_assemble_back_to_the_compiled_tables(src in source()) {
        let result = compile(&src).expect("generated source compiles");
        prop_assert!(result.program.steps.len() <= aicadsp_core::image::MPRO_LEN);
        let image = asm::assemble(&result.listing).expect("listing assembles");
        for (i, word) in result.program.steps.iter().enumerate() {
            prop_assert_eq!(image.mpro[i], word.bits(), "MPRO[{}] diverged", i);
            prop_assert_eq!(image.coef[i], result.program.coefs[i], "COEF[{}] diverged", i);
        }
    }
}
