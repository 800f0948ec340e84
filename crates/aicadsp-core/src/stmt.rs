//! The statement grammar of the source language.
//!
//! ```text
//! stmt   := input | output | smode | stmem | ldmem | sttemp | mac
//! input  := "INPUT" src ":" int              src := "mems" | "mixer" | "cdda"
//! output := "OUTPUT" ("yreg" | "adrs" | "adrs/s" | "mixer:" int)
//! smode  := "SMODE" ("sat" | "trim" | "sat2" | "trim2")
//! sttemp := "ST" "[" "temp:" int "]"
//! stmem  := ("ST"|"STF") addr
//! ldmem  := ("LD"|"LDF") addr "," "mems:" int
//! mac    := "MAC" xarg "," yarg ("," barg)?
//! addr   := "["? "madrs:" int "+"? "/s"? "]"?   (brackets paired)
//! xarg   := "input" | "[" "temp:" int "]"
//! yarg   := ("shifted"|"yreg") ":" ("lo"|"hi") | "#" intlit
//! barg   := "-"? ("acc" | "[" "temp:" int "]")
//! ```
//!
//! Keywords are case-insensitive. A line that matches no rule is a syntax
//! error the caller may skip; a line that matches a rule but breaks a
//! hardware constraint aborts the whole compilation.

use crate::error::CompileError;
use crate::lexer::{parse_int, parse_uint};

/// Shifter/saturation mode as selected by `SMODE`, in its 2-bit hardware
/// encoding. `Trim` doubles as the "extract the low half of SHIFTED" mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftMode {
    #[default]
    Sat = 0,
    Sat2 = 1,
    Trim2 = 2,
    Trim = 3,
}

impl ShiftMode {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "sat" => Some(Self::Sat),
            "sat2" => Some(Self::Sat2),
            "trim2" => Some(Self::Trim2),
            "trim" => Some(Self::Trim),
            _ => None,
        }
    }

    pub const fn encode(self) -> u64 {
        self as u64
    }
}

/// The three banks an `INPUT` statement can select from. They occupy one
/// flat 64-entry space on the hardware side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBank {
    Mems,
    Mixer,
    Cdda,
}

impl InputBank {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "mems" => Some(Self::Mems),
            "mixer" => Some(Self::Mixer),
            "cdda" => Some(Self::Cdda),
            _ => None,
        }
    }

    pub const fn base(self) -> u8 {
        match self {
            Self::Mems => 0,
            Self::Mixer => 32,
            Self::Cdda => 48,
        }
    }

    pub const fn entries(self) -> u8 {
        match self {
            Self::Mems => 32,
            Self::Mixer => 16,
            Self::Cdda => 2,
        }
    }
}

/// A parsed memory operand: a MADRS slot plus its addressing-mode suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRef {
    /// Memory-address-RAM index (0-63).
    pub masa: u8,
    /// Bracketed form: offset is relative to the sample counter.
    pub relative: bool,
    /// `+` suffix: post-increment the offset.
    pub post_increment: bool,
    /// `/s` suffix: add the ADRS register to the offset.
    pub add_adrs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacX {
    Input,
    Temp(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacY {
    ShiftedLo,
    ShiftedHi,
    YregLo,
    YregHi,
    Coef(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacB {
    Acc { negate: bool },
    Temp { addr: u8, negate: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Input { bank: InputBank, index: u8 },
    OutputYreg,
    OutputAdrs,
    OutputAdrsShifted,
    OutputMixer { channel: u8 },
    Smode(ShiftMode),
    StoreTemp { addr: u8 },
    StoreMem { mem: MemRef, float: bool },
    LoadMem { mem: MemRef, mems: u8, float: bool },
    Mac { x: MacX, y: MacY, b: Option<MacB> },
}

impl Statement {
    /// Parses one statement line. `Ok(None)` means no rule matched; the
    /// caller reports the line and moves on.
    pub fn parse(raw: &str) -> Result<Option<Statement>, CompileError> {
        let text = raw.trim().to_ascii_lowercase();
        let (op, rest) = match text.split_once(char::is_whitespace) {
            Some((op, rest)) => (op, rest.trim()),
            None => (text.as_str(), ""),
        };

        match op {
            "input" => parse_input(rest, raw),
            "output" => parse_output(rest, raw),
            "smode" => Ok(ShiftMode::from_token(rest).map(Statement::Smode)),
            "st" | "stf" => parse_store(op == "stf", rest, raw),
            "ld" | "ldf" => parse_load(op == "ldf", rest, raw),
            "mac" => parse_mac(rest, raw),
            _ => Ok(None),
        }
    }
}

fn parse_input(rest: &str, raw: &str) -> Result<Option<Statement>, CompileError> {
    let Some((bank_token, index_token)) = rest.split_once(':') else {
        return Ok(None);
    };
    let Some(bank) = InputBank::from_token(bank_token.trim()) else {
        return Ok(None);
    };
    let Some(index) = parse_uint(index_token.trim()) else {
        return Ok(None);
    };
    if index >= u64::from(bank.entries()) {
        return Err(CompileError::invalid(raw));
    }
    Ok(Some(Statement::Input {
        bank,
        index: index as u8,
    }))
}

fn parse_output(rest: &str, raw: &str) -> Result<Option<Statement>, CompileError> {
    match rest {
        "yreg" => return Ok(Some(Statement::OutputYreg)),
        "adrs" => return Ok(Some(Statement::OutputAdrs)),
        "adrs/s" => return Ok(Some(Statement::OutputAdrsShifted)),
        _ => {}
    }
    let Some((target, channel_token)) = rest.split_once(':') else {
        return Ok(None);
    };
    if target.trim() != "mixer" {
        return Ok(None);
    }
    let Some(channel) = parse_uint(channel_token.trim()) else {
        return Ok(None);
    };
    if channel >= 16 {
        return Err(CompileError::invalid(raw));
    }
    Ok(Some(Statement::OutputMixer {
        channel: channel as u8,
    }))
}

fn parse_store(float: bool, rest: &str, raw: &str) -> Result<Option<Statement>, CompileError> {
    // Plain `ST` also covers the temp-RAM store form.
    if !float && let Some(addr) = parse_temp_ref(rest) {
        if addr >= 128 {
            return Err(CompileError::invalid(raw));
        }
        return Ok(Some(Statement::StoreTemp { addr: addr as u8 }));
    }
    let Some(mem) = parse_mem_ref(rest, raw)? else {
        return Ok(None);
    };
    Ok(Some(Statement::StoreMem { mem, float }))
}

fn parse_load(float: bool, rest: &str, raw: &str) -> Result<Option<Statement>, CompileError> {
    let Some((addr_token, dest_token)) = rest.split_once(',') else {
        return Ok(None);
    };
    let Some(mem) = parse_mem_ref(addr_token.trim(), raw)? else {
        return Ok(None);
    };
    let dest = dest_token.trim();
    let Some(index_token) = dest.strip_prefix("mems") else {
        return Ok(None);
    };
    let Some(index_token) = index_token.trim_start().strip_prefix(':') else {
        return Ok(None);
    };
    let Some(mems) = parse_uint(index_token.trim()) else {
        return Ok(None);
    };
    if mems >= 32 {
        return Err(CompileError::invalid(raw));
    }
    Ok(Some(Statement::LoadMem {
        mem,
        mems: mems as u8,
        float,
    }))
}

fn parse_mac(rest: &str, raw: &str) -> Result<Option<Statement>, CompileError> {
    let args: Vec<&str> = rest.split(',').map(str::trim).collect();
    if args.len() < 2 || args.len() > 3 {
        return Ok(None);
    }

    let x = if args[0] == "input" {
        MacX::Input
    } else if let Some(addr) = parse_temp_ref(args[0]) {
        if addr >= 128 {
            return Err(CompileError::invalid(raw));
        }
        MacX::Temp(addr as u8)
    } else {
        return Ok(None);
    };

    let y = match args[1] {
        "shifted:lo" => MacY::ShiftedLo,
        "shifted:hi" => MacY::ShiftedHi,
        "yreg:lo" => MacY::YregLo,
        "yreg:hi" => MacY::YregHi,
        other => {
            let Some(imm) = other.strip_prefix('#').and_then(parse_int) else {
                return Ok(None);
            };
            MacY::Coef(imm)
        }
    };

    let b = match args.get(2) {
        None => None,
        Some(&arg) => {
            let (negate, body) = match arg.strip_prefix('-') {
                Some(body) => (true, body.trim_start()),
                None => (false, arg),
            };
            if body == "acc" {
                Some(MacB::Acc { negate })
            } else if let Some(addr) = parse_temp_ref(body) {
                if addr >= 128 {
                    return Err(CompileError::invalid(raw));
                }
                Some(MacB::Temp {
                    addr: addr as u8,
                    negate,
                })
            } else {
                return Ok(None);
            }
        }
    };

    // X and B share the single temp-RAM read port.
    if let (MacX::Temp(x_addr), Some(MacB::Temp { addr: b_addr, .. })) = (x, &b)
        && x_addr != *b_addr
    {
        return Err(CompileError::invalid(raw));
    }

    Ok(Some(Statement::Mac { x, y, b }))
}

/// `[temp:<n>]` → `n`. Purely structural; range checking is the caller's.
fn parse_temp_ref(s: &str) -> Option<u64> {
    let inner = s.strip_prefix('[')?.strip_suffix(']')?.trim();
    let index = inner.strip_prefix("temp")?.trim_start().strip_prefix(':')?;
    parse_uint(index.trim())
}

/// `addr := "["? "madrs:" int "+"? "/s"? "]"?`; both suffixes tolerate
/// leading whitespace. Mismatched brackets and out-of-range slots are fatal.
fn parse_mem_ref(s: &str, raw: &str) -> Result<Option<MemRef>, CompileError> {
    let (inner, relative) = match (s.strip_prefix('['), s.ends_with(']')) {
        (Some(inner), true) => (inner[..inner.len() - 1].trim(), true),
        (None, false) => (s, false),
        _ => return Err(CompileError::invalid(raw)),
    };

    let Some(after) = inner.strip_prefix("madrs") else {
        return Ok(None);
    };
    let Some(after) = after.trim_start().strip_prefix(':') else {
        return Ok(None);
    };
    let after = after.trim_start();

    let literal_end = after
        .find(|c: char| c.is_whitespace() || c == '+' || c == '/')
        .unwrap_or(after.len());
    let (literal, suffixes) = after.split_at(literal_end);
    let Some(masa) = parse_uint(literal) else {
        return Ok(None);
    };

    let mut suffixes = suffixes.trim_start();
    let post_increment = match suffixes.strip_prefix('+') {
        Some(rest) => {
            suffixes = rest.trim_start();
            true
        }
        None => false,
    };
    let add_adrs = match suffixes.strip_prefix("/s") {
        Some(rest) => {
            suffixes = rest.trim_start();
            true
        }
        None => false,
    };
    if !suffixes.is_empty() {
        return Ok(None);
    }

    if masa >= 64 {
        return Err(CompileError::invalid(raw));
    }
    Ok(Some(MemRef {
        masa: masa as u8,
        relative,
        post_increment,
        add_adrs,
    }))
}
