//! 64-bit microcode step words.
//!
//! Every program step drives all hardware lanes of the DSP at once. The
//! word layout, MSB first:
//!
//! ```text
//! 63-57 TRA    temp-RAM read address        22    FRCL   latch fractional part
//! 56    TWT    temp-RAM write enable        21-20 SHIFT  shift/saturate mode
//! 55-49 TWA    temp-RAM write address       19    YRL    latch YREG
//! 48    (reserved)                          18    NEGB   negate B operand
//! 47    XSEL   X = INPUTS (else temp)       17    ZERO   B = 0
//! 46-45 YSEL   Y operand select             16    BSEL   B = accumulator (else temp)
//! 44-39 IRA    input selector index         15    NOFL   integer (not float) format
//! 38    IWT    MEMS write enable            14-9  MASA   memory-address-RAM index
//! 37-33 IWA    MEMS write address           8     ADREB  add ADRS to offset
//! 32    (reserved)                          7     NXADR  post-increment offset
//! 31    TABLE  absolute (not MDEC-relative) 6-0   (reserved)
//! 30    MWT    memory write
//! 29    MRD    memory read
//! 28    EWT    output-mixer write
//! 27-24 EWA    output-mixer channel
//! 23    ADRL   load ADRS
//! ```

use bitflags::bitflags;

bitflags! {
    /// The single-bit control lanes of a step word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StepFlags: u64 {
        const TWT   = 1 << 56;
        const XSEL  = 1 << 47;
        const IWT   = 1 << 38;
        const TABLE = 1 << 31;
        const MWT   = 1 << 30;
        const MRD   = 1 << 29;
        const EWT   = 1 << 28;
        const ADRL  = 1 << 23;
        const FRCL  = 1 << 22;
        const YRL   = 1 << 19;
        const NEGB  = 1 << 18;
        const ZERO  = 1 << 17;
        const BSEL  = 1 << 16;
        const NOFL  = 1 << 15;
        const ADREB = 1 << 8;
        const NXADR = 1 << 7;
    }
}

/// A contiguous multi-bit lane of a step word, with mask and shift fixed at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    shift: u32,
    width: u32,
}

impl BitField {
    const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    pub const fn mask(self) -> u64 {
        ((1u64 << self.width) - 1) << self.shift
    }

    /// Largest value the lane can hold.
    pub const fn limit(self) -> u64 {
        (1u64 << self.width) - 1
    }

    pub const fn prep(self, value: u64) -> u64 {
        (value << self.shift) & self.mask()
    }

    pub const fn extract(self, word: u64) -> u64 {
        (word & self.mask()) >> self.shift
    }
}

pub const TRA: BitField = BitField::new(57, 7);
pub const TWA: BitField = BitField::new(49, 7);
pub const YSEL: BitField = BitField::new(45, 2);
pub const IRA: BitField = BitField::new(39, 6);
pub const IWA: BitField = BitField::new(33, 5);
pub const EWA: BitField = BitField::new(24, 4);
pub const SHIFT: BitField = BitField::new(20, 2);
pub const MASA: BitField = BitField::new(9, 6);

/// Bits no field may touch: 48, 32, 6-0.
pub const RESERVED_MASK: u64 = (1 << 48) | (1 << 32) | 0x7F;

/// One microcode step word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Step(u64);

impl Step {
    /// The canonical no-op: `acc = x * 0 + acc` (Y = coefficient, which is
    /// zero unless one was attached; B = accumulator).
    pub const DUMMY_ACC: Step = Step(YSEL.prep(1) | StepFlags::BSEL.bits());

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, flags: StepFlags) -> bool {
        self.0 & flags.bits() == flags.bits()
    }

    pub const fn intersects(self, flags: StepFlags) -> bool {
        self.0 & flags.bits() != 0
    }

    #[must_use]
    pub const fn with(self, flags: StepFlags) -> Self {
        Self(self.0 | flags.bits())
    }

    #[must_use]
    pub const fn with_field(self, field: BitField, value: u64) -> Self {
        Self(self.0 | field.prep(value))
    }

    pub const fn field(self, field: BitField) -> u64 {
        field.extract(self.0)
    }

    pub fn is_dummy_acc(self) -> bool {
        self == Self::DUMMY_ACC
    }

    /// Whether this step touches external memory and is pinned to its slot.
    pub const fn is_memory_access(self) -> bool {
        self.intersects(StepFlags::MRD.union(StepFlags::MWT))
    }
}

/// How a named field is packed into the word.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Flag(StepFlags),
    Value(BitField),
}

impl FieldKind {
    pub const fn width(self) -> u32 {
        match self {
            FieldKind::Flag(_) => 1,
            FieldKind::Value(field) => field.width,
        }
    }

    pub const fn limit(self) -> u64 {
        match self {
            FieldKind::Flag(_) => 1,
            FieldKind::Value(field) => field.limit(),
        }
    }

    pub const fn prep(self, value: u64) -> u64 {
        match self {
            FieldKind::Flag(flags) => {
                if value == 0 {
                    0
                } else {
                    flags.bits()
                }
            }
            FieldKind::Value(field) => field.prep(value),
        }
    }

    pub const fn extract(self, word: u64) -> u64 {
        match self {
            FieldKind::Flag(flags) => (word & flags.bits() != 0) as u64,
            FieldKind::Value(field) => field.extract(word),
        }
    }
}

/// Every named field in canonical listing order. The emitter walks this to
/// print non-zero fields; the assembler walks it to pack them back.
pub const FIELD_ORDER: [(&str, FieldKind); 24] = [
    ("TRA", FieldKind::Value(TRA)),
    ("TWT", FieldKind::Flag(StepFlags::TWT)),
    ("TWA", FieldKind::Value(TWA)),
    ("XSEL", FieldKind::Flag(StepFlags::XSEL)),
    ("YSEL", FieldKind::Value(YSEL)),
    ("IRA", FieldKind::Value(IRA)),
    ("IWT", FieldKind::Flag(StepFlags::IWT)),
    ("IWA", FieldKind::Value(IWA)),
    ("TABLE", FieldKind::Flag(StepFlags::TABLE)),
    ("MWT", FieldKind::Flag(StepFlags::MWT)),
    ("MRD", FieldKind::Flag(StepFlags::MRD)),
    ("EWT", FieldKind::Flag(StepFlags::EWT)),
    ("EWA", FieldKind::Value(EWA)),
    ("ADRL", FieldKind::Flag(StepFlags::ADRL)),
    ("FRCL", FieldKind::Flag(StepFlags::FRCL)),
    ("SHIFT", FieldKind::Value(SHIFT)),
    ("YRL", FieldKind::Flag(StepFlags::YRL)),
    ("NEGB", FieldKind::Flag(StepFlags::NEGB)),
    ("ZERO", FieldKind::Flag(StepFlags::ZERO)),
    ("BSEL", FieldKind::Flag(StepFlags::BSEL)),
    ("NOFL", FieldKind::Flag(StepFlags::NOFL)),
    ("MASA", FieldKind::Value(MASA)),
    ("ADREB", FieldKind::Flag(StepFlags::ADREB)),
    ("NXADR", FieldKind::Flag(StepFlags::NXADR)),
];
