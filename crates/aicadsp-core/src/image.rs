//! The packed DSP state, as the hardware banks expect it.

pub const MPRO_LEN: usize = 128;
pub const COEF_LEN: usize = 128;
pub const MADRS_LEN: usize = 64;
pub const TEMP_LEN: usize = 128;

/// All four DSP tables, fixed-size and zero where unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DspImage {
    /// Microcode program, one 64-bit word per step.
    pub mpro: [u64; MPRO_LEN],
    /// Coefficient RAM, signed 16-bit.
    pub coef: [i16; COEF_LEN],
    /// Memory-address RAM, unsigned 16-bit.
    pub madrs: [u16; MADRS_LEN],
    /// Temp-RAM initial values, unsigned 32-bit.
    pub temp: [u32; TEMP_LEN],
}

impl Default for DspImage {
    fn default() -> Self {
        Self {
            mpro: [0; MPRO_LEN],
            coef: [0; COEF_LEN],
            madrs: [0; MADRS_LEN],
            temp: [0; TEMP_LEN],
        }
    }
}

impl DspImage {
    /// Serialized size in bytes.
    pub const BYTE_LEN: usize = COEF_LEN * 2 + MADRS_LEN * 2 + MPRO_LEN * 8 + TEMP_LEN * 4;

    /// Packs the tables little-endian in register-map order: COEF, MADRS,
    /// MPRO, TEMP.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::BYTE_LEN);
        for value in self.coef {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in self.madrs {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in self.mpro {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in self.temp {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}
