use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// The statement matched a grammar rule but violates a hardware
    /// constraint (index out of range, mismatched address brackets,
    /// conflicting temp reads).
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
}

impl CompileError {
    pub(crate) fn invalid(stmt: &str) -> Self {
        Self::InvalidInstruction(stmt.trim().to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AsmError {
    #[error("malformed directive: {0}")]
    Malformed(String),

    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("bad integer: {0}")]
    BadInteger(String),

    #[error("index {index} out of range for {table}")]
    IndexOutOfRange { table: &'static str, index: u64 },

    #[error("value {value} does not fit field {field}")]
    ValueTooWide { field: String, value: u64 },

    #[error("value {value} does not fit {table}")]
    ValueOutOfRange { table: &'static str, value: i64 },
}
