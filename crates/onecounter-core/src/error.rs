use thiserror::Error;

/// The error kinds surfaced by this crate, per the error handling design: RST
/// closure/consistency violations are expected and recovered locally by the
/// learning driver, everything here is either a true user error (bad
/// construction input, malformed textual automaton) or a fatal contract
/// violation that aborts the current learning run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("alphabet mismatch: {0}")]
    AlphabetMismatch(String),

    #[error("counter value {value} is out of range for an RST/automaton of size {size}")]
    OutOfRange { value: i64, size: usize },

    #[error("{kind} '{label}' is already present in table {table}")]
    DuplicateLabel {
        kind: &'static str,
        label: String,
        table: usize,
    },

    #[error("column '{label}' is not present in table {table}")]
    MissingColumn { label: String, table: usize },

    #[error("teacher contract violation: {0}")]
    TeacherContractViolation(String),

    #[error("fold invariant broken: {0}")]
    FoldInvariantBroken(String),

    #[error("invalid counter effect {effect} for symbol '{symbol}': must be -1, 0 or 1")]
    InvalidEffect { symbol: char, effect: i32 },

    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
