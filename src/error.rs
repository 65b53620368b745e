//! Errors raised while preparing a mining run.
//!
//! Everything here is detected before the first salt is tried. Once workers
//! are running the only abnormal termination is cancellation, which is an
//! outcome rather than an error.

/// Invalid bytecode, constructor arguments or flag names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid hex in {what}: {reason}")]
    InvalidHex { what: &'static str, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Constructor argument count mismatch: {types} type(s) but {values} value(s)")]
    ArityMismatch { types: usize, values: usize },

    #[error("Constructor argument {index}: expected {expected}, got {found}")]
    TypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Value out of range for {ty}: {value}")]
    ValueOutOfRange { ty: String, value: String },

    #[error("Unknown ABI type: {0}")]
    UnknownType(String),

    #[error("Invalid {ty} value: {value}")]
    InvalidValue { ty: String, value: String },

    #[error("Unknown hook flag: {0}")]
    UnknownFlag(String),
}

impl InputError {
    pub(crate) fn hex(what: &'static str, err: hex::FromHexError) -> Self {
        Self::InvalidHex {
            what,
            reason: err.to_string(),
        }
    }
}
