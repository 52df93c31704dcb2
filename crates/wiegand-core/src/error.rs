//! Error types for frame decoding and encoding.
//!
//! Everything in [`Error`] is a contract violation: a caller handed the
//! decoder a bit that is not 0/1, or a layout whose ranges do not fit the
//! frame. Expected protocol noise (unknown lengths, bad parity, overflow)
//! is reported through [`Rejection`](crate::Rejection) instead and never
//! surfaces here.

use thiserror::Error;

use crate::types::Field;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid bit value {value} at index {index}: expected 0 or 1")]
    InvalidBitValue { index: usize, value: u8 },

    #[error(
        "{field} range [{start}..{start}+{length}) is out of bounds for a {frame_len}-bit frame"
    )]
    RangeOutOfBounds {
        field: Field,
        start: usize,
        length: usize,
        frame_len: usize,
    },

    #[error("{field} is {length} bits wide, at most {max} bits can be extracted")]
    FieldTooWide {
        field: Field,
        length: usize,
        max: usize,
    },

    #[error("{field} value {value} does not fit in {length} bits")]
    ValueTooLarge {
        field: Field,
        value: u64,
        length: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for errors raised by the bit-level decoding contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBitValue { .. } | Self::RangeOutOfBounds { .. } | Self::FieldTooWide { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
