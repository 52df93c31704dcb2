//! Wiegand frame decoding.
//!
//! This crate holds the protocol half of the Wiegand reader: the layout
//! table, parity checks, field extraction and a frame encoder. It does no
//! I/O; the pulse-to-frame runtime lives in `wiegand-hardware`.
//!
//! ```
//! use wiegand_core::{DecodeOutcome, decode, layout::H10301};
//!
//! let frame = H10301.encode(2, 21845)?;
//! match decode(&frame)? {
//!     DecodeOutcome::Accepted(result) => assert_eq!(result.tag, "21845"),
//!     DecodeOutcome::Rejected(rejection) => panic!("{rejection}"),
//! }
//! # Ok::<(), wiegand_core::Error>(())
//! ```

pub mod constants;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod types;

pub use decoder::{
    FieldValues, bits_to_u64, check_parity, decode, decode_bits, decode_with, validate_bits,
};
pub use error::{Error, Result};
pub use layout::{FrameLayout, LAYOUTS};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
