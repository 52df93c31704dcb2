//! Frame decoding.
//!
//! Decoding happens in two layers:
//!
//! 1. The bit-level contract ([`validate_bits`], [`check_parity`],
//!    [`decode_bits`]). A violation here is a bug in the caller or the layout
//!    table and is returned as [`Error`].
//! 2. Protocol validation ([`decode`]). A frame of unknown length or with bad
//!    parity is expected line noise and is returned as
//!    [`DecodeOutcome::Rejected`], never as an error.
//!
//! All bit sequences are most-significant bit first.

use crate::constants::MAX_FIELD_BITS;
use crate::error::{Error, Result};
use crate::layout::FrameLayout;
use crate::types::{BitRange, DecodeOutcome, DecodedResult, Field, Parity, Rejection};

/// Site code and tag extracted from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValues {
    pub site_code: u64,
    pub tag: u64,
}

/// Ensure every element of `bits` is 0 or 1.
pub fn validate_bits(bits: &[u8]) -> Result<()> {
    match bits.iter().position(|&bit| bit > 1) {
        Some(index) => Err(Error::InvalidBitValue {
            index,
            value: bits[index],
        }),
        None => Ok(()),
    }
}

/// Check the parity of the 1-bits in `range`.
///
/// # Errors
///
/// Returns [`Error::RangeOutOfBounds`] if the range does not fit `bits`.
///
/// # Examples
///
/// ```
/// use wiegand_core::{BitRange, Parity, check_parity};
///
/// let bits = [1, 1, 0, 1];
/// assert!(check_parity(&bits, BitRange::new(0, 2), Parity::Even).unwrap());
/// assert!(check_parity(&bits, BitRange::new(0, 4), Parity::Odd).unwrap());
/// assert!(check_parity(&bits, BitRange::new(2, 4), Parity::Odd).is_err());
/// ```
pub fn check_parity(bits: &[u8], range: BitRange, parity: Parity) -> Result<bool> {
    let slice = select(bits, Field::Parity, range)?;
    let ones = slice.iter().filter(|&&bit| bit == 1).count();
    Ok(parity.holds_for(ones))
}

/// Interpret `bits` as a big-endian unsigned number.
///
/// The caller guarantees at most 64 bits of 0/1 values; an empty slice is 0.
pub fn bits_to_u64(bits: &[u8]) -> u64 {
    bits.iter()
        .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit & 1))
}

/// Extract the site code and tag from a frame.
///
/// Both ranges are independent of each other and of the frame length; the
/// caller supplies them from a [`FrameLayout`].
///
/// # Errors
///
/// - [`Error::InvalidBitValue`] if any element is not 0 or 1.
/// - [`Error::RangeOutOfBounds`] if either range exceeds the frame.
/// - [`Error::FieldTooWide`] if either range is wider than 64 bits.
///
/// # Examples
///
/// ```
/// use wiegand_core::{BitRange, decode_bits};
///
/// let bits = [0, 1, 0, 1, 1, 1];
/// let values = decode_bits(&bits, BitRange::new(0, 2), BitRange::new(2, 4)).unwrap();
/// assert_eq!(values.site_code, 1);
/// assert_eq!(values.tag, 7);
/// ```
pub fn decode_bits(bits: &[u8], site_code: BitRange, tag: BitRange) -> Result<FieldValues> {
    validate_bits(bits)?;
    let site_bits = select_field(bits, Field::SiteCode, site_code)?;
    let tag_bits = select_field(bits, Field::Tag, tag)?;
    Ok(FieldValues {
        site_code: bits_to_u64(site_bits),
        tag: bits_to_u64(tag_bits),
    })
}

/// Decode a complete frame using the layout for its length.
///
/// # Errors
///
/// Only contract violations are errors: a non-binary element in `bits`, or
/// a layout whose ranges do not fit the frame.
///
/// # Examples
///
/// ```
/// use wiegand_core::{DecodeOutcome, Rejection, decode};
///
/// let outcome = decode(&[1, 0, 1]).unwrap();
/// assert_eq!(
///     outcome,
///     DecodeOutcome::Rejected(Rejection::UnrecognizedLength { length: 3 })
/// );
/// ```
pub fn decode(bits: &[u8]) -> Result<DecodeOutcome> {
    validate_bits(bits)?;
    match FrameLayout::for_length(bits.len()) {
        Some(layout) => decode_with(bits, layout),
        None => Ok(DecodeOutcome::Rejected(Rejection::UnrecognizedLength {
            length: bits.len(),
        })),
    }
}

/// Decode a frame against a specific layout.
///
/// A length mismatch between `bits` and `layout` is reported as
/// [`Rejection::UnrecognizedLength`].
pub fn decode_with(bits: &[u8], layout: &FrameLayout) -> Result<DecodeOutcome> {
    validate_bits(bits)?;
    if bits.len() != layout.bit_length {
        return Ok(DecodeOutcome::Rejected(Rejection::UnrecognizedLength {
            length: bits.len(),
        }));
    }

    let leading_ok = check_parity(bits, layout.leading_parity, layout.leading_parity_kind())?;
    let trailing_ok = check_parity(bits, layout.trailing_parity, layout.trailing_parity_kind())?;
    if !(leading_ok && trailing_ok) {
        return Ok(DecodeOutcome::Rejected(Rejection::Parity {
            format: layout.name.to_string(),
            leading_ok,
            trailing_ok,
        }));
    }

    let values = decode_bits(bits, layout.site_code, layout.tag)?;
    Ok(DecodeOutcome::Accepted(DecodedResult::new(
        layout.name,
        layout.bit_length,
        values.site_code,
        values.tag,
    )))
}

fn select(bits: &[u8], field: Field, range: BitRange) -> Result<&[u8]> {
    if !range.fits(bits.len()) {
        return Err(Error::RangeOutOfBounds {
            field,
            start: range.start,
            length: range.length,
            frame_len: bits.len(),
        });
    }
    Ok(&bits[range.start..range.end()])
}

fn select_field(bits: &[u8], field: Field, range: BitRange) -> Result<&[u8]> {
    let slice = select(bits, field, range)?;
    if range.length > MAX_FIELD_BITS {
        return Err(Error::FieldTooWide {
            field,
            length: range.length,
            max: MAX_FIELD_BITS,
        });
    }
    Ok(slice)
}
