//! Frame layout table.
//!
//! Each supported frame length maps to one [`FrameLayout`] describing where
//! its parity ranges and data fields sit. Adding a format is a new table
//! entry, the decoder itself does not change.
//!
//! | Format | Bits | Leading (even) | Trailing (odd) | Site code | Tag |
//! |--------|------|----------------|----------------|-----------|-----|
//! | H10301 | 26 | `[0..13)` | `[13..26)` | `[1..9)` | `[9..25)` |
//! | H10306 | 34 | `[0..17)` | `[17..34)` | `[1..17)` | `[17..33)` |
//! | H10304 | 37 | `[0..19)` | `[19..37)` | `[1..17)` | `[17..36)` |
//!
//! The first bit of the leading range and the last bit of the trailing
//! range are the parity bits themselves.

use crate::constants::MAX_FIELD_BITS;
use crate::error::{Error, Result};
use crate::types::{BitRange, Field, Parity};

/// Bit layout of one Wiegand frame format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Format name.
    pub name: &'static str,

    /// Total frame length in bits.
    pub bit_length: usize,

    /// Range covered by the leading parity bit (always even).
    pub leading_parity: BitRange,

    /// Range covered by the trailing parity bit (always odd).
    pub trailing_parity: BitRange,

    /// Facility code bits.
    pub site_code: BitRange,

    /// Card number bits.
    pub tag: BitRange,
}

/// HID H10301, the standard 26-bit format.
pub const H10301: FrameLayout = FrameLayout {
    name: "H10301",
    bit_length: 26,
    leading_parity: BitRange::new(0, 13),
    trailing_parity: BitRange::new(13, 13),
    site_code: BitRange::new(1, 8),
    tag: BitRange::new(9, 16),
};

/// HID H10306, 34-bit with a 16-bit facility code.
pub const H10306: FrameLayout = FrameLayout {
    name: "H10306",
    bit_length: 34,
    leading_parity: BitRange::new(0, 17),
    trailing_parity: BitRange::new(17, 17),
    site_code: BitRange::new(1, 16),
    tag: BitRange::new(17, 16),
};

/// HID H10304, 37-bit with a 19-bit card number.
pub const H10304: FrameLayout = FrameLayout {
    name: "H10304",
    bit_length: 37,
    leading_parity: BitRange::new(0, 19),
    trailing_parity: BitRange::new(19, 18),
    site_code: BitRange::new(1, 16),
    tag: BitRange::new(17, 19),
};

/// All known layouts, keyed by `bit_length`.
pub const LAYOUTS: [FrameLayout; 3] = [H10301, H10306, H10304];

impl FrameLayout {
    /// Look up the layout for a frame length.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiegand_core::FrameLayout;
    ///
    /// assert_eq!(FrameLayout::for_length(26).unwrap().name, "H10301");
    /// assert!(FrameLayout::for_length(30).is_none());
    /// ```
    pub fn for_length(bit_length: usize) -> Option<&'static FrameLayout> {
        LAYOUTS.iter().find(|layout| layout.bit_length == bit_length)
    }

    /// Parity expected over the leading range.
    pub const fn leading_parity_kind(&self) -> Parity {
        Parity::Even
    }

    /// Parity expected over the trailing range.
    pub const fn trailing_parity_kind(&self) -> Parity {
        Parity::Odd
    }

    /// Check that every range fits the frame and that the parity bits do not
    /// overlap the data fields.
    pub fn validate(&self) -> Result<()> {
        let ranges = [
            (Field::Parity, self.leading_parity),
            (Field::Parity, self.trailing_parity),
            (Field::SiteCode, self.site_code),
            (Field::Tag, self.tag),
        ];
        for (field, range) in ranges {
            if !range.fits(self.bit_length) || range.length == 0 {
                return Err(Error::RangeOutOfBounds {
                    field,
                    start: range.start,
                    length: range.length,
                    frame_len: self.bit_length,
                });
            }
        }

        for (field, range) in [(Field::SiteCode, self.site_code), (Field::Tag, self.tag)] {
            if range.length > MAX_FIELD_BITS {
                return Err(Error::FieldTooWide {
                    field,
                    length: range.length,
                    max: MAX_FIELD_BITS,
                });
            }
            if range.contains(self.leading_parity_bit()) || range.contains(self.trailing_parity_bit())
            {
                return Err(Error::Config(format!(
                    "{} {} overlaps a parity bit in {}",
                    field, range, self.name
                )));
            }
        }
        Ok(())
    }

    /// Index of the leading parity bit.
    pub const fn leading_parity_bit(&self) -> usize {
        self.leading_parity.start
    }

    /// Index of the trailing parity bit.
    pub const fn trailing_parity_bit(&self) -> usize {
        self.trailing_parity.end() - 1
    }

    /// Build a frame carrying `site_code` and `tag` with both parity bits set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueTooLarge`] if a value does not fit its field, or
    /// the [`validate`](Self::validate) error for a malformed layout.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiegand_core::layout::H10301;
    /// use wiegand_core::{DecodeOutcome, decode};
    ///
    /// let bits = H10301.encode(12, 21845).unwrap();
    /// let DecodeOutcome::Accepted(result) = decode(&bits).unwrap() else {
    ///     panic!("frame rejected");
    /// };
    /// assert_eq!(result.tag, "21845");
    /// assert_eq!(result.site_code, "12");
    /// ```
    pub fn encode(&self, site_code: u64, tag: u64) -> Result<Vec<u8>> {
        self.validate()?;
        let mut bits = vec![0u8; self.bit_length];
        write_field(&mut bits, Field::SiteCode, self.site_code, site_code)?;
        write_field(&mut bits, Field::Tag, self.tag, tag)?;

        let leading_ones = count_ones(&bits, self.leading_parity);
        if !self.leading_parity_kind().holds_for(leading_ones) {
            bits[self.leading_parity_bit()] = 1;
        }
        let trailing_ones = count_ones(&bits, self.trailing_parity);
        if !self.trailing_parity_kind().holds_for(trailing_ones) {
            bits[self.trailing_parity_bit()] = 1;
        }
        Ok(bits)
    }
}

fn write_field(bits: &mut [u8], field: Field, range: BitRange, value: u64) -> Result<()> {
    if range.length < MAX_FIELD_BITS && value >> range.length != 0 {
        return Err(Error::ValueTooLarge {
            field,
            value,
            length: range.length,
        });
    }
    for offset in 0..range.length {
        let shift = range.length - 1 - offset;
        bits[range.start + offset] = ((value >> shift) & 1) as u8;
    }
    Ok(())
}

fn count_ones(bits: &[u8], range: BitRange) -> usize {
    bits[range.start..range.end()]
        .iter()
        .filter(|&&bit| bit == 1)
        .count()
}
