//! Shared value types for the Wiegand decoder.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two Wiegand data lines.
///
/// A pulse on D0 carries a `0` bit, a pulse on D1 carries a `1` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineRole {
    D0,
    D1,
}

impl LineRole {
    /// Bit value contributed by a pulse on this line.
    pub fn bit(self) -> u8 {
        match self {
            Self::D0 => 0,
            Self::D1 => 1,
        }
    }

    /// Line that carries the given bit value.
    pub fn for_bit(bit: bool) -> Self {
        if bit { Self::D1 } else { Self::D0 }
    }
}

impl fmt::Display for LineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::D0 => write!(f, "D0"),
            Self::D1 => write!(f, "D1"),
        }
    }
}

/// A data field inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    SiteCode,
    Tag,
    Parity,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SiteCode => write!(f, "site code"),
            Self::Tag => write!(f, "tag"),
            Self::Parity => write!(f, "parity"),
        }
    }
}

/// Half-open bit range `[start, start + length)` inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange {
    pub start: usize,
    pub length: usize,
}

impl BitRange {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// One past the last bit in the range.
    pub const fn end(&self) -> usize {
        self.start + self.length
    }

    /// Check whether the range lies entirely inside a frame of `frame_len` bits.
    pub fn fits(&self, frame_len: usize) -> bool {
        self.start
            .checked_add(self.length)
            .is_some_and(|end| end <= frame_len)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

/// Expected parity of the 1-bits in a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Check whether a count of 1-bits satisfies this parity.
    pub fn holds_for(self, ones: usize) -> bool {
        match self {
            Self::Even => ones % 2 == 0,
            Self::Odd => ones % 2 == 1,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Even => write!(f, "even"),
            Self::Odd => write!(f, "odd"),
        }
    }
}

/// A successfully validated card read.
///
/// Values are decimal strings, the representation access-control
/// back-ends expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedResult {
    /// Layout name (e.g. "H10301").
    pub format: String,

    /// Number of bits in the frame.
    pub bit_length: usize,

    /// Facility code as a decimal string.
    pub site_code: String,

    /// Card number as a decimal string.
    pub tag: String,

    /// Wall-clock time the frame was decoded.
    pub read_at: DateTime<Utc>,
}

impl DecodedResult {
    pub fn new(format: impl Into<String>, bit_length: usize, site_code: u64, tag: u64) -> Self {
        Self {
            format: format.into(),
            bit_length,
            site_code: site_code.to_string(),
            tag: tag.to_string(),
            read_at: Utc::now(),
        }
    }
}

impl fmt::Display for DecodedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-bit {} site={} tag={}",
            self.bit_length, self.format, self.site_code, self.tag
        )
    }
}

/// Why a frame produced no result.
///
/// These are expected on a noisy line and never stop the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// No layout is defined for this frame length.
    UnrecognizedLength { length: usize },

    /// One or both parity ranges failed.
    Parity {
        format: String,
        leading_ok: bool,
        trailing_ok: bool,
    },

    /// More bits arrived than the configured maximum before the frame closed.
    Overflow { received: usize, max_bits: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedLength { length } => {
                write!(f, "unrecognized {}-bit frame", length)
            }
            Self::Parity {
                format,
                leading_ok,
                trailing_ok,
            } => write!(
                f,
                "invalid parity for {} frame (leading ok: {}, trailing ok: {})",
                format, leading_ok, trailing_ok
            ),
            Self::Overflow { received, max_bits } => write!(
                f,
                "frame overflow: {} bits received, limit is {}",
                received, max_bits
            ),
        }
    }
}

/// Result of decoding a frame that passed the bit-level contract checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Accepted(DecodedResult),
    Rejected(Rejection),
}

impl DecodeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The decoded result, if the frame was accepted.
    pub fn accepted(self) -> Option<DecodedResult> {
        match self {
            Self::Accepted(result) => Some(result),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}
