//! Core constants for the Wiegand reader.
//!
//! This module centralizes the protocol-level and timing constants used by
//! the decoder and the reader runtime.
//!
//! # Frame Timing
//!
//! A Wiegand burst is a sequence of short low pulses (typically 50µs wide,
//! 1-2ms apart) on either data line. The end of a frame is not marked on the
//! wire; it is inferred from silence:
//!
//! ```text
//! D0 ‾‾‾‾|_|‾‾‾‾‾‾‾‾‾|_|‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//! D1 ‾‾‾‾‾‾‾‾‾|_|‾‾‾‾‾‾‾‾‾|_|‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//!        0    1    0    1  <------ DEFAULT_FRAME_TIMEOUT ------>
//! ```
//!
//! # Usage
//!
//! ```
//! use wiegand_core::constants::*;
//!
//! assert_eq!(DEFAULT_MAX_BITS, 26);
//! assert_eq!(DEFAULT_FRAME_TIMEOUT.as_millis(), 100);
//! assert!(SUPPORTED_FRAME_LENGTHS.contains(&34));
//! ```

use std::time::Duration;

// ============================================================================
// Frame Assembly
// ============================================================================

/// Default inter-bit silence that closes a frame (100ms).
///
/// Far longer than any intra-frame gap, short enough not to merge two
/// separate card swipes.
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_millis(100);

/// Default maximum number of bits collected per frame.
///
/// Matches the standard 26-bit format. Readers emitting 34 or 37-bit frames
/// must be configured with a larger limit.
pub const DEFAULT_MAX_BITS: usize = 26;

/// Interval after which a line monitor stops waiting for an edge and
/// re-checks for cancellation.
pub const EDGE_RECHECK_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Frame Formats
// ============================================================================

/// Frame lengths with a known bit layout.
pub const SUPPORTED_FRAME_LENGTHS: [usize; 3] = [26, 34, 37];

/// Widest field the decoder can extract into a `u64`.
pub const MAX_FIELD_BITS: usize = 64;

// ============================================================================
// Diagnostics
// ============================================================================

/// Poll interval used by the pin monitor while waiting for edges.
pub const PIN_MONITOR_RECHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Lines that are skipped when the pin monitor enumerates all lines.
///
/// On a Raspberry Pi header these carry the HAT EEPROM bus, I2C1, SPI0 and
/// UART0.
pub const RESERVED_LINES: [&str; 11] = [
    "GPIO0",  // ID_SD (HAT EEPROM)
    "GPIO1",  // ID_SC (HAT EEPROM)
    "GPIO2",  // I2C1_SDA
    "GPIO3",  // I2C1_SCL
    "GPIO7",  // SPI0_CE1_N
    "GPIO8",  // SPI0_CE0_N
    "GPIO9",  // SPI0_MISO
    "GPIO10", // SPI0_MOSI
    "GPIO11", // SPI0_SCLK
    "GPIO14", // UART0_TXD
    "GPIO15", // UART0_RXD
];

/// Function-name fragments that mark a line as claimed by a peripheral bus.
pub const ALTERNATE_FUNCTION_MARKERS: [&str; 4] = ["I2C", "SPI", "UART", "SDIO"];
