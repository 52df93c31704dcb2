//! Wiegand reader runtime.
//!
//! This crate turns pulses on a pair of digital input lines into decoded
//! card reads. It owns everything with timing or concurrency in it; the
//! protocol rules live in `wiegand-core`.
//!
//! # Architecture
//!
//! ```text
//!  D0 line ──> LineMonitor ──┐
//!                            ├──> FrameAccumulator ──> BoundaryDetector ──> callbacks
//!  D1 line ──> LineMonitor ──┘        (bits, last bit time)   (silence timeout, decode)
//! ```
//!
//! A [`Reader`] runs the three tasks under one cancellation token. Lines come
//! from a [`LineProvider`]: the in-process [`mock`] backend, or the Raspberry
//! Pi header with the `hardware-rpi` feature.
//!
//! # Line Traits
//!
//! The [`InputLine`] trait is the only thing the runtime needs from hardware:
//!
//! ```no_run
//! use std::time::Duration;
//! use wiegand_hardware::traits::InputLine;
//! use wiegand_hardware::error::Result;
//!
//! async fn wait_for_pulse<L: InputLine>(line: &mut L) -> Result<bool> {
//!     if !line.wait_for_edge(Duration::from_secs(1)).await? {
//!         return Ok(false);
//!     }
//!     Ok(line.read().await?.is_low())
//! }
//! ```
//!
//! All traits use native `async fn` (Rust 1.90 + Edition 2024 RPITIT) and
//! require `Send + Sync`. They are not object-safe; the [`devices`] enums
//! provide concrete dispatch.
//!
//! # Error Handling
//!
//! Construction returns configuration errors ([`HardwareError`]). Once a
//! reader is running, rejected frames are logged and dropped; a line failure
//! ends its monitor and is reported by [`Reader::shutdown`].

pub mod accumulator;
pub mod callback;
pub mod detector;
pub mod devices;
pub mod error;
pub mod mock;
pub mod monitor;
pub mod pinmon;
pub mod reader;
#[cfg(feature = "hardware-rpi")]
pub mod rpi;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{InputLine, LineProvider};
pub use types::{Bias, Edge, Level, LineInfo};

pub use accumulator::{FrameAccumulator, Settle, Snapshot};
pub use callback::{Callbacks, ResultCallback, TagCallback};
pub use detector::{BoundaryDetector, DetectorState};
pub use devices::{AnyInputLine, AnyLineProvider};
pub use pinmon::PinEvent;
pub use reader::{Reader, ReaderConfig, ReaderConfigBuilder, ReaderSettings, ShutdownReport};
