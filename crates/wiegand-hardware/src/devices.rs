//! Enum wrappers for input line dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so `Box<dyn
//! InputLine>` is not available. These enums give the reader one concrete
//! type to spawn tasks over while keeping backends pluggable behind
//! feature flags.
//!
//! # Examples
//!
//! ```
//! use wiegand_hardware::devices::AnyLineProvider;
//! use wiegand_hardware::mock::MockProvider;
//!
//! let mock = MockProvider::new();
//! let _d0 = mock.add_line("GPIO4");
//! let provider = AnyLineProvider::Mock(mock);
//! ```

use std::time::Duration;

use crate::mock::{MockLine, MockProvider};
#[cfg(feature = "hardware-rpi")]
use crate::rpi::{RpiLine, RpiProvider};
use crate::traits::{InputLine, LineProvider};
use crate::types::{Bias, Edge, Level, LineInfo};
use crate::Result;

/// Enum wrapper for input line dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyInputLine {
    /// Mock line for development and testing.
    Mock(MockLine),

    /// Raspberry Pi GPIO pin.
    #[cfg(feature = "hardware-rpi")]
    Rpi(RpiLine),
}

impl InputLine for AnyInputLine {
    fn name(&self) -> &str {
        match self {
            Self::Mock(line) => line.name(),
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(line) => line.name(),
        }
    }

    async fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool> {
        match self {
            Self::Mock(line) => line.wait_for_edge(timeout).await,
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(line) => line.wait_for_edge(timeout).await,
        }
    }

    async fn read(&self) -> Result<Level> {
        match self {
            Self::Mock(line) => line.read().await,
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(line) => line.read().await,
        }
    }
}

/// Enum wrapper for line provider dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyLineProvider {
    /// In-process mock lines.
    Mock(MockProvider),

    /// Raspberry Pi GPIO header.
    #[cfg(feature = "hardware-rpi")]
    Rpi(RpiProvider),
}

impl LineProvider for AnyLineProvider {
    async fn claim(&self, name: &str, bias: Bias, edge: Edge) -> Result<AnyInputLine> {
        match self {
            Self::Mock(provider) => provider.claim(name, bias, edge).await,
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(provider) => provider.claim(name, bias, edge).await,
        }
    }

    async fn lines(&self) -> Result<Vec<LineInfo>> {
        match self {
            Self::Mock(provider) => provider.lines().await,
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(provider) => provider.lines().await,
        }
    }

    fn release(&self, line: AnyInputLine) {
        match self {
            Self::Mock(provider) => provider.release(line),
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(provider) => provider.release(line),
        }
    }
}
