//! Input line trait definitions.
//!
//! These traits are the contract between the Wiegand runtime and whatever
//! exposes the physical data lines: a GPIO character device, a board support
//! crate, or the in-process mock used in tests.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::devices::AnyInputLine;
use crate::error::Result;
use crate::types::{Bias, Edge, Level, LineInfo};

/// A digital input line configured for edge detection.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters, or the
/// [`AnyInputLine`](crate::devices::AnyInputLine) enum wrapper where a single
/// concrete type is needed (the reader spawns its monitors over it).
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use wiegand_hardware::traits::InputLine;
/// use wiegand_hardware::error::Result;
///
/// async fn count_edges<L: InputLine>(line: &mut L) -> Result<usize> {
///     let mut edges = 0;
///     while line.wait_for_edge(Duration::from_millis(500)).await? {
///         edges += 1;
///     }
///     Ok(edges)
/// }
/// ```
pub trait InputLine: Send + Sync {
    /// Name the line was resolved from.
    fn name(&self) -> &str;

    /// Wait up to `timeout` for the next configured edge.
    ///
    /// Returns `true` if an edge occurred and `false` if the timeout elapsed
    /// first. Edges that occur between calls are not lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is disconnected or the backend fails.
    async fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the current level of the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn read(&self) -> Result<Level>;
}

/// Source of named input lines.
///
/// A provider resolves line names to configured [`InputLine`]s and can list
/// the lines it knows about.
pub trait LineProvider: Send + Sync {
    /// Resolve `name` and configure it as an input with the given bias and
    /// edge detection.
    ///
    /// # Errors
    ///
    /// - [`HardwareError::LineNotFound`](crate::HardwareError::LineNotFound)
    ///   if no such line exists.
    /// - [`HardwareError::LineBusy`](crate::HardwareError::LineBusy) if the
    ///   line is already claimed.
    /// - [`HardwareError::ConfigurationError`](crate::HardwareError::ConfigurationError)
    ///   if the line cannot be configured.
    async fn claim(&self, name: &str, bias: Bias, edge: Edge) -> Result<AnyInputLine>;

    /// Give back a line obtained from [`claim`](Self::claim) so it can be
    /// claimed again.
    ///
    /// The default drops the line, which is enough for backends that free a
    /// line when its handle goes away.
    fn release(&self, line: AnyInputLine) {
        drop(line);
    }

    /// List every line the provider can resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot enumerate its lines.
    async fn lines(&self) -> Result<Vec<LineInfo>>;
}
