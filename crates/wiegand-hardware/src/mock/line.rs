//! Mock input line implementation for testing and development.
//!
//! This module provides a simulated digital input line whose level is
//! driven programmatically through a handle, without physical hardware.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use wiegand_core::LineRole;

use crate::{
    HardwareError, Result,
    traits::InputLine,
    types::{Bias, Edge, Level},
};

/// Mock input line for testing and development.
///
/// The line starts at the idle level of its bias and changes level whenever
/// its [`MockLineHandle`] drives a transition. Only transitions matching the
/// configured [`Edge`] are reported by `wait_for_edge`, but every transition
/// updates the level seen by `read`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wiegand_hardware::mock::MockLine;
/// use wiegand_hardware::traits::InputLine;
/// use wiegand_hardware::types::{Bias, Edge, Level};
///
/// #[tokio::main]
/// async fn main() -> wiegand_hardware::Result<()> {
///     let (mut line, handle) = MockLine::new("GPIO4");
///     line.configure(Bias::PullUp, Edge::Falling);
///
///     handle.pulse()?;
///
///     assert!(line.wait_for_edge(Duration::from_millis(100)).await?);
///     assert_eq!(line.read().await?, Level::Low);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLine {
    /// Channel receiver for level transitions
    event_rx: mpsc::UnboundedReceiver<Level>,

    /// Line name
    name: String,

    /// Reported edges
    edge: Edge,

    /// Level after the last consumed transition
    level: Level,
}

impl MockLine {
    /// Create a new mock line.
    ///
    /// Returns a tuple of (MockLine, MockLineHandle) where the handle drives
    /// the line's level. The line is pulled up and reports falling edges
    /// until [`configure`](Self::configure) says otherwise.
    pub fn new(name: impl Into<String>) -> (Self, MockLineHandle) {
        let name = name.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let line = Self {
            event_rx,
            name: name.clone(),
            edge: Edge::Falling,
            level: Bias::PullUp.idle_level(),
        };

        let handle = MockLineHandle { event_tx, name };

        (line, handle)
    }

    /// Set bias and edge detection, resetting the level to the bias idle level.
    pub fn configure(&mut self, bias: Bias, edge: Edge) {
        self.edge = edge;
        self.level = bias.idle_level();
    }
}

impl InputLine for MockLine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;

        loop {
            let next = match tokio::time::timeout_at(deadline, self.event_rx.recv()).await {
                Err(_) => return Ok(false),
                Ok(None) => return Err(HardwareError::disconnected(&self.name)),
                Ok(Some(level)) => level,
            };

            // Driving the current level again is not a transition
            if next == self.level {
                continue;
            }
            self.level = next;

            if self.edge.matches(next) {
                return Ok(true);
            }
        }
    }

    async fn read(&self) -> Result<Level> {
        Ok(self.level)
    }
}

/// Handle for driving a mock input line.
///
/// Cloneable, so tests can hand copies to the tasks that simulate a reader.
#[derive(Debug, Clone)]
pub struct MockLineHandle {
    /// Channel sender for level transitions
    event_tx: mpsc::UnboundedSender<Level>,

    /// Line name
    name: String,
}

impl MockLineHandle {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line has been dropped.
    pub fn set_level(&self, level: Level) -> Result<()> {
        self.event_tx
            .send(level)
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Drive one Wiegand pulse: low, then back to high.
    ///
    /// # Errors
    ///
    /// Returns an error if the line has been dropped.
    pub fn pulse(&self) -> Result<()> {
        self.set_level(Level::Low)?;
        self.set_level(Level::High)
    }

    /// Get the line name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Drive a complete Wiegand burst onto a pair of mock lines.
///
/// Each `0` pulses `d0` and each `1` pulses `d1`, with `bit_interval`
/// between consecutive pulses.
///
/// # Errors
///
/// Returns [`HardwareError::Decode`] for an element that is not 0 or 1,
/// or a disconnected error if either line has been dropped.
pub async fn transmit_frame(
    d0: &MockLineHandle,
    d1: &MockLineHandle,
    bits: &[u8],
    bit_interval: Duration,
) -> Result<()> {
    for (index, &bit) in bits.iter().enumerate() {
        let role = match bit {
            0 => LineRole::D0,
            1 => LineRole::D1,
            value => {
                return Err(wiegand_core::Error::InvalidBitValue { index, value }.into());
            }
        };

        match role {
            LineRole::D0 => d0.pulse()?,
            LineRole::D1 => d1.pulse()?,
        }

        if index + 1 < bits.len() {
            tokio::time::sleep(bit_interval).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_line_reports_falling_edge() {
        let (mut line, handle) = MockLine::new("GPIO4");
        line.configure(Bias::PullUp, Edge::Falling);

        handle.pulse().unwrap();

        assert!(line.wait_for_edge(Duration::from_millis(50)).await.unwrap());
        assert_eq!(line.read().await.unwrap(), Level::Low);

        // The rising half of the pulse is consumed but not reported
        assert!(!line.wait_for_edge(Duration::from_millis(10)).await.unwrap());
        assert_eq!(line.read().await.unwrap(), Level::High);
    }

    #[tokio::test]
    async fn test_mock_line_both_edges() {
        let (mut line, handle) = MockLine::new("GPIO5");
        line.configure(Bias::PullDown, Edge::Both);
        assert_eq!(line.read().await.unwrap(), Level::Low);

        handle.set_level(Level::High).unwrap();
        handle.set_level(Level::Low).unwrap();

        assert!(line.wait_for_edge(Duration::from_millis(50)).await.unwrap());
        assert_eq!(line.read().await.unwrap(), Level::High);
        assert!(line.wait_for_edge(Duration::from_millis(50)).await.unwrap());
        assert_eq!(line.read().await.unwrap(), Level::Low);
    }

    #[tokio::test]
    async fn test_mock_line_ignores_repeated_level() {
        let (mut line, handle) = MockLine::new("GPIO6");
        line.configure(Bias::PullUp, Edge::Both);

        handle.set_level(Level::High).unwrap();

        assert!(!line.wait_for_edge(Duration::from_millis(10)).await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_line_disconnected() {
        let (mut line, handle) = MockLine::new("GPIO7");
        drop(handle);

        let result = line.wait_for_edge(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_transmit_frame_order() {
        let (mut d0, d0_handle) = MockLine::new("D0");
        let (mut d1, d1_handle) = MockLine::new("D1");

        transmit_frame(&d0_handle, &d1_handle, &[1, 0, 1], Duration::ZERO)
            .await
            .unwrap();

        let timeout = Duration::from_millis(10);
        assert!(d1.wait_for_edge(timeout).await.unwrap());
        assert!(d1.wait_for_edge(timeout).await.unwrap());
        assert!(!d1.wait_for_edge(timeout).await.unwrap());
        assert!(d0.wait_for_edge(timeout).await.unwrap());
        assert!(!d0.wait_for_edge(timeout).await.unwrap());
    }

    #[tokio::test]
    async fn test_transmit_frame_rejects_invalid_bit() {
        let (_d0, d0_handle) = MockLine::new("D0");
        let (_d1, d1_handle) = MockLine::new("D1");

        let result = transmit_frame(&d0_handle, &d1_handle, &[0, 2], Duration::ZERO).await;
        assert!(matches!(result, Err(HardwareError::Decode(_))));
    }
}
