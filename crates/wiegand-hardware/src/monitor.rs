//! Line monitor task.
//!
//! One monitor runs per data line. It waits for falling edges, confirms the
//! line is held low and appends the line's bit to the shared accumulator.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};
use wiegand_core::LineRole;

use crate::{Result, accumulator::FrameAccumulator, devices::AnyInputLine, traits::InputLine};

/// Watches one data line and feeds its pulses into the accumulator.
#[derive(Debug)]
pub struct LineMonitor {
    line: AnyInputLine,
    role: LineRole,
    accumulator: Arc<FrameAccumulator>,
    recheck: Duration,
}

impl LineMonitor {
    pub fn new(line: AnyInputLine, role: LineRole, accumulator: Arc<FrameAccumulator>) -> Self {
        Self {
            line,
            role,
            accumulator,
            recheck: wiegand_core::constants::EDGE_RECHECK_INTERVAL,
        }
    }

    /// Override how long a single edge wait may block before cancellation
    /// is re-checked.
    pub fn with_recheck_interval(mut self, recheck: Duration) -> Self {
        self.recheck = recheck;
        self
    }

    /// Run until `token` is cancelled or the line fails.
    ///
    /// # Errors
    ///
    /// Returns the line error that stopped the monitor.
    pub async fn run(mut self, token: CancellationToken) -> Result<()> {
        debug!(line = self.line.name(), role = %self.role, "Line monitor started");

        loop {
            let edge = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                edge = self.line.wait_for_edge(self.recheck) => edge,
            };

            match edge {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!(line = self.line.name(), role = %self.role, error = %e, "Line monitor failed");
                    return Err(e);
                }
            }

            let level = match self.line.read().await {
                Ok(level) => level,
                Err(e) => {
                    error!(line = self.line.name(), role = %self.role, error = %e, "Failed to read line level");
                    return Err(e);
                }
            };

            // Active pulses pull the line low; anything else is a glitch
            if !level.is_low() {
                trace!(line = self.line.name(), "Edge without low level ignored");
                continue;
            }

            if token.is_cancelled() {
                break;
            }

            self.accumulator.push(self.role, Instant::now());
            trace!(role = %self.role, bit = self.role.bit(), "Bit received");
        }

        debug!(line = self.line.name(), role = %self.role, "Line monitor stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HardwareError;
    use crate::accumulator::{Settle, Snapshot};
    use crate::mock::MockLine;
    use crate::types::{Bias, Edge, Level};

    fn mock_line(name: &str) -> (AnyInputLine, crate::mock::MockLineHandle) {
        let (mut line, handle) = MockLine::new(name);
        line.configure(Bias::PullUp, Edge::Falling);
        (AnyInputLine::Mock(line), handle)
    }

    #[tokio::test]
    async fn test_monitor_pushes_role_bit() {
        let (line, handle) = mock_line("GPIO17");
        let accumulator = Arc::new(FrameAccumulator::new(26));
        let token = CancellationToken::new();

        let monitor = LineMonitor::new(line, LineRole::D1, accumulator.clone());
        let task = tokio::spawn(monitor.run(token.clone()));

        handle.pulse().unwrap();
        handle.pulse().unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while accumulator.len() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        token.cancel();
        task.await.unwrap().unwrap();
        assert_eq!(
            accumulator.take_if_settled(Instant::now(), Duration::ZERO),
            Settle::Ready(Snapshot::Frame(vec![1, 1]))
        );
    }

    #[tokio::test]
    async fn test_monitor_stops_on_cancel() {
        let (line, _handle) = mock_line("GPIO4");
        let accumulator = Arc::new(FrameAccumulator::new(26));
        let token = CancellationToken::new();

        let monitor = LineMonitor::new(line, LineRole::D0, accumulator.clone());
        let task = tokio::spawn(monitor.run(token.clone()));

        token.cancel();
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .expect("monitor should observe cancellation promptly")
            .unwrap()
            .unwrap();
        assert!(accumulator.is_empty());
    }

    #[tokio::test]
    async fn test_monitor_ignores_edge_without_low_level() {
        let (mut line, handle) = MockLine::new("GPIO4");
        line.configure(Bias::PullUp, Edge::Both);
        let accumulator = Arc::new(FrameAccumulator::new(26));
        let token = CancellationToken::new();

        let monitor = LineMonitor::new(AnyInputLine::Mock(line), LineRole::D0, accumulator.clone())
            .with_recheck_interval(Duration::from_millis(10));
        let task = tokio::spawn(monitor.run(token.clone()));

        handle.set_level(Level::Low).unwrap();
        handle.set_level(Level::High).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        token.cancel();
        task.await.unwrap().unwrap();
        assert_eq!(accumulator.len(), 1);
    }

    #[tokio::test]
    async fn test_monitor_reports_disconnect() {
        let (line, handle) = mock_line("GPIO4");
        drop(handle);

        let monitor = LineMonitor::new(line, LineRole::D0, Arc::new(FrameAccumulator::new(26)));
        let result = monitor.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }
}
