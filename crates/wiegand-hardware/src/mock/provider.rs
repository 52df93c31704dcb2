//! Mock line provider.
//!
//! Holds a registry of named [`MockLine`]s. Tests register lines up front,
//! keep the returned handles, and hand the provider to the reader.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::{
    HardwareError, Result,
    devices::AnyInputLine,
    mock::line::{MockLine, MockLineHandle},
    traits::{InputLine, LineProvider},
    types::{Bias, Edge, LineInfo},
};

#[derive(Debug)]
struct MockSlot {
    /// `None` once the line has been claimed
    line: Option<MockLine>,
    function: Option<String>,
    configurable: bool,
}

/// In-process provider of mock input lines.
///
/// # Examples
///
/// ```
/// use wiegand_hardware::mock::MockProvider;
/// use wiegand_hardware::traits::LineProvider;
/// use wiegand_hardware::types::{Bias, Edge};
///
/// #[tokio::main]
/// async fn main() -> wiegand_hardware::Result<()> {
///     let provider = MockProvider::new();
///     let _handle = provider.add_line("GPIO4");
///
///     let line = provider.claim("GPIO4", Bias::PullUp, Edge::Falling).await?;
///     assert!(provider.is_claimed("GPIO4"));
///     # drop(line);
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockProvider {
    lines: Mutex<BTreeMap<String, MockSlot>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a line and return the handle that drives it.
    ///
    /// Registering a name twice replaces the earlier line.
    pub fn add_line(&self, name: impl Into<String>) -> MockLineHandle {
        self.insert(name.into(), None, true)
    }

    /// Register a line that reports a pin function when enumerated.
    pub fn add_line_with_function(
        &self,
        name: impl Into<String>,
        function: impl Into<String>,
    ) -> MockLineHandle {
        self.insert(name.into(), Some(function.into()), true)
    }

    /// Register a line that exists but rejects configuration.
    pub fn add_unconfigurable_line(&self, name: impl Into<String>) -> MockLineHandle {
        self.insert(name.into(), None, false)
    }

    /// Check whether `name` has been claimed.
    pub fn is_claimed(&self, name: &str) -> bool {
        self.slots()
            .get(name)
            .is_some_and(|slot| slot.line.is_none())
    }

    fn insert(&self, name: String, function: Option<String>, configurable: bool) -> MockLineHandle {
        let (line, handle) = MockLine::new(name.clone());
        self.slots().insert(
            name,
            MockSlot {
                line: Some(line),
                function,
                configurable,
            },
        );
        handle
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MockSlot>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LineProvider for MockProvider {
    async fn claim(&self, name: &str, bias: Bias, edge: Edge) -> Result<AnyInputLine> {
        let mut slots = self.slots();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| HardwareError::line_not_found(name))?;

        if !slot.configurable {
            return Err(HardwareError::configuration(
                name,
                "edge detection unavailable",
            ));
        }

        let mut line = slot.line.take().ok_or_else(|| HardwareError::line_busy(name))?;
        line.configure(bias, edge);
        debug!(line = name, ?bias, ?edge, "Claimed mock line");

        Ok(AnyInputLine::Mock(line))
    }

    async fn lines(&self) -> Result<Vec<LineInfo>> {
        Ok(self
            .slots()
            .iter()
            .map(|(name, slot)| match &slot.function {
                Some(function) => LineInfo::new(name).with_function(function),
                None => LineInfo::new(name),
            })
            .collect())
    }

    fn release(&self, line: AnyInputLine) {
        #[allow(irrefutable_let_patterns)]
        let AnyInputLine::Mock(line) = line else {
            return;
        };

        let mut slots = self.slots();
        match slots.get_mut(line.name()) {
            Some(slot) if slot.line.is_none() => {
                debug!(line = line.name(), "Released mock line");
                slot.line = Some(line);
            }
            _ => debug!(line = line.name(), "Released line no longer registered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_claim_unknown_line() {
        let provider = MockProvider::new();
        let result = provider.claim("GPIO99", Bias::PullUp, Edge::Falling).await;
        assert!(matches!(result, Err(HardwareError::LineNotFound { .. })));
    }

    #[tokio::test]
    async fn test_claim_twice_is_busy() {
        let provider = MockProvider::new();
        let _handle = provider.add_line("GPIO4");

        let _line = provider
            .claim("GPIO4", Bias::PullUp, Edge::Falling)
            .await
            .unwrap();
        let second = provider.claim("GPIO4", Bias::PullUp, Edge::Falling).await;

        assert!(matches!(second, Err(HardwareError::LineBusy { .. })));
        assert!(provider.is_claimed("GPIO4"));
    }

    #[tokio::test]
    async fn test_release_makes_line_claimable() {
        let provider = MockProvider::new();
        let handle = provider.add_line("GPIO4");

        let line = provider
            .claim("GPIO4", Bias::PullUp, Edge::Falling)
            .await
            .unwrap();
        provider.release(line);
        assert!(!provider.is_claimed("GPIO4"));

        let mut line = provider
            .claim("GPIO4", Bias::PullUp, Edge::Falling)
            .await
            .unwrap();
        handle.pulse().unwrap();
        assert!(line.wait_for_edge(Duration::from_millis(50)).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_after_reregister_keeps_new_line() {
        let provider = MockProvider::new();
        let _old = provider.add_line("GPIO4");
        let line = provider
            .claim("GPIO4", Bias::PullUp, Edge::Falling)
            .await
            .unwrap();

        let _new = provider.add_line("GPIO4");
        provider.release(line);

        assert!(!provider.is_claimed("GPIO4"));
        let _line = provider
            .claim("GPIO4", Bias::PullUp, Edge::Falling)
            .await
            .unwrap();
        assert!(provider.is_claimed("GPIO4"));
    }

    #[tokio::test]
    async fn test_unconfigurable_line() {
        let provider = MockProvider::new();
        let _handle = provider.add_unconfigurable_line("GPIO4");

        let result = provider.claim("GPIO4", Bias::PullUp, Edge::Falling).await;
        let error = result.unwrap_err();
        assert!(matches!(error, HardwareError::ConfigurationError { .. }));
        assert!(!provider.is_claimed("GPIO4"));
    }

    #[tokio::test]
    async fn test_lines_sorted_with_functions() {
        let provider = MockProvider::new();
        let _a = provider.add_line("GPIO5");
        let _b = provider.add_line_with_function("GPIO2", "I2C1_SDA");

        let lines = provider.lines().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "GPIO2");
        assert_eq!(lines[0].function_name(), "I2C1_SDA");
        assert_eq!(lines[1].function_name(), "unknown");
    }
}
